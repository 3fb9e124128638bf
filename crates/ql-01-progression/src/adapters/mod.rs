//! Adapters for the progression engine's outbound ports.

pub mod friendship;
pub mod memory_store;
pub mod publisher;
pub mod rows;

pub use friendship::{FriendshipStatus, InMemoryFriendships};
pub use memory_store::InMemoryQuestStore;
pub use publisher::{BusEventSink, NoOpEventSink};
#[cfg(any(test, feature = "test-utils"))]
pub use publisher::RecordingEventSink;
pub use rows::{Rows, Sequences};
