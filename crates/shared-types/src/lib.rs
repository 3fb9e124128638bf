//! # Shared Types Crate
//!
//! Identifiers, catalog entities and user records used across the questline
//! workspace.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: Types that cross crate boundaries (events,
//!   storage adapters, the runtime) are defined here.
//! - **Catalog is immutable**: `Quest` and `Task` are only ever created through
//!   [`NewQuest`] registration; nothing in the workspace edits them afterwards.
//! - **Typed identifiers**: every key is a newtype so a `TaskId` can never be
//!   passed where a `QuestId` is expected.

pub mod entities;
pub mod errors;

pub use entities::*;
pub use errors::*;
