//! # Shared Bus - Progression Event Bus
//!
//! Carries facts about committed progression changes from the engine to the
//! crates that react to them (recommendation sync, metrics, the runtime).
//!
//! ## Rules
//!
//! - Events are published only **after** the originating transaction commits.
//!   A subscriber never observes a change that could still roll back.
//! - Delivery is best-effort. A lagging or absent subscriber never blocks or
//!   fails the publisher.
//!
//! ```text
//! ┌──────────────────┐                    ┌──────────────────────┐
//! │ Progression (01) │                    │ Recommendation (02)  │
//! │                  │    publish()       │                      │
//! │                  │ ──────┐            │                      │
//! └──────────────────┘       │            └──────────────────────┘
//!                            ▼                    ↑
//!                      ┌──────────────┐          │
//!                      │  Event Bus   │          │
//!                      │              │ ─────────┘
//!                      └──────────────┘  subscribe()
//! ```

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, ProgressionEvent};
pub use publisher::InMemoryEventBus;
pub use subscriber::{Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the slowest one lags.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
