//! # Quest Progression Subsystem
//!
//! **Crate ID:** 01
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! Owns the quest/task state machine, the currency/experience ledger and the
//! shared-quest protocol. Every operation runs as one store transaction:
//! either every touched row (user, user quest, user tasks, shared quest,
//! ledger entries) changes or none does.
//!
//! ## State Machines
//!
//! ```text
//! per (user, quest):  [ABSENT] ──purchase──→ [PURCHASED] ──start──→ [STARTED] ──complete──→ [COMPLETED]
//!                                                  │                     ↑
//!                                                  └──complete_task──────┘ (implicit start)
//!
//! per (user, task):   [NOT_STARTED] ──start──→ [ACTIVE] ──complete_task──→ [COMPLETED]
//!                           └────────────complete_task───────────────────────┘
//! ```
//!
//! ## Domain Invariants
//!
//! | Invariant | Enforcement Location |
//! |-----------|---------------------|
//! | One user quest per (user, quest) | `service/engine.rs` - `purchase()` state check under row lock |
//! | Balance never negative | `domain/wallet.rs` - `debit()` |
//! | `level == LevelCalculator(xp)` | `domain/wallet.rs` - `credit()` recomputes on every write |
//! | Only the ledger writes user counters | `service/ledger.rs` - sole caller of `put_user` |
//! | Task completed at most once | `domain/state.rs` - `check_task_eligibility()` |
//! | Quest completes only with all tasks done | `service/engine.rs` - `complete_quest()` |
//! | Shared completion rewards both or neither | `service/shared.rs` - `complete_shared()` |
//!
//! ## Outbound Dependencies
//!
//! | Port | Purpose |
//! |------|---------|
//! | `QuestStore` | Transactional rows with row locking |
//! | `FriendshipProvider` | Accepted-friendship check for shared quests |
//! | `TimeSource` | Start, expiry and completion timestamps |
//! | `ProgressionEventSink` | Post-commit notifications (recommendation sync, metrics) |
//!
//! ## Module Structure (Hexagonal Architecture)
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      OUTER LAYER                                │
//! │  adapters/ - in-memory store, friendships, event sinks          │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ implements ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      MIDDLE LAYER                               │
//! │  ports/inbound.rs  - ProgressionApi trait                       │
//! │  ports/outbound.rs - QuestStore, FriendshipProvider, TimeSource │
//! └─────────────────────────────────────────────────────────────────┘
//!                          ↑ uses ↑
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      INNER LAYER                                │
//! │  domain/level.rs    - LevelCalculator                           │
//! │  domain/wallet.rs   - checked credit/debit on a user row        │
//! │  domain/state.rs    - QuestProgress, QuestInstance, eligibility │
//! │  domain/entities.rs - UserQuest, UserTask, SharedQuest, ledger  │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(test)]
mod test_utils;

pub use adapters::{
    BusEventSink, FriendshipStatus, InMemoryFriendships, InMemoryQuestStore, NoOpEventSink, Rows,
    Sequences,
};
pub use domain::{
    IneligibleReason, LedgerEntry, LedgerKind, LedgerReference, LevelCalculator, LevelChange,
    NewLedgerEntry, ProgressionError, QuestInstance, QuestProgress, QuestStatus, SharedQuest,
    SharedQuestStatus, TaskSchedule, TaskStatus, UserQuest, UserTask,
};
pub use ports::inbound::{
    CatalogImport, ProgressionApi, ProgressionView, PurchaseReceipt, QuestCompletion, QuestReward,
    TaskCompletion,
};
pub use ports::outbound::{
    FriendshipProvider, ProgressionEventSink, QuestStore, StoreError, StoreTransaction,
    SystemTimeSource, TimeSource,
};
pub use service::{ProgressionConfig, ProgressionDependencies, ProgressionService};

#[cfg(any(test, feature = "test-utils"))]
pub use adapters::RecordingEventSink;
#[cfg(any(test, feature = "test-utils"))]
pub use ports::outbound::MockTimeSource;
