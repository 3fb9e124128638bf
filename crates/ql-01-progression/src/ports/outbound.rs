//! # Outbound Ports (Driven Ports)
//!
//! Dependencies the progression engine needs from the outside world.

use std::sync::Arc;

use shared_bus::ProgressionEvent;
use shared_types::entities::{NewQuest, NewUser, Quest, QuestId, Timestamp, User, UserId};
use thiserror::Error;

use crate::domain::entities::{
    LedgerEntry, NewLedgerEntry, NewSharedQuest, SharedQuest, UserQuest, UserTask,
};

/// Errors raised by a store backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The backend rejected or failed an operation.
    #[error("Store backend error: {0}")]
    Backend(String),

    /// A stored value could not be decoded.
    #[error("Corrupted row {key}: {reason}")]
    Corrupted { key: String, reason: String },

    /// The store refused a write during a fault-injection run.
    #[error("Injected write failure after {writes} write(s)")]
    InjectedFailure { writes: usize },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Transactional persistence backend.
///
/// A transaction holds exclusive locks on every row it reads through a
/// `lock_*` method until it is committed or dropped. Dropping a transaction
/// without calling [`StoreTransaction::commit`] discards every staged write.
pub trait QuestStore: Send + Sync {
    /// Open a unit of work.
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>>;

    /// Cheap liveness check.
    fn ping(&self) -> StoreResult<()>;
}

/// One all-or-nothing unit of work.
///
/// Writes are staged and become visible to other transactions only on
/// commit. Reads inside the transaction see its own staged writes.
pub trait StoreTransaction {
    // ---- catalog -------------------------------------------------------

    fn quest(&self, quest_id: QuestId) -> StoreResult<Option<Quest>>;

    /// Assign ids and stage a new quest with its tasks.
    fn insert_quest(&mut self, quest: NewQuest) -> StoreResult<Quest>;

    // ---- users ---------------------------------------------------------

    /// Read a user row and lock it for the rest of the transaction.
    fn lock_user(&mut self, user_id: UserId) -> StoreResult<Option<User>>;

    /// Stage a user row. Only the balance ledger calls this.
    fn put_user(&mut self, user: User) -> StoreResult<()>;

    /// Assign an id and stage a new user with the given derived level.
    fn insert_user(&mut self, user: NewUser, level: u32) -> StoreResult<User>;

    // ---- user quests ---------------------------------------------------

    /// Read the (user, quest) row and lock the pair, whether or not it exists.
    fn lock_user_quest(
        &mut self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> StoreResult<Option<UserQuest>>;

    fn put_user_quest(&mut self, row: UserQuest) -> StoreResult<()>;

    /// Ids of every quest the user owns, ascending.
    fn user_quest_ids(&self, user_id: UserId) -> StoreResult<Vec<QuestId>>;

    // ---- user tasks ----------------------------------------------------

    /// The user's task rows for a quest, sorted by task order.
    fn user_tasks(&self, user_id: UserId, quest_id: QuestId) -> StoreResult<Vec<UserTask>>;

    fn put_user_task(&mut self, row: UserTask) -> StoreResult<()>;

    // ---- shared quests -------------------------------------------------

    /// The active shared quest linking `user_id` to `quest_id`, locked.
    fn lock_active_shared_quest(
        &mut self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> StoreResult<Option<SharedQuest>>;

    fn insert_shared_quest(&mut self, shared: NewSharedQuest) -> StoreResult<SharedQuest>;

    fn put_shared_quest(&mut self, row: SharedQuest) -> StoreResult<()>;

    // ---- ledger --------------------------------------------------------

    fn append_ledger(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry>;

    /// The user's ledger entries in insertion order.
    fn ledger(&self, user_id: UserId) -> StoreResult<Vec<LedgerEntry>>;

    /// Apply every staged write atomically and release all locks.
    fn commit(self: Box<Self>) -> StoreResult<()>;
}

/// Accepted-friendship lookups.
pub trait FriendshipProvider: Send + Sync {
    /// True when an accepted friendship exists in either direction.
    fn are_friends(&self, user_a: UserId, user_b: UserId) -> StoreResult<bool>;
}

/// Receives events after the transaction that produced them committed.
///
/// Implementations must not block; delivery is best-effort.
pub trait ProgressionEventSink: Send + Sync {
    fn publish(&self, event: ProgressionEvent);
}

/// Abstract time source for testability.
pub trait TimeSource: Send + Sync {
    /// Returns the current timestamp in seconds.
    fn now(&self) -> Timestamp;
}

impl<S: QuestStore + ?Sized> QuestStore for Arc<S> {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        (**self).begin()
    }

    fn ping(&self) -> StoreResult<()> {
        (**self).ping()
    }
}

impl<T: TimeSource + ?Sized> TimeSource for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

impl<F: FriendshipProvider + ?Sized> FriendshipProvider for Arc<F> {
    fn are_friends(&self, user_a: UserId, user_b: UserId) -> StoreResult<bool> {
        (**self).are_friends(user_a, user_b)
    }
}

impl<P: ProgressionEventSink + ?Sized> ProgressionEventSink for Arc<P> {
    fn publish(&self, event: ProgressionEvent) {
        (**self).publish(event)
    }
}

/// Default system time source.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> Timestamp {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Settable clock for tests.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockTimeSource {
    time: std::sync::atomic::AtomicU64,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockTimeSource {
    pub fn new(initial: Timestamp) -> Self {
        Self {
            time: std::sync::atomic::AtomicU64::new(initial),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.time.fetch_add(secs, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn set(&self, time: Timestamp) {
        self.time.store(time, std::sync::atomic::Ordering::SeqCst);
    }
}

#[cfg(any(test, feature = "test-utils"))]
impl TimeSource for MockTimeSource {
    fn now(&self) -> Timestamp {
        self.time.load(std::sync::atomic::Ordering::SeqCst)
    }
}
