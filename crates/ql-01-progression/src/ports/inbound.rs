//! # Inbound Port - ProgressionApi
//!
//! Primary driving port used by request handlers and the runtime.

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    NewQuest, NewUser, Quest, QuestId, SharedQuestId, TaskId, Timestamp, User, UserId,
};

use crate::domain::{
    LedgerEntry, ProgressionError, QuestProgress, SharedQuest, TaskSchedule, UserQuest, UserTask,
};

/// Result of a committed purchase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurchaseReceipt {
    pub user_quest: UserQuest,
    /// Balance after the debit.
    pub balance: u64,
}

/// Rows written by a catalog import, in registration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogImport {
    pub quests: Vec<Quest>,
    pub users: Vec<User>,
}

/// Result of a committed task completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskCompletion {
    pub task_id: TaskId,
    pub xp_gained: u64,
    pub coin_gained: u64,
    /// Level after the credit. Authoritative.
    pub level: u32,
    /// The quest was still `purchased` and got started by this completion.
    pub started_quest: bool,
    /// Expiry stamped on the quest, if it is started.
    pub expires_at: Option<Timestamp>,
}

/// Reward granted to one user when a quest is finalized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestReward {
    pub user_id: UserId,
    pub xp_gained: u64,
    pub coin_gained: u64,
    pub level: u32,
}

/// Result of a committed quest completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestCompletion {
    Solo(QuestReward),
    /// Both partners finalized in the same transaction. `partner` is `None`
    /// if the partner's row had already been finalized.
    Shared {
        shared_quest_id: SharedQuestId,
        actor: QuestReward,
        partner: Option<QuestReward>,
    },
}

impl QuestCompletion {
    /// The reward for the user who called `complete_quest`.
    pub fn actor(&self) -> &QuestReward {
        match self {
            Self::Solo(reward) => reward,
            Self::Shared { actor, .. } => actor,
        }
    }
}

/// A user's view of one quest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressionView {
    pub progress: QuestProgress,
    /// Sorted by task order. Empty when the quest is absent.
    pub tasks: Vec<UserTask>,
    pub shared_quest: Option<SharedQuest>,
}

/// Primary API of the progression engine.
///
/// Every mutating method is one atomic unit of work: on any error, nothing
/// it touched has changed.
///
/// # Example
///
/// ```rust,ignore
/// use ql_01_progression::ProgressionApi;
///
/// fn play(engine: &impl ProgressionApi, user: UserId, quest: QuestId, task: TaskId) {
///     engine.purchase(user, quest)?;
///     engine.complete_task(user, quest, task)?; // starts the quest implicitly
///     engine.complete_quest(user, quest)?;
/// }
/// ```
pub trait ProgressionApi: Send + Sync {
    /// Buy a quest.
    ///
    /// # Errors
    /// - `AlreadyOwned`: a user quest row already exists
    /// - `InsufficientFunds`: balance below the quest price
    /// - `QuestNotFound` / `UserNotFound`
    fn purchase(&self, user_id: UserId, quest_id: QuestId)
        -> Result<PurchaseReceipt, ProgressionError>;

    /// Start a purchased quest and stamp its expiry.
    ///
    /// # Errors
    /// - `NotPurchased`: no row, or the quest is past `purchased`
    fn start(&self, user_id: UserId, quest_id: QuestId) -> Result<UserQuest, ProgressionError>;

    /// Complete one task and grant its base reward immediately.
    ///
    /// A quest still in `purchased` is started first.
    ///
    /// # Errors
    /// - `NotEligible`: quest not owned or completed, task not in the quest,
    ///   task already completed, or an earlier task of a sequential quest open
    fn complete_task(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        task_id: TaskId,
    ) -> Result<TaskCompletion, ProgressionError>;

    /// Finalize a quest and grant its completion bonus.
    ///
    /// # Errors
    /// - `NotStarted`: quest not in `started`
    /// - `TasksIncomplete`: a task of the caller is open
    /// - `PartnerIncomplete`: shared quest whose partner still has open tasks
    fn complete_quest(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<QuestCompletion, ProgressionError>;

    /// Enroll two friends in the same quest: purchase and start for both.
    ///
    /// # Errors
    /// - `NotFriends`: no accepted friendship, or `user_a == user_b`
    /// - any `purchase` error for either user; nothing is created then
    fn create_shared_quest(
        &self,
        user_a: UserId,
        user_b: UserId,
        quest_id: QuestId,
    ) -> Result<SharedQuest, ProgressionError>;

    /// Set scheduling fields on a user's tasks. `None` keeps stored values.
    ///
    /// # Errors
    /// - `NotPurchased`: the user does not own the quest
    /// - `TaskNotFound`: a task is not part of the quest
    /// - `InvalidSchedule`: start after end
    fn schedule_tasks(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        schedules: Vec<TaskSchedule>,
    ) -> Result<Vec<UserTask>, ProgressionError>;

    /// Ids of every quest the user owns, ascending.
    fn quest_ids_for_user(&self, user_id: UserId) -> Result<Vec<QuestId>, ProgressionError>;

    /// State and task rows of one (user, quest) pair.
    fn progress(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<ProgressionView, ProgressionError>;

    fn user(&self, user_id: UserId) -> Result<User, ProgressionError>;

    /// A catalog quest with its tasks.
    fn quest(&self, quest_id: QuestId) -> Result<Quest, ProgressionError>;

    /// Ledger entries of a user in insertion order.
    fn ledger(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, ProgressionError>;

    /// Add a quest to the catalog.
    fn register_quest(&self, quest: NewQuest) -> Result<Quest, ProgressionError>;

    /// Create a user. The level is derived from the initial experience.
    fn register_user(&self, user: NewUser) -> Result<User, ProgressionError>;

    /// Register a whole catalog in one transaction, but only into an empty
    /// store. Returns `None` without writing if any quest or user exists.
    fn import_catalog(
        &self,
        quests: Vec<NewQuest>,
        users: Vec<NewUser>,
    ) -> Result<Option<CatalogImport>, ProgressionError>;

    /// Check the store is reachable.
    fn health(&self) -> Result<(), ProgressionError>;
}
