//! Progression error taxonomy.
//!
//! Every failure is returned to the caller as a typed value. Rule violations
//! are distinguished from `PersistenceFailure`, which wraps lower-layer faults.

use std::fmt;

use shared_types::entities::{QuestId, TaskId, UserId};
use shared_types::errors::CatalogError;
use thiserror::Error;

use crate::ports::outbound::StoreError;

/// Why a task cannot be completed right now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IneligibleReason {
    /// The user does not own the quest.
    QuestNotOwned,
    /// The quest is already completed.
    QuestCompleted,
    /// The task is not part of the quest.
    TaskNotInQuest,
    /// The task was already completed.
    AlreadyCompleted,
    /// A sequential quest still has an earlier task open.
    OutOfOrder { blocking_task: TaskId },
}

impl fmt::Display for IneligibleReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QuestNotOwned => write!(f, "quest not owned"),
            Self::QuestCompleted => write!(f, "quest already completed"),
            Self::TaskNotInQuest => write!(f, "task does not belong to quest"),
            Self::AlreadyCompleted => write!(f, "task already completed"),
            Self::OutOfOrder { blocking_task } => {
                write!(f, "task {} must be completed first", blocking_task)
            }
        }
    }
}

/// Errors returned by progression operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressionError {
    #[error("User {user_id} already owns quest {quest_id}")]
    AlreadyOwned { user_id: UserId, quest_id: QuestId },

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Quest {quest_id} is not in the purchased state for user {user_id}")]
    NotPurchased { user_id: UserId, quest_id: QuestId },

    #[error("Task {task_id} cannot be completed: {reason}")]
    NotEligible {
        task_id: TaskId,
        reason: IneligibleReason,
    },

    #[error("Quest {quest_id} is not started for user {user_id}")]
    NotStarted { user_id: UserId, quest_id: QuestId },

    #[error("Quest {quest_id} still has {remaining} incomplete task(s)")]
    TasksIncomplete { quest_id: QuestId, remaining: usize },

    #[error("Partner {partner_id} has not finished quest {quest_id}")]
    PartnerIncomplete {
        quest_id: QuestId,
        partner_id: UserId,
    },

    #[error("Users {user_a} and {user_b} are not friends")]
    NotFriends { user_a: UserId, user_b: UserId },

    #[error("Quest {0} not found")]
    QuestNotFound(QuestId),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("Task {task_id} does not belong to quest {quest_id}")]
    TaskNotFound { quest_id: QuestId, task_id: TaskId },

    #[error("Invalid schedule for task {task_id}: {reason}")]
    InvalidSchedule { task_id: TaskId, reason: String },

    #[error("Invalid quest definition: {0}")]
    InvalidQuest(#[from] CatalogError),

    #[error("Counter overflow for user {0}")]
    Overflow(UserId),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),
}

impl ProgressionError {
    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::AlreadyOwned { .. } => "already_owned",
            Self::InsufficientFunds { .. } => "insufficient_funds",
            Self::NotPurchased { .. } => "not_purchased",
            Self::NotEligible { .. } => "not_eligible",
            Self::NotStarted { .. } => "not_started",
            Self::TasksIncomplete { .. } => "tasks_incomplete",
            Self::PartnerIncomplete { .. } => "partner_incomplete",
            Self::NotFriends { .. } => "not_friends",
            Self::QuestNotFound(_) => "quest_not_found",
            Self::UserNotFound(_) => "user_not_found",
            Self::TaskNotFound { .. } => "task_not_found",
            Self::InvalidSchedule { .. } => "invalid_schedule",
            Self::InvalidQuest(_) => "invalid_quest",
            Self::Overflow(_) => "overflow",
            Self::PersistenceFailure(_) => "persistence_failure",
        }
    }

    /// Faults below the rule layer, as opposed to requests the rules reject.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, Self::PersistenceFailure(_) | Self::Overflow(_))
    }
}

impl From<StoreError> for ProgressionError {
    fn from(err: StoreError) -> Self {
        Self::PersistenceFailure(err.to_string())
    }
}
