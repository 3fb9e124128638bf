//! Per-user progression rows.
//!
//! Catalog entities (`Quest`, `Task`) and `User` live in `shared-types`; the
//! rows here exist only once a user interacts with a quest.

use serde::{Deserialize, Serialize};
use shared_types::entities::{QuestId, SharedQuestId, Task, TaskId, Timestamp, UserId};

/// Stored status of a user quest. There is no stored "not purchased" status;
/// see [`crate::domain::QuestProgress::Absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Purchased,
    Started,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    NotStarted,
    Active,
    Completed,
}

/// One row per (user, quest). Created on purchase, never deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserQuest {
    pub user_id: UserId,
    pub quest_id: QuestId,
    pub status: QuestStatus,
    pub purchased_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
    /// Completion bonus actually granted.
    pub xp_gained: u64,
    pub coin_gained: u64,
}

impl UserQuest {
    /// A freshly purchased quest: no start or expiry yet.
    pub fn purchased(user_id: UserId, quest_id: QuestId, now: Timestamp) -> Self {
        Self {
            user_id,
            quest_id,
            status: QuestStatus::Purchased,
            purchased_at: now,
            started_at: None,
            expires_at: None,
            completed_at: None,
            xp_gained: 0,
            coin_gained: 0,
        }
    }
}

/// One row per (user, task).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserTask {
    pub user_id: UserId,
    pub quest_id: QuestId,
    pub task_id: TaskId,
    /// Copied from the template so rows sort without a catalog lookup.
    pub order: u32,
    pub status: TaskStatus,
    pub scheduled_start: Option<Timestamp>,
    pub scheduled_end: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub duration_minutes: Option<u32>,
    pub completed_at: Option<Timestamp>,
    pub xp_gained: u64,
    pub coin_gained: u64,
    /// Set once the parent quest is fully completed. Never cleared.
    pub is_confirmed: bool,
}

impl UserTask {
    pub fn not_started(user_id: UserId, task: &Task) -> Self {
        Self {
            user_id,
            quest_id: task.quest_id,
            task_id: task.id,
            order: task.order,
            status: TaskStatus::NotStarted,
            scheduled_start: None,
            scheduled_end: None,
            deadline: None,
            duration_minutes: None,
            completed_at: None,
            xp_gained: 0,
            coin_gained: 0,
            is_confirmed: false,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == TaskStatus::Completed
    }
}

/// Scheduling update for one task. `None` keeps the stored value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    pub task_id: TaskId,
    pub scheduled_start: Option<Timestamp>,
    pub scheduled_end: Option<Timestamp>,
    pub deadline: Option<Timestamp>,
    pub duration_minutes: Option<u32>,
}

impl TaskSchedule {
    /// An update for `task_id` that changes nothing yet.
    pub fn for_task(task_id: TaskId) -> Self {
        Self {
            task_id,
            scheduled_start: None,
            scheduled_end: None,
            deadline: None,
            duration_minutes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SharedQuestStatus {
    Active,
    Completed,
}

/// Two friends enrolled in the same quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedQuest {
    pub id: SharedQuestId,
    pub quest_id: QuestId,
    pub user_a: UserId,
    pub user_b: UserId,
    pub status: SharedQuestStatus,
    pub created_at: Timestamp,
    pub completed_at: Option<Timestamp>,
}

impl SharedQuest {
    /// The other participant, or `None` if `user_id` is not part of this quest.
    pub fn partner_of(&self, user_id: UserId) -> Option<UserId> {
        if user_id == self.user_a {
            Some(self.user_b)
        } else if user_id == self.user_b {
            Some(self.user_a)
        } else {
            None
        }
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.partner_of(user_id).is_some()
    }
}

/// Insert form of a shared quest. The store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSharedQuest {
    pub quest_id: QuestId,
    pub user_a: UserId,
    pub user_b: UserId,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Earned,
    Spent,
}

/// What a ledger entry was recorded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum LedgerReference {
    Quest(QuestId),
    Task(TaskId),
    SharedQuest(SharedQuestId),
}

/// An immutable record of a currency/experience change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub user_id: UserId,
    /// Signed currency delta. Negative for spends.
    pub amount: i64,
    /// Experience granted alongside the currency.
    pub xp: u64,
    pub kind: LedgerKind,
    pub reference: LedgerReference,
    pub description: String,
    pub created_at: Timestamp,
}

/// Insert form of a ledger entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLedgerEntry {
    pub user_id: UserId,
    pub amount: i64,
    pub xp: u64,
    pub kind: LedgerKind,
    pub reference: LedgerReference,
    pub description: String,
    pub created_at: Timestamp,
}

impl NewLedgerEntry {
    pub fn with_id(self, id: u64) -> LedgerEntry {
        LedgerEntry {
            id,
            user_id: self.user_id,
            amount: self.amount,
            xp: self.xp,
            kind: self.kind,
            reference: self.reference,
            description: self.description,
            created_at: self.created_at,
        }
    }
}
