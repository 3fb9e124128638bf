//! Explicit quest state and task eligibility rules.

use shared_types::entities::{Quest, TaskId, UserId};

use super::entities::{QuestStatus, SharedQuest, UserQuest, UserTask};
use super::errors::IneligibleReason;

/// State of a (user, quest) pair, including the pair having no row at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestProgress {
    Absent,
    Purchased(UserQuest),
    Started(UserQuest),
    Completed(UserQuest),
}

impl QuestProgress {
    /// Classify a stored row (or its absence).
    pub fn from_row(row: Option<UserQuest>) -> Self {
        match row {
            None => Self::Absent,
            Some(row) => match row.status {
                QuestStatus::Purchased => Self::Purchased(row),
                QuestStatus::Started => Self::Started(row),
                QuestStatus::Completed => Self::Completed(row),
            },
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn status(&self) -> Option<QuestStatus> {
        self.row().map(|r| r.status)
    }

    pub fn row(&self) -> Option<&UserQuest> {
        match self {
            Self::Absent => None,
            Self::Purchased(row) | Self::Started(row) | Self::Completed(row) => Some(row),
        }
    }
}

/// How a quest instance completes: alone, or gated on a partner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestInstance {
    Solo,
    Shared {
        shared_quest: SharedQuest,
        partner: UserId,
    },
}

impl QuestInstance {
    /// Resolve from the user's active shared quest for this quest, if any.
    pub fn resolve(user_id: UserId, active_shared: Option<SharedQuest>) -> Self {
        match active_shared {
            Some(shared_quest) => match shared_quest.partner_of(user_id) {
                Some(partner) => Self::Shared {
                    shared_quest,
                    partner,
                },
                None => Self::Solo,
            },
            None => Self::Solo,
        }
    }
}

/// Decide whether `task_id` may be completed.
///
/// `rows` are the user's task rows for `quest`. When `enforce_order` is set
/// and the quest is sequential, every lower-ordered task must be completed.
pub fn check_task_eligibility(
    progress: &QuestProgress,
    quest: &Quest,
    task_id: TaskId,
    rows: &[UserTask],
    enforce_order: bool,
) -> Result<(), IneligibleReason> {
    match progress {
        QuestProgress::Absent => return Err(IneligibleReason::QuestNotOwned),
        QuestProgress::Completed(_) => return Err(IneligibleReason::QuestCompleted),
        QuestProgress::Purchased(_) | QuestProgress::Started(_) => {}
    }

    let task = quest
        .task(task_id)
        .ok_or(IneligibleReason::TaskNotInQuest)?;
    let row = rows
        .iter()
        .find(|r| r.task_id == task_id)
        .ok_or(IneligibleReason::TaskNotInQuest)?;

    if row.is_completed() {
        return Err(IneligibleReason::AlreadyCompleted);
    }

    if enforce_order && quest.is_sequential {
        if let Some(blocking) = rows
            .iter()
            .filter(|r| r.order < task.order && !r.is_completed())
            .min_by_key(|r| r.order)
        {
            return Err(IneligibleReason::OutOfOrder {
                blocking_task: blocking.task_id,
            });
        }
    }

    Ok(())
}

/// Number of rows not yet completed.
pub fn incomplete_count(rows: &[UserTask]) -> usize {
    rows.iter().filter(|r| !r.is_completed()).count()
}
