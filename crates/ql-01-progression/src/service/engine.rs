//! # Unit of Work
//!
//! One store transaction plus the events it will emit. All quest and task
//! transitions are methods here so that composite operations (a shared quest
//! enrolling two users) reuse them inside the same transaction.

use shared_bus::ProgressionEvent;
use shared_types::entities::{
    Quest, QuestId, SharedQuestId, TaskId, Timestamp, UserId, SECONDS_PER_HOUR,
};

use super::ledger::BalanceLedger;
use super::ProgressionConfig;
use crate::domain::entities::{
    LedgerReference, QuestStatus, TaskSchedule, TaskStatus, UserQuest, UserTask,
};
use crate::domain::state::{check_task_eligibility, incomplete_count, QuestInstance, QuestProgress};
use crate::domain::wallet::LevelChange;
use crate::domain::ProgressionError;
use crate::ports::inbound::{PurchaseReceipt, QuestCompletion, QuestReward, TaskCompletion};
use crate::ports::outbound::{StoreResult, StoreTransaction};

pub(crate) struct UnitOfWork<'a> {
    pub(super) tx: Box<dyn StoreTransaction + 'a>,
    pub(super) now: Timestamp,
    enforce_sequential: bool,
    outbox: Vec<ProgressionEvent>,
}

impl<'a> UnitOfWork<'a> {
    pub(super) fn new(
        tx: Box<dyn StoreTransaction + 'a>,
        now: Timestamp,
        config: &ProgressionConfig,
    ) -> Self {
        Self {
            tx,
            now,
            enforce_sequential: config.enforce_sequential,
            outbox: Vec::new(),
        }
    }

    /// Commit the transaction and hand back the events to publish.
    pub(super) fn commit(self) -> StoreResult<Vec<ProgressionEvent>> {
        self.tx.commit()?;
        Ok(self.outbox)
    }

    pub(super) fn emit(&mut self, event: ProgressionEvent) {
        self.outbox.push(event);
    }

    pub(super) fn ledger(&mut self) -> BalanceLedger<'_, 'a> {
        BalanceLedger::new(self.tx.as_mut(), self.now)
    }

    pub(super) fn quest(&self, quest_id: QuestId) -> Result<Quest, ProgressionError> {
        self.tx
            .quest(quest_id)?
            .ok_or(ProgressionError::QuestNotFound(quest_id))
    }

    pub(super) fn progress(
        &mut self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<QuestProgress, ProgressionError> {
        Ok(QuestProgress::from_row(
            self.tx.lock_user_quest(user_id, quest_id)?,
        ))
    }

    // ---- purchase ----------------------------------------------------------

    pub(super) fn purchase(
        &mut self,
        user_id: UserId,
        quest: &Quest,
        shared_quest_id: Option<SharedQuestId>,
    ) -> Result<PurchaseReceipt, ProgressionError> {
        if !self.progress(user_id, quest.id)?.is_absent() {
            return Err(ProgressionError::AlreadyOwned {
                user_id,
                quest_id: quest.id,
            });
        }

        let balance = self.ledger().debit(
            user_id,
            quest.price,
            LedgerReference::Quest(quest.id),
            format!("Purchased quest: {}", quest.title),
        )?;

        let row = UserQuest::purchased(user_id, quest.id, self.now);
        self.tx.put_user_quest(row.clone())?;
        for task in &quest.tasks {
            self.tx.put_user_task(UserTask::not_started(user_id, task))?;
        }

        let owned_quest_ids = self.tx.user_quest_ids(user_id)?;
        self.emit(ProgressionEvent::QuestPurchased {
            user_id,
            quest_id: quest.id,
            price: quest.price,
            owned_quest_ids,
            shared_quest_id,
        });

        Ok(PurchaseReceipt {
            user_quest: row,
            balance,
        })
    }

    // ---- start -------------------------------------------------------------

    /// Move a purchased quest to started and activate its tasks.
    pub(super) fn start(
        &mut self,
        user_id: UserId,
        quest: &Quest,
    ) -> Result<UserQuest, ProgressionError> {
        match self.progress(user_id, quest.id)? {
            QuestProgress::Purchased(row) => self.activate(row, quest),
            _ => Err(ProgressionError::NotPurchased {
                user_id,
                quest_id: quest.id,
            }),
        }
    }

    fn activate(&mut self, mut row: UserQuest, quest: &Quest) -> Result<UserQuest, ProgressionError> {
        let ttl = u64::from(quest.time_limit_hours).saturating_mul(SECONDS_PER_HOUR);
        let expires_at = self.now.saturating_add(ttl);

        row.expires_at = Some(expires_at);
        row.status = QuestStatus::Started;
        row.started_at = Some(self.now);
        self.tx.put_user_quest(row.clone())?;

        for mut task in self.tx.user_tasks(row.user_id, quest.id)? {
            if task.status == TaskStatus::NotStarted {
                task.status = TaskStatus::Active;
                self.tx.put_user_task(task)?;
            }
        }

        self.emit(ProgressionEvent::QuestStarted {
            user_id: row.user_id,
            quest_id: quest.id,
            started_at: self.now,
            expires_at,
        });
        Ok(row)
    }

    // ---- task completion ---------------------------------------------------

    pub(super) fn complete_task(
        &mut self,
        user_id: UserId,
        quest: &Quest,
        task_id: TaskId,
    ) -> Result<TaskCompletion, ProgressionError> {
        let progress = self.progress(user_id, quest.id)?;
        let rows = self.tx.user_tasks(user_id, quest.id)?;
        check_task_eligibility(&progress, quest, task_id, &rows, self.enforce_sequential)
            .map_err(|reason| ProgressionError::NotEligible { task_id, reason })?;

        // Eligibility guarantees both the task and its row exist
        let task = quest
            .task(task_id)
            .ok_or(ProgressionError::TaskNotFound {
                quest_id: quest.id,
                task_id,
            })?;
        let mut row = rows
            .into_iter()
            .find(|r| r.task_id == task_id)
            .ok_or(ProgressionError::TaskNotFound {
                quest_id: quest.id,
                task_id,
            })?;

        let (started_quest, expires_at) = match progress {
            QuestProgress::Purchased(quest_row) => {
                let started = self.activate(quest_row, quest)?;
                (true, started.expires_at)
            }
            other => (false, other.row().and_then(|r| r.expires_at)),
        };

        let change = self.ledger().credit(
            user_id,
            task.base_xp_reward,
            task.base_coin_reward,
            LedgerReference::Task(task_id),
            format!("Completed task: {}", task.title),
        )?;

        row.status = TaskStatus::Completed;
        row.completed_at = Some(self.now);
        row.xp_gained = task.base_xp_reward;
        row.coin_gained = task.base_coin_reward;
        self.tx.put_user_task(row)?;

        self.emit(ProgressionEvent::TaskCompleted {
            user_id,
            quest_id: quest.id,
            task_id,
            xp_gained: task.base_xp_reward,
            coin_gained: task.base_coin_reward,
            level: change.current,
        });
        self.emit_level_up(user_id, change);

        Ok(TaskCompletion {
            task_id,
            xp_gained: task.base_xp_reward,
            coin_gained: task.base_coin_reward,
            level: change.current,
            started_quest,
            expires_at,
        })
    }

    // ---- quest completion --------------------------------------------------

    pub(super) fn complete_quest(
        &mut self,
        user_id: UserId,
        quest: &Quest,
    ) -> Result<QuestCompletion, ProgressionError> {
        let row = match self.progress(user_id, quest.id)? {
            QuestProgress::Started(row) => row,
            _ => {
                return Err(ProgressionError::NotStarted {
                    user_id,
                    quest_id: quest.id,
                })
            }
        };

        let remaining = incomplete_count(&self.tx.user_tasks(user_id, quest.id)?);
        if remaining > 0 {
            return Err(ProgressionError::TasksIncomplete {
                quest_id: quest.id,
                remaining,
            });
        }

        let active_shared = self.tx.lock_active_shared_quest(user_id, quest.id)?;
        match QuestInstance::resolve(user_id, active_shared) {
            QuestInstance::Solo => {
                let reward = self.reward_and_finalize(row, quest, None)?;
                Ok(QuestCompletion::Solo(reward))
            }
            QuestInstance::Shared {
                shared_quest,
                partner,
            } => self.complete_shared(row, quest, shared_quest, partner),
        }
    }

    /// Grant the completion bonus and close the quest and its tasks.
    pub(super) fn reward_and_finalize(
        &mut self,
        mut row: UserQuest,
        quest: &Quest,
        shared_quest_id: Option<SharedQuestId>,
    ) -> Result<QuestReward, ProgressionError> {
        let user_id = row.user_id;
        let change = self.ledger().credit(
            user_id,
            quest.reward_xp,
            quest.reward_coin,
            LedgerReference::Quest(quest.id),
            format!("Completed quest: {}", quest.title),
        )?;

        row.status = QuestStatus::Completed;
        row.completed_at = Some(self.now);
        row.xp_gained = quest.reward_xp;
        row.coin_gained = quest.reward_coin;
        self.tx.put_user_quest(row)?;

        for mut task in self.tx.user_tasks(user_id, quest.id)? {
            task.is_confirmed = true;
            self.tx.put_user_task(task)?;
        }

        self.emit(ProgressionEvent::QuestCompleted {
            user_id,
            quest_id: quest.id,
            xp_gained: quest.reward_xp,
            coin_gained: quest.reward_coin,
            level: change.current,
            shared_quest_id,
        });
        self.emit_level_up(user_id, change);

        Ok(QuestReward {
            user_id,
            xp_gained: quest.reward_xp,
            coin_gained: quest.reward_coin,
            level: change.current,
        })
    }

    fn emit_level_up(&mut self, user_id: UserId, change: LevelChange) {
        if change.leveled_up() {
            self.emit(ProgressionEvent::LevelUp {
                user_id,
                previous_level: change.previous,
                new_level: change.current,
            });
        }
    }

    // ---- scheduling --------------------------------------------------------

    pub(super) fn schedule_tasks(
        &mut self,
        user_id: UserId,
        quest: &Quest,
        schedules: Vec<TaskSchedule>,
    ) -> Result<Vec<UserTask>, ProgressionError> {
        if self.progress(user_id, quest.id)?.is_absent() {
            return Err(ProgressionError::NotPurchased {
                user_id,
                quest_id: quest.id,
            });
        }

        let mut rows = self.tx.user_tasks(user_id, quest.id)?;
        for schedule in schedules {
            let row = rows
                .iter_mut()
                .find(|r| r.task_id == schedule.task_id)
                .ok_or(ProgressionError::TaskNotFound {
                    quest_id: quest.id,
                    task_id: schedule.task_id,
                })?;

            let start = schedule.scheduled_start.or(row.scheduled_start);
            let end = schedule.scheduled_end.or(row.scheduled_end);
            if let (Some(start), Some(end)) = (start, end) {
                if start > end {
                    return Err(ProgressionError::InvalidSchedule {
                        task_id: schedule.task_id,
                        reason: format!("start {} is after end {}", start, end),
                    });
                }
            }

            row.scheduled_start = start;
            row.scheduled_end = end;
            row.deadline = schedule.deadline.or(row.deadline);
            row.duration_minutes = schedule.duration_minutes.or(row.duration_minutes);
            self.tx.put_user_task(row.clone())?;
        }
        Ok(rows)
    }
}
