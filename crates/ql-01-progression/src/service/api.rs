//! # ProgressionApi Implementation

use shared_types::entities::{NewQuest, NewUser, Quest, QuestId, TaskId, User, UserId};
use tracing::info;

use super::ProgressionService;
use crate::domain::entities::{LedgerEntry, SharedQuest, TaskSchedule, UserQuest, UserTask};
use crate::domain::level::LevelCalculator;
use crate::domain::state::QuestProgress;
use crate::domain::ProgressionError;
use crate::ports::inbound::{
    CatalogImport, ProgressionApi, ProgressionView, PurchaseReceipt, QuestCompletion, TaskCompletion,
};
use crate::ports::outbound::{FriendshipProvider, ProgressionEventSink, QuestStore, TimeSource};

impl<S, F, T, P> ProgressionApi for ProgressionService<S, F, T, P>
where
    S: QuestStore,
    F: FriendshipProvider,
    T: TimeSource,
    P: ProgressionEventSink,
{
    fn purchase(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<PurchaseReceipt, ProgressionError> {
        let receipt = self.run("purchase", |uow| {
            let quest = uow.quest(quest_id)?;
            uow.purchase(user_id, &quest, None)
        })?;

        info!(
            user_id = %user_id,
            quest_id = %quest_id,
            balance = receipt.balance,
            "[ql-01] Quest purchased"
        );
        Ok(receipt)
    }

    fn start(&self, user_id: UserId, quest_id: QuestId) -> Result<UserQuest, ProgressionError> {
        let row = self.run("start", |uow| {
            let quest = uow.quest(quest_id)?;
            uow.start(user_id, &quest)
        })?;

        info!(
            user_id = %user_id,
            quest_id = %quest_id,
            expires_at = ?row.expires_at,
            "[ql-01] Quest started"
        );
        Ok(row)
    }

    fn complete_task(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        task_id: TaskId,
    ) -> Result<TaskCompletion, ProgressionError> {
        let completion = self.run("complete_task", |uow| {
            let quest = uow.quest(quest_id)?;
            uow.complete_task(user_id, &quest, task_id)
        })?;

        info!(
            user_id = %user_id,
            quest_id = %quest_id,
            task_id = %task_id,
            xp = completion.xp_gained,
            level = completion.level,
            "[ql-01] Task completed"
        );
        Ok(completion)
    }

    fn complete_quest(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<QuestCompletion, ProgressionError> {
        let completion = self.run("complete_quest", |uow| {
            let quest = uow.quest(quest_id)?;
            uow.complete_quest(user_id, &quest)
        })?;

        info!(
            user_id = %user_id,
            quest_id = %quest_id,
            level = completion.actor().level,
            shared = matches!(completion, QuestCompletion::Shared { .. }),
            "[ql-01] Quest completed"
        );
        Ok(completion)
    }

    fn create_shared_quest(
        &self,
        user_a: UserId,
        user_b: UserId,
        quest_id: QuestId,
    ) -> Result<SharedQuest, ProgressionError> {
        let shared = self.run("create_shared_quest", |uow| {
            if user_a == user_b || !self.friendships.are_friends(user_a, user_b)? {
                return Err(ProgressionError::NotFriends { user_a, user_b });
            }
            let quest = uow.quest(quest_id)?;
            uow.create_shared_quest(user_a, user_b, &quest)
        })?;

        info!(
            shared_quest_id = %shared.id,
            quest_id = %quest_id,
            user_a = %user_a,
            user_b = %user_b,
            "[ql-01] Shared quest created"
        );
        Ok(shared)
    }

    fn schedule_tasks(
        &self,
        user_id: UserId,
        quest_id: QuestId,
        schedules: Vec<TaskSchedule>,
    ) -> Result<Vec<UserTask>, ProgressionError> {
        self.run("schedule_tasks", |uow| {
            let quest = uow.quest(quest_id)?;
            uow.schedule_tasks(user_id, &quest, schedules)
        })
    }

    fn quest_ids_for_user(&self, user_id: UserId) -> Result<Vec<QuestId>, ProgressionError> {
        self.read(|tx| Ok(tx.user_quest_ids(user_id)?))
    }

    fn progress(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> Result<ProgressionView, ProgressionError> {
        self.read(|tx| {
            let progress = QuestProgress::from_row(tx.lock_user_quest(user_id, quest_id)?);
            let tasks = if progress.is_absent() {
                Vec::new()
            } else {
                tx.user_tasks(user_id, quest_id)?
            };
            let shared_quest = tx.lock_active_shared_quest(user_id, quest_id)?;
            Ok(ProgressionView {
                progress,
                tasks,
                shared_quest,
            })
        })
    }

    fn user(&self, user_id: UserId) -> Result<User, ProgressionError> {
        self.read(|tx| {
            tx.lock_user(user_id)?
                .ok_or(ProgressionError::UserNotFound(user_id))
        })
    }

    fn quest(&self, quest_id: QuestId) -> Result<Quest, ProgressionError> {
        self.read(|tx| {
            tx.quest(quest_id)?
                .ok_or(ProgressionError::QuestNotFound(quest_id))
        })
    }

    fn ledger(&self, user_id: UserId) -> Result<Vec<LedgerEntry>, ProgressionError> {
        self.read(|tx| Ok(tx.ledger(user_id)?))
    }

    fn register_quest(&self, quest: NewQuest) -> Result<Quest, ProgressionError> {
        quest.validate()?;
        let quest = self.run("register_quest", |uow| Ok(uow.tx.insert_quest(quest)?))?;

        info!(
            quest_id = %quest.id,
            title = %quest.title,
            tasks = quest.tasks.len(),
            "[ql-01] Quest registered"
        );
        Ok(quest)
    }

    fn register_user(&self, user: NewUser) -> Result<User, ProgressionError> {
        let level = LevelCalculator::compute(user.experience);
        let user = self.run("register_user", |uow| Ok(uow.tx.insert_user(user, level)?))?;

        info!(user_id = %user.id, username = %user.username, "[ql-01] User registered");
        Ok(user)
    }

    fn import_catalog(
        &self,
        quests: Vec<NewQuest>,
        users: Vec<NewUser>,
    ) -> Result<Option<CatalogImport>, ProgressionError> {
        for quest in &quests {
            quest.validate()?;
        }

        let imported = self.run("import_catalog", |uow| {
            // Ids start at 1 and rows are never deleted
            if uow.tx.quest(QuestId(1))?.is_some() || uow.tx.lock_user(UserId(1))?.is_some() {
                return Ok(None);
            }

            let mut import = CatalogImport {
                quests: Vec::with_capacity(quests.len()),
                users: Vec::with_capacity(users.len()),
            };
            for quest in quests {
                import.quests.push(uow.tx.insert_quest(quest)?);
            }
            for user in users {
                let level = LevelCalculator::compute(user.experience);
                import.users.push(uow.tx.insert_user(user, level)?);
            }
            Ok(Some(import))
        })?;

        match &imported {
            Some(import) => info!(
                quests = import.quests.len(),
                users = import.users.len(),
                "[ql-01] Catalog imported"
            ),
            None => info!("[ql-01] Store already populated, catalog import skipped"),
        }
        Ok(imported)
    }

    fn health(&self) -> Result<(), ProgressionError> {
        Ok(self.store.ping()?)
    }
}
