//! # Shared Quests
//!
//! Two friends enrolled in one quest. Creation enrolls both or neither;
//! completion rewards both or neither.

use shared_bus::ProgressionEvent;
use shared_types::entities::{Quest, UserId};

use super::engine::UnitOfWork;
use crate::domain::entities::{NewSharedQuest, SharedQuest, SharedQuestStatus, UserQuest};
use crate::domain::state::{incomplete_count, QuestProgress};
use crate::domain::ProgressionError;
use crate::ports::inbound::QuestCompletion;

impl UnitOfWork<'_> {
    /// Insert the shared quest, then purchase and start the quest for
    /// `user_a` and `user_b` in that order.
    pub(super) fn create_shared_quest(
        &mut self,
        user_a: UserId,
        user_b: UserId,
        quest: &Quest,
    ) -> Result<SharedQuest, ProgressionError> {
        let shared = self.tx.insert_shared_quest(NewSharedQuest {
            quest_id: quest.id,
            user_a,
            user_b,
            created_at: self.now,
        })?;

        for user_id in [user_a, user_b] {
            self.purchase(user_id, quest, Some(shared.id))?;
            self.start(user_id, quest)?;
        }

        self.emit(ProgressionEvent::SharedQuestCreated {
            shared_quest_id: shared.id,
            quest_id: quest.id,
            user_a,
            user_b,
        });
        Ok(shared)
    }

    /// Finalize both sides of a shared quest. `row` is the caller's started
    /// quest, whose tasks are already known to be complete.
    pub(super) fn complete_shared(
        &mut self,
        row: UserQuest,
        quest: &Quest,
        mut shared: SharedQuest,
        partner: UserId,
    ) -> Result<QuestCompletion, ProgressionError> {
        let partner_incomplete = ProgressionError::PartnerIncomplete {
            quest_id: quest.id,
            partner_id: partner,
        };

        let partner_progress = self.progress(partner, quest.id)?;
        let partner_row = match partner_progress {
            QuestProgress::Started(partner_row) => {
                if incomplete_count(&self.tx.user_tasks(partner, quest.id)?) > 0 {
                    return Err(partner_incomplete);
                }
                Some(partner_row)
            }
            // Finalized earlier; never rewarded twice
            QuestProgress::Completed(_) => None,
            QuestProgress::Absent | QuestProgress::Purchased(_) => return Err(partner_incomplete),
        };

        let actor = self.reward_and_finalize(row, quest, Some(shared.id))?;
        let partner = match partner_row {
            Some(partner_row) => Some(self.reward_and_finalize(partner_row, quest, Some(shared.id))?),
            None => None,
        };

        shared.status = SharedQuestStatus::Completed;
        shared.completed_at = Some(self.now);
        self.tx.put_shared_quest(shared.clone())?;

        self.emit(ProgressionEvent::SharedQuestCompleted {
            shared_quest_id: shared.id,
            quest_id: quest.id,
            user_a: shared.user_a,
            user_b: shared.user_b,
        });

        Ok(QuestCompletion::Shared {
            shared_quest_id: shared.id,
            actor,
            partner,
        })
    }
}
