//! Row sets and id sequences shared by the store adapters.
//!
//! A store keeps its committed rows and each open transaction keeps its
//! staged writes in a [`Rows`]. Reads inside a transaction consult the staged
//! set first, so a transaction sees its own writes before they commit.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use shared_types::entities::{
    Quest, QuestId, SharedQuestId, TaskId, User, UserId,
};

use crate::domain::entities::{LedgerEntry, SharedQuest, SharedQuestStatus, UserQuest, UserTask};

/// A set of progression rows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rows {
    pub quests: BTreeMap<QuestId, Quest>,
    pub users: BTreeMap<UserId, User>,
    pub user_quests: BTreeMap<(UserId, QuestId), UserQuest>,
    pub user_tasks: BTreeMap<(UserId, QuestId, TaskId), UserTask>,
    pub shared_quests: BTreeMap<SharedQuestId, SharedQuest>,
    pub ledger: Vec<LedgerEntry>,
}

impl Rows {
    pub fn is_empty(&self) -> bool {
        self.quests.is_empty()
            && self.users.is_empty()
            && self.user_quests.is_empty()
            && self.user_tasks.is_empty()
            && self.shared_quests.is_empty()
            && self.ledger.is_empty()
    }

    /// Overwrite rows with `staged` and append its ledger entries.
    pub fn apply(&mut self, staged: Rows) {
        self.quests.extend(staged.quests);
        self.users.extend(staged.users);
        self.user_quests.extend(staged.user_quests);
        self.user_tasks.extend(staged.user_tasks);
        self.shared_quests.extend(staged.shared_quests);
        self.ledger.extend(staged.ledger);
    }

    pub fn user_tasks_of(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> impl Iterator<Item = &UserTask> + '_ {
        self.user_tasks
            .range((user_id, quest_id, TaskId(0))..=(user_id, quest_id, TaskId(u64::MAX)))
            .map(|(_, row)| row)
    }

    pub fn quest_ids_of(&self, user_id: UserId) -> impl Iterator<Item = QuestId> + '_ {
        self.user_quests
            .range((user_id, QuestId(0))..=(user_id, QuestId(u64::MAX)))
            .map(|((_, quest_id), _)| *quest_id)
    }

    /// Shared quests of any status linking `user_id` to `quest_id`.
    pub fn shared_quests_of(
        &self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> impl Iterator<Item = &SharedQuest> + '_ {
        self.shared_quests
            .values()
            .filter(move |s| s.quest_id == quest_id && s.involves(user_id))
    }

    pub fn ledger_of(&self, user_id: UserId) -> impl Iterator<Item = &LedgerEntry> + '_ {
        self.ledger.iter().filter(move |e| e.user_id == user_id)
    }
}

/// Overlay staged task rows onto committed ones, sorted by task order.
pub fn merge_user_tasks(
    committed: impl IntoIterator<Item = UserTask>,
    staged: &Rows,
    user_id: UserId,
    quest_id: QuestId,
) -> Vec<UserTask> {
    let mut by_task: BTreeMap<TaskId, UserTask> = committed
        .into_iter()
        .map(|row| (row.task_id, row))
        .collect();
    for row in staged.user_tasks_of(user_id, quest_id) {
        by_task.insert(row.task_id, row.clone());
    }
    let mut rows: Vec<UserTask> = by_task.into_values().collect();
    rows.sort_by_key(|r| (r.order, r.task_id));
    rows
}

/// Union of committed and staged quest ids, ascending.
pub fn merge_quest_ids(
    committed: impl IntoIterator<Item = QuestId>,
    staged: &Rows,
    user_id: UserId,
) -> Vec<QuestId> {
    let mut ids: BTreeSet<QuestId> = committed.into_iter().collect();
    ids.extend(staged.quest_ids_of(user_id));
    ids.into_iter().collect()
}

/// The active shared quest after overlaying staged rows, if any.
pub fn merge_active_shared(
    committed: impl IntoIterator<Item = SharedQuest>,
    staged: &Rows,
    user_id: UserId,
    quest_id: QuestId,
) -> Option<SharedQuest> {
    let mut by_id: BTreeMap<SharedQuestId, SharedQuest> =
        committed.into_iter().map(|s| (s.id, s)).collect();
    for shared in staged.shared_quests_of(user_id, quest_id) {
        by_id.insert(shared.id, shared.clone());
    }
    by_id
        .into_values()
        .find(|s| s.status == SharedQuestStatus::Active)
}

/// Next free id per table. Ids start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub next_user: u64,
    pub next_quest: u64,
    pub next_task: u64,
    pub next_shared_quest: u64,
    pub next_ledger: u64,
}

impl Default for Sequences {
    fn default() -> Self {
        Self {
            next_user: 1,
            next_quest: 1,
            next_task: 1,
            next_shared_quest: 1,
            next_ledger: 1,
        }
    }
}

impl Sequences {
    fn bump(counter: &mut u64) -> u64 {
        let id = *counter;
        *counter += 1;
        id
    }

    pub fn user(&mut self) -> UserId {
        UserId(Self::bump(&mut self.next_user))
    }

    pub fn quest(&mut self) -> QuestId {
        QuestId(Self::bump(&mut self.next_quest))
    }

    pub fn task(&mut self) -> TaskId {
        TaskId(Self::bump(&mut self.next_task))
    }

    pub fn shared_quest(&mut self) -> SharedQuestId {
        SharedQuestId(Self::bump(&mut self.next_shared_quest))
    }

    pub fn ledger(&mut self) -> u64 {
        Self::bump(&mut self.next_ledger)
    }
}
