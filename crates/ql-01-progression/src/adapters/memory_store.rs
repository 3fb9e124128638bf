//! In-memory quest store.
//!
//! Transactions are fully serialized: `begin` takes the store mutex and the
//! transaction holds it until commit or drop. Holding the whole table lock
//! subsumes every row lock the port promises.

use parking_lot::{Mutex, MutexGuard};
use shared_types::entities::{NewQuest, NewUser, Quest, QuestId, User, UserId};

use super::rows::{merge_active_shared, merge_quest_ids, merge_user_tasks, Rows, Sequences};
use crate::domain::entities::{
    LedgerEntry, NewLedgerEntry, NewSharedQuest, SharedQuest, SharedQuestStatus, UserQuest,
    UserTask,
};
use crate::ports::outbound::{QuestStore, StoreError, StoreResult, StoreTransaction};

#[derive(Debug, Default)]
struct MemoryState {
    rows: Rows,
    sequences: Sequences,
    /// One-shot: the next transaction fails on its `n+1`-th write.
    fail_after_writes: Option<usize>,
}

/// Quest store backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryQuestStore {
    state: Mutex<MemoryState>,
}

impl InMemoryQuestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every committed row.
    pub fn snapshot(&self) -> Rows {
        self.state.lock().rows.clone()
    }

    /// Make the next transaction fail once it has staged `writes` writes.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn fail_after_writes(&self, writes: usize) {
        self.state.lock().fail_after_writes = Some(writes);
    }
}

impl QuestStore for InMemoryQuestStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let mut state = self.state.lock();
        let fail_after = state.fail_after_writes.take();
        let sequences = state.sequences;
        Ok(Box::new(MemoryTransaction {
            state,
            staged: Rows::default(),
            sequences,
            writes: 0,
            fail_after,
        }))
    }

    fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

struct MemoryTransaction<'a> {
    state: MutexGuard<'a, MemoryState>,
    staged: Rows,
    sequences: Sequences,
    writes: usize,
    fail_after: Option<usize>,
}

impl MemoryTransaction<'_> {
    fn record_write(&mut self) -> StoreResult<()> {
        if self.fail_after == Some(self.writes) {
            return Err(StoreError::InjectedFailure {
                writes: self.writes,
            });
        }
        self.writes += 1;
        Ok(())
    }
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn quest(&self, quest_id: QuestId) -> StoreResult<Option<Quest>> {
        Ok(self
            .staged
            .quests
            .get(&quest_id)
            .or_else(|| self.state.rows.quests.get(&quest_id))
            .cloned())
    }

    fn insert_quest(&mut self, quest: NewQuest) -> StoreResult<Quest> {
        self.record_write()?;
        let id = self.sequences.quest();
        let sequences = &mut self.sequences;
        let quest = quest.into_quest(id, || sequences.task());
        self.staged.quests.insert(id, quest.clone());
        Ok(quest)
    }

    fn lock_user(&mut self, user_id: UserId) -> StoreResult<Option<User>> {
        Ok(self
            .staged
            .users
            .get(&user_id)
            .or_else(|| self.state.rows.users.get(&user_id))
            .cloned())
    }

    fn put_user(&mut self, user: User) -> StoreResult<()> {
        self.record_write()?;
        self.staged.users.insert(user.id, user);
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser, level: u32) -> StoreResult<User> {
        let id = self.sequences.user();
        let user = User {
            id,
            username: user.username,
            balance: user.balance,
            experience: user.experience,
            level,
        };
        self.put_user(user.clone())?;
        Ok(user)
    }

    fn lock_user_quest(
        &mut self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> StoreResult<Option<UserQuest>> {
        let key = (user_id, quest_id);
        Ok(self
            .staged
            .user_quests
            .get(&key)
            .or_else(|| self.state.rows.user_quests.get(&key))
            .cloned())
    }

    fn put_user_quest(&mut self, row: UserQuest) -> StoreResult<()> {
        self.record_write()?;
        self.staged
            .user_quests
            .insert((row.user_id, row.quest_id), row);
        Ok(())
    }

    fn user_quest_ids(&self, user_id: UserId) -> StoreResult<Vec<QuestId>> {
        Ok(merge_quest_ids(
            self.state.rows.quest_ids_of(user_id),
            &self.staged,
            user_id,
        ))
    }

    fn user_tasks(&self, user_id: UserId, quest_id: QuestId) -> StoreResult<Vec<UserTask>> {
        Ok(merge_user_tasks(
            self.state.rows.user_tasks_of(user_id, quest_id).cloned(),
            &self.staged,
            user_id,
            quest_id,
        ))
    }

    fn put_user_task(&mut self, row: UserTask) -> StoreResult<()> {
        self.record_write()?;
        self.staged
            .user_tasks
            .insert((row.user_id, row.quest_id, row.task_id), row);
        Ok(())
    }

    fn lock_active_shared_quest(
        &mut self,
        user_id: UserId,
        quest_id: QuestId,
    ) -> StoreResult<Option<SharedQuest>> {
        Ok(merge_active_shared(
            self.state.rows.shared_quests_of(user_id, quest_id).cloned(),
            &self.staged,
            user_id,
            quest_id,
        ))
    }

    fn insert_shared_quest(&mut self, shared: NewSharedQuest) -> StoreResult<SharedQuest> {
        let row = SharedQuest {
            id: self.sequences.shared_quest(),
            quest_id: shared.quest_id,
            user_a: shared.user_a,
            user_b: shared.user_b,
            status: SharedQuestStatus::Active,
            created_at: shared.created_at,
            completed_at: None,
        };
        self.put_shared_quest(row.clone())?;
        Ok(row)
    }

    fn put_shared_quest(&mut self, row: SharedQuest) -> StoreResult<()> {
        self.record_write()?;
        self.staged.shared_quests.insert(row.id, row);
        Ok(())
    }

    fn append_ledger(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        self.record_write()?;
        let entry = entry.with_id(self.sequences.ledger());
        self.staged.ledger.push(entry.clone());
        Ok(entry)
    }

    fn ledger(&self, user_id: UserId) -> StoreResult<Vec<LedgerEntry>> {
        Ok(self
            .state
            .rows
            .ledger_of(user_id)
            .chain(self.staged.ledger_of(user_id))
            .cloned()
            .collect())
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            mut state,
            staged,
            sequences,
            ..
        } = *self;
        state.rows.apply(staged);
        state.sequences = sequences;
        Ok(())
    }
}
