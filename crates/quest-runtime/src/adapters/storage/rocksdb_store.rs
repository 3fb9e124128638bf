//! # RocksDB Quest Store
//!
//! Durable implementation of the `QuestStore` port.
//!
//! ## Features
//!
//! - One `WriteBatch` per committed transaction
//! - Column family per table
//! - Snappy compression and bloom filters
//! - fsync on commit (configurable)
//!
//! ## Column Families
//!
//! | Family | Key | Value |
//! |--------|-----|-------|
//! | `quests` | quest id | `Quest` |
//! | `users` | user id | `User` |
//! | `user_quests` | user id, quest id | `UserQuest` |
//! | `user_tasks` | user id, quest id, task id | `UserTask` |
//! | `shared_quests` | shared quest id | `SharedQuest` |
//! | `shared_index` | user id, quest id, shared quest id | empty |
//! | `ledger` | user id, entry id | `LedgerEntry` |
//! | `metadata` | `sequences` | `Sequences` |
//!
//! Ids are encoded big-endian so prefix scans return rows in id order.
//! Values are JSON.
//!
//! Writers are serialized by a store-wide mutex held from `begin` until
//! commit or drop, which covers every row lock the port promises.

use std::path::PathBuf;

use parking_lot::{Mutex, MutexGuard};
use ql_01_progression::adapters::rows::{
    merge_active_shared, merge_quest_ids, merge_user_tasks, Rows, Sequences,
};
use ql_01_progression::{
    LedgerEntry, NewLedgerEntry, QuestStore, SharedQuest, SharedQuestStatus, StoreError,
    StoreTransaction, UserQuest, UserTask,
};
use ql_01_progression::domain::entities::NewSharedQuest;
use rocksdb::{
    BlockBasedOptions, Cache, ColumnFamily, ColumnFamilyDescriptor, DBCompressionType, Direction,
    IteratorMode, Options, WriteBatch, WriteOptions, DB,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use shared_types::entities::{NewQuest, NewUser, Quest, QuestId, User, UserId};
use tracing::{debug, info};

type StoreResult<T> = Result<T, StoreError>;

pub const CF_QUESTS: &str = "quests";
pub const CF_USERS: &str = "users";
pub const CF_USER_QUESTS: &str = "user_quests";
pub const CF_USER_TASKS: &str = "user_tasks";
pub const CF_SHARED_QUESTS: &str = "shared_quests";
pub const CF_SHARED_INDEX: &str = "shared_index";
pub const CF_LEDGER: &str = "ledger";
pub const CF_METADATA: &str = "metadata";

/// All column families used by the store
pub const COLUMN_FAMILIES: &[&str] = &[
    CF_QUESTS,
    CF_USERS,
    CF_USER_QUESTS,
    CF_USER_TASKS,
    CF_SHARED_QUESTS,
    CF_SHARED_INDEX,
    CF_LEDGER,
    CF_METADATA,
];

const SEQUENCES_KEY: &[u8] = b"sequences";

/// RocksDB configuration
#[derive(Debug, Clone)]
pub struct RocksDbConfig {
    /// Path to the database directory
    pub path: PathBuf,
    /// Block cache size in bytes (default: 64MB)
    pub block_cache_size: usize,
    /// Write buffer size in bytes (default: 16MB)
    pub write_buffer_size: usize,
    /// Enable fsync on every commit (default: true)
    pub sync_writes: bool,
}

impl Default for RocksDbConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./data/questline"),
            block_cache_size: 64 * 1024 * 1024,
            write_buffer_size: 16 * 1024 * 1024,
            sync_writes: true,
        }
    }
}

impl RocksDbConfig {
    /// Create config for testing (smaller buffers, no sync)
    pub fn for_testing(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            block_cache_size: 8 * 1024 * 1024,
            write_buffer_size: 4 * 1024 * 1024,
            sync_writes: false,
        }
    }
}

fn backend(context: &str, e: rocksdb::Error) -> StoreError {
    StoreError::Backend(format!("RocksDB {} failed: {}", context, e))
}

/// Big-endian concatenation of ids.
fn key(ids: &[u64]) -> Vec<u8> {
    ids.iter().flat_map(|id| id.to_be_bytes()).collect()
}

/// Human-readable form of a key for error messages.
fn display_key(cf: &str, raw: &[u8]) -> String {
    let ids: Vec<String> = raw
        .chunks(8)
        .map(|chunk| {
            <[u8; 8]>::try_from(chunk)
                .map(|bytes| u64::from_be_bytes(bytes).to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(chunk).into_owned())
        })
        .collect();
    format!("{}/{}", cf, ids.join("/"))
}

fn decode<T: DeserializeOwned>(cf: &str, raw_key: &[u8], value: &[u8]) -> StoreResult<T> {
    serde_json::from_slice(value).map_err(|e| StoreError::Corrupted {
        key: display_key(cf, raw_key),
        reason: e.to_string(),
    })
}

fn encode<T: Serialize>(cf: &str, raw_key: &[u8], value: &T) -> StoreResult<Vec<u8>> {
    serde_json::to_vec(value).map_err(|e| StoreError::Corrupted {
        key: display_key(cf, raw_key),
        reason: e.to_string(),
    })
}

/// Quest store backed by RocksDB.
pub struct RocksDbQuestStore {
    db: DB,
    /// Committed id sequences. Doubles as the writer lock.
    sequences: Mutex<Sequences>,
    config: RocksDbConfig,
}

impl RocksDbQuestStore {
    /// Open or create the database at `config.path`.
    pub fn open(config: RocksDbConfig) -> StoreResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(config.write_buffer_size);
        opts.set_compression_type(DBCompressionType::Snappy);

        let mut block_opts = BlockBasedOptions::default();
        block_opts.set_bloom_filter(10.0, false);
        block_opts.set_block_cache(&Cache::new_lru_cache(config.block_cache_size));
        opts.set_block_based_table_factory(&block_opts);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = COLUMN_FAMILIES
            .iter()
            .map(|name| {
                let mut cf_opts = Options::default();
                cf_opts.set_compression_type(DBCompressionType::Snappy);
                ColumnFamilyDescriptor::new(*name, cf_opts)
            })
            .collect();

        let db = DB::open_cf_descriptors(&opts, &config.path, cf_descriptors)
            .map_err(|e| backend("open", e))?;

        let mut store = Self {
            db,
            sequences: Mutex::new(Sequences::default()),
            config,
        };
        let sequences = store
            .get::<Sequences>(CF_METADATA, SEQUENCES_KEY)?
            .unwrap_or_default();
        *store.sequences.get_mut() = sequences;

        info!(
            path = %store.config.path.display(),
            next_user = sequences.next_user,
            next_quest = sequences.next_quest,
            "[ql-rt] RocksDB quest store opened"
        );
        Ok(store)
    }

    fn cf(&self, name: &str) -> StoreResult<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("Missing column family {}", name)))
    }

    fn get<T: DeserializeOwned>(&self, cf: &str, raw_key: &[u8]) -> StoreResult<Option<T>> {
        self.db
            .get_cf(self.cf(cf)?, raw_key)
            .map_err(|e| backend("get", e))?
            .map(|value| decode(cf, raw_key, &value))
            .transpose()
    }

    /// Every (key, value) whose key starts with `prefix`, in key order.
    fn scan(&self, cf: &str, prefix: &[u8]) -> StoreResult<Vec<(Box<[u8]>, Box<[u8]>)>> {
        let iter = self
            .db
            .iterator_cf(self.cf(cf)?, IteratorMode::From(prefix, Direction::Forward));

        let mut results = Vec::new();
        for item in iter {
            let (k, v) = item.map_err(|e| backend("scan", e))?;
            if !k.starts_with(prefix) {
                break;
            }
            results.push((k, v));
        }
        Ok(results)
    }

    fn scan_values<T: DeserializeOwned>(&self, cf: &str, prefix: &[u8]) -> StoreResult<Vec<T>> {
        self.scan(cf, prefix)?
            .iter()
            .map(|(k, v)| decode(cf, k, v))
            .collect()
    }

    fn write(&self, staged: &Rows, sequences: &Sequences) -> StoreResult<usize> {
        let mut batch = WriteBatch::default();

        fn put<T: Serialize>(
            store: &RocksDbQuestStore,
            batch: &mut WriteBatch,
            cf: &str,
            raw_key: Vec<u8>,
            value: &T,
        ) -> StoreResult<()> {
            let value = encode(cf, &raw_key, value)?;
            batch.put_cf(store.cf(cf)?, raw_key, value);
            Ok(())
        }

        for quest in staged.quests.values() {
            put(self, &mut batch, CF_QUESTS, key(&[quest.id.0]), quest)?;
        }
        for user in staged.users.values() {
            put(self, &mut batch, CF_USERS, key(&[user.id.0]), user)?;
        }
        for row in staged.user_quests.values() {
            let k = key(&[row.user_id.0, row.quest_id.0]);
            put(self, &mut batch, CF_USER_QUESTS, k, row)?;
        }
        for row in staged.user_tasks.values() {
            let k = key(&[row.user_id.0, row.quest_id.0, row.task_id.0]);
            put(self, &mut batch, CF_USER_TASKS, k, row)?;
        }
        let index = self.cf(CF_SHARED_INDEX)?;
        for shared in staged.shared_quests.values() {
            put(self, &mut batch, CF_SHARED_QUESTS, key(&[shared.id.0]), shared)?;
            for user in [shared.user_a, shared.user_b] {
                batch.put_cf(index, key(&[user.0, shared.quest_id.0, shared.id.0]), b"");
            }
        }
        for entry in &staged.ledger {
            let k = key(&[entry.user_id.0, entry.id]);
            put(self, &mut batch, CF_LEDGER, k, entry)?;
        }
        put(
            self,
            &mut batch,
            CF_METADATA,
            SEQUENCES_KEY.to_vec(),
            sequences,
        )?;

        let operations = batch.len();
        let mut write_opts = WriteOptions::default();
        write_opts.set_sync(self.config.sync_writes);
        self.db
            .write_opt(batch, &write_opts)
            .map_err(|e| backend("batch write", e))?;
        Ok(operations)
    }
}

impl QuestStore for RocksDbQuestStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        let guard = self.sequences.lock();
        let sequences = *guard;
        Ok(Box::new(RocksDbTransaction {
            store: self,
            guard,
            staged: Rows::default(),
            sequences,
        }))
    }

    fn ping(&self) -> StoreResult<()> {
        self.get::<Sequences>(CF_METADATA, SEQUENCES_KEY).map(|_| ())
    }
}

struct RocksDbTransaction<'a> {
    store: &'a RocksDbQuestStore,
    guard: MutexGuard<'a, Sequences>,
    staged: Rows,
    sequences: Sequences,
}

impl StoreTransaction for RocksDbTransaction<'_> {
    fn quest(&self, quest_id: QuestId) -> StoreResult<Option<Quest>> {
        match self.staged.quests.get(&quest_id) {
            Some(quest) => Ok(Some(quest.clone())),
            None => self.store.get(CF_QUESTS, &key(&[quest_id.0])),
        }
    }

    fn insert_quest(&mut self, quest: NewQuest) -> StoreResult<Quest> {
        let id = self.sequences.quest();
        let sequences = &mut self.sequences;
        let quest = quest.into_quest(id, || sequences.task());
        self.staged.quests.insert(id, quest.clone());
        Ok(quest)
    }

    fn lock_user(&mut self, user_id: UserId) -> StoreResult<Option<User>> {
        match self.staged.users.get(&user_id) {
            Some(user) => Ok(Some(user.clone())),
            None => self.store.get(CF_USERS, &key(&[user_id.0])),
        }
    }

    fn put_user(&mut self, user: User) -> StoreResult<()> {
        self.staged.users.insert(user.id, user);
        Ok(())
    }

    fn insert_user(&mut self, user: NewUser, level: u32) -> StoreResult<User> {
        let user = User {
            id: self.sequences.user(),
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
        match self.staged.user_quests.get(&(user_id, quest_id)) {
            Some(row) => Ok(Some(row.clone())),
            None => self
                .store
                .get(CF_USER_QUESTS, &key(&[user_id.0, quest_id.0])),
        }
    }

    fn put_user_quest(&mut self, row: UserQuest) -> StoreResult<()> {
        self.staged
            .user_quests
            .insert((row.user_id, row.quest_id), row);
        Ok(())
    }

    fn user_quest_ids(&self, user_id: UserId) -> StoreResult<Vec<QuestId>> {
        let committed: Vec<UserQuest> =
            self.store.scan_values(CF_USER_QUESTS, &key(&[user_id.0]))?;
        Ok(merge_quest_ids(
            committed.into_iter().map(|row| row.quest_id),
            &self.staged,
            user_id,
        ))
    }

    fn user_tasks(&self, user_id: UserId, quest_id: QuestId) -> StoreResult<Vec<UserTask>> {
        let committed: Vec<UserTask> = self
            .store
            .scan_values(CF_USER_TASKS, &key(&[user_id.0, quest_id.0]))?;
        Ok(merge_user_tasks(committed, &self.staged, user_id, quest_id))
    }

    fn put_user_task(&mut self, row: UserTask) -> StoreResult<()> {
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
        let mut committed = Vec::new();
        for (index_key, _) in self
            .store
            .scan(CF_SHARED_INDEX, &key(&[user_id.0, quest_id.0]))?
        {
            let shared_key = &index_key[16..];
            if let Some(shared) = self.store.get::<SharedQuest>(CF_SHARED_QUESTS, shared_key)? {
                committed.push(shared);
            }
        }
        Ok(merge_active_shared(committed, &self.staged, user_id, quest_id))
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
        self.staged.shared_quests.insert(row.id, row);
        Ok(())
    }

    fn append_ledger(&mut self, entry: NewLedgerEntry) -> StoreResult<LedgerEntry> {
        let entry = entry.with_id(self.sequences.ledger());
        self.staged.ledger.push(entry.clone());
        Ok(entry)
    }

    fn ledger(&self, user_id: UserId) -> StoreResult<Vec<LedgerEntry>> {
        let mut entries: Vec<LedgerEntry> =
            self.store.scan_values(CF_LEDGER, &key(&[user_id.0]))?;
        entries.extend(self.staged.ledger_of(user_id).cloned());
        Ok(entries)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let RocksDbTransaction {
            store,
            mut guard,
            staged,
            sequences,
        } = *self;

        if staged.is_empty() && *guard == sequences {
            return Ok(());
        }
        let operations = store.write(&staged, &sequences)?;
        *guard = sequences;

        debug!(operations, "[ql-rt] Transaction committed");
        Ok(())
    }
}
