//! Catalog file format and loader.
//!
//! ```toml
//! [[quests]]
//! title = "Morning routine"
//! price = 10
//! reward_xp = 50
//! time_limit_hours = 24
//!
//! [[quests.tasks]]
//! order = 1
//! title = "Drink water"
//! base_xp_reward = 10
//!
//! [[users]]
//! username = "ada"
//! balance = 100
//!
//! [[friendships]]
//! user_a = 1
//! user_b = 2
//! ```
//!
//! Quests and users are imported in one transaction, and only into a store
//! holding neither. A fresh store assigns ids in file order starting at 1,
//! so friendships refer to users by the id they will receive.

use std::path::{Path, PathBuf};

use ql_01_progression::{InMemoryFriendships, ProgressionApi, ProgressionError};
use serde::{Deserialize, Serialize};
use shared_types::entities::{NewQuest, NewUser, UserId};
use shared_types::CatalogError;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read catalog {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid quest #{index} in catalog: {source}")]
    InvalidQuest {
        index: usize,
        #[source]
        source: CatalogError,
    },

    #[error("Seeding failed: {0}")]
    Progression(#[from] ProgressionError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendshipSeed {
    pub user_a: UserId,
    pub user_b: UserId,
}

/// Parsed catalog file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogFile {
    pub quests: Vec<NewQuest>,
    pub users: Vec<NewUser>,
    pub friendships: Vec<FriendshipSeed>,
}

impl CatalogFile {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| SeedError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        for (index, quest) in self.quests.iter().enumerate() {
            quest
                .validate()
                .map_err(|source| SeedError::InvalidQuest { index, source })?;
        }
        Ok(())
    }
}

/// What a seeding run did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub quests: usize,
    pub users: usize,
    pub friendships: usize,
    /// The store already held quests or users; only friendships were loaded.
    pub skipped: bool,
}

pub struct Seeder<'a, A: ProgressionApi + ?Sized> {
    api: &'a A,
    friendships: &'a InMemoryFriendships,
}

impl<'a, A: ProgressionApi + ?Sized> Seeder<'a, A> {
    pub fn new(api: &'a A, friendships: &'a InMemoryFriendships) -> Self {
        Self { api, friendships }
    }

    pub fn seed(&self, catalog: CatalogFile) -> Result<SeedReport, SeedError> {
        catalog.validate()?;

        let mut report = SeedReport::default();
        match self.api.import_catalog(catalog.quests, catalog.users)? {
            Some(import) => {
                report.quests = import.quests.len();
                report.users = import.users.len();
            }
            None => report.skipped = true,
        }

        for pair in &catalog.friendships {
            self.friendships.befriend(pair.user_a, pair.user_b);
            report.friendships += 1;
        }

        info!(
            quests = report.quests,
            users = report.users,
            friendships = report.friendships,
            skipped = report.skipped,
            "[ql-rt] Catalog seeded"
        );
        Ok(report)
    }
}
