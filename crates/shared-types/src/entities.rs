//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `UserId`, `QuestId`, `TaskId`, `SharedQuestId`
//! - **Catalog**: `Quest`, `Task` and their registration forms `NewQuest`, `NewTask`
//! - **Players**: `User`, `NewUser`

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::CatalogError;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Seconds in one hour, used to turn quest time limits into expiry timestamps.
pub const SECONDS_PER_HOUR: u64 = 3_600;

// =============================================================================
// CLUSTER A: IDENTITY
// =============================================================================

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

id_type!(
    /// Identifier of a player account.
    UserId
);
id_type!(
    /// Identifier of a catalog quest.
    QuestId
);
id_type!(
    /// Identifier of a catalog task template.
    TaskId
);
id_type!(
    /// Identifier of a two-party quest instance.
    SharedQuestId
);

// =============================================================================
// CLUSTER B: CATALOG
// =============================================================================

/// A task template. Belongs to exactly one quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub quest_id: QuestId,
    /// Position within the quest. Lower orders come first.
    pub order: u32,
    pub title: String,
    pub description: String,
    pub difficulty: u8,
    pub rarity: String,
    pub category: String,
    /// Experience granted the moment the task is completed.
    pub base_xp_reward: u64,
    /// Currency granted the moment the task is completed.
    pub base_coin_reward: u64,
}

/// A purchasable quest together with its ordered task templates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quest {
    pub id: QuestId,
    pub title: String,
    pub description: String,
    pub category: String,
    pub rarity: String,
    pub difficulty: u8,
    /// Flat currency cost of a purchase.
    pub price: u64,
    /// Bonus experience granted on full completion.
    pub reward_xp: u64,
    /// Bonus currency granted on full completion.
    pub reward_coin: u64,
    pub time_limit_hours: u32,
    /// Tasks must be completed in ascending `order`.
    pub is_sequential: bool,
    /// Sorted by `order`.
    pub tasks: Vec<Task>,
}

impl Quest {
    /// Look up a task of this quest.
    pub fn task(&self, task_id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Sum of the base rewards of all tasks plus the completion bonus.
    pub fn total_xp(&self) -> u64 {
        self.tasks
            .iter()
            .map(|t| t.base_xp_reward)
            .fold(self.reward_xp, u64::saturating_add)
    }
}

/// Registration form of a task. Ids are assigned by the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewTask {
    pub order: u32,
    pub title: String,
    pub description: String,
    pub difficulty: u8,
    pub rarity: String,
    pub category: String,
    pub base_xp_reward: u64,
    pub base_coin_reward: u64,
}

/// Registration form of a quest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewQuest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rarity: String,
    #[serde(default)]
    pub difficulty: u8,
    pub price: u64,
    #[serde(default)]
    pub reward_xp: u64,
    #[serde(default)]
    pub reward_coin: u64,
    pub time_limit_hours: u32,
    #[serde(default)]
    pub is_sequential: bool,
    pub tasks: Vec<NewTask>,
}

impl NewQuest {
    /// Reject definitions the engine could never progress through.
    pub fn validate(&self) -> Result<(), CatalogError> {
        if self.title.trim().is_empty() {
            return Err(CatalogError::EmptyTitle);
        }
        if self.tasks.is_empty() {
            return Err(CatalogError::NoTasks {
                title: self.title.clone(),
            });
        }
        if self.time_limit_hours == 0 {
            return Err(CatalogError::ZeroTimeLimit {
                title: self.title.clone(),
            });
        }
        let mut seen = HashSet::with_capacity(self.tasks.len());
        for task in &self.tasks {
            if !seen.insert(task.order) {
                return Err(CatalogError::DuplicateTaskOrder {
                    title: self.title.clone(),
                    order: task.order,
                });
            }
        }
        Ok(())
    }

    /// Materialize the quest under `id`. `next_task_id` is called once per
    /// task, in ascending task order.
    pub fn into_quest(self, id: QuestId, mut next_task_id: impl FnMut() -> TaskId) -> Quest {
        let mut tasks = self.tasks;
        tasks.sort_by_key(|t| t.order);
        let tasks = tasks
            .into_iter()
            .map(|t| Task {
                id: next_task_id(),
                quest_id: id,
                order: t.order,
                title: t.title,
                description: t.description,
                difficulty: t.difficulty,
                rarity: t.rarity,
                category: t.category,
                base_xp_reward: t.base_xp_reward,
                base_coin_reward: t.base_coin_reward,
            })
            .collect();

        Quest {
            id,
            title: self.title,
            description: self.description,
            category: self.category,
            rarity: self.rarity,
            difficulty: self.difficulty,
            price: self.price,
            reward_xp: self.reward_xp,
            reward_coin: self.reward_coin,
            time_limit_hours: self.time_limit_hours,
            is_sequential: self.is_sequential,
            tasks,
        }
    }
}

// =============================================================================
// CLUSTER C: PLAYERS
// =============================================================================

/// A player's wallet and progression counters.
///
/// `level` is derived from `experience`; only the balance ledger writes
/// these three fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub balance: u64,
    pub experience: u64,
    pub level: u32,
}

/// Registration form of a user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NewUser {
    pub username: String,
    pub balance: u64,
    pub experience: u64,
}
