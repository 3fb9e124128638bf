//! # Progression Events
//!
//! Every event describes a change that has already been committed.

use serde::{Deserialize, Serialize};
use shared_types::entities::{QuestId, SharedQuestId, TaskId, Timestamp, UserId};

/// All events that can be published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProgressionEvent {
    // =========================================================================
    // PURCHASES
    // =========================================================================
    /// A user bought a quest.
    QuestPurchased {
        user_id: UserId,
        quest_id: QuestId,
        price: u64,
        /// Every quest the user owns after this purchase, ascending.
        owned_quest_ids: Vec<QuestId>,
        /// Set when the purchase was part of a shared quest creation.
        shared_quest_id: Option<SharedQuestId>,
    },

    // =========================================================================
    // QUEST LIFECYCLE
    // =========================================================================
    /// A quest moved to `started`, explicitly or through an early task completion.
    QuestStarted {
        user_id: UserId,
        quest_id: QuestId,
        started_at: Timestamp,
        expires_at: Timestamp,
    },

    /// A quest was finalized and its completion bonus granted.
    QuestCompleted {
        user_id: UserId,
        quest_id: QuestId,
        xp_gained: u64,
        coin_gained: u64,
        level: u32,
        /// Set when the quest was finished together with a partner.
        shared_quest_id: Option<SharedQuestId>,
    },

    // =========================================================================
    // TASKS
    // =========================================================================
    /// A task was completed and its base reward granted.
    TaskCompleted {
        user_id: UserId,
        quest_id: QuestId,
        task_id: TaskId,
        xp_gained: u64,
        coin_gained: u64,
        level: u32,
    },

    // =========================================================================
    // LEVELS
    // =========================================================================
    /// A credit pushed the user over one or more level thresholds.
    LevelUp {
        user_id: UserId,
        previous_level: u32,
        new_level: u32,
    },

    // =========================================================================
    // SHARED QUESTS
    // =========================================================================
    /// Two friends were enrolled in the same quest instance.
    SharedQuestCreated {
        shared_quest_id: SharedQuestId,
        quest_id: QuestId,
        user_a: UserId,
        user_b: UserId,
    },

    /// Both partners finished and were rewarded together.
    SharedQuestCompleted {
        shared_quest_id: SharedQuestId,
        quest_id: QuestId,
        user_a: UserId,
        user_b: UserId,
    },
}

impl ProgressionEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::QuestPurchased { .. } => EventTopic::Purchases,
            Self::QuestStarted { .. } | Self::QuestCompleted { .. } => EventTopic::QuestLifecycle,
            Self::TaskCompleted { .. } => EventTopic::Tasks,
            Self::LevelUp { .. } => EventTopic::Levels,
            Self::SharedQuestCreated { .. } | Self::SharedQuestCompleted { .. } => {
                EventTopic::SharedQuests
            }
        }
    }

    /// Users whose state this event describes.
    #[must_use]
    pub fn users(&self) -> Vec<UserId> {
        match self {
            Self::QuestPurchased { user_id, .. }
            | Self::QuestStarted { user_id, .. }
            | Self::QuestCompleted { user_id, .. }
            | Self::TaskCompleted { user_id, .. }
            | Self::LevelUp { user_id, .. } => vec![*user_id],
            Self::SharedQuestCreated { user_a, user_b, .. }
            | Self::SharedQuestCompleted { user_a, user_b, .. } => vec![*user_a, *user_b],
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Purchases,
    QuestLifecycle,
    Tasks,
    Levels,
    SharedQuests,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Users to include. Empty means all users.
    pub users: Vec<UserId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            users: Vec::new(),
        }
    }

    /// Create a filter for events touching specific users.
    #[must_use]
    pub fn for_users(users: Vec<UserId>) -> Self {
        Self {
            topics: Vec::new(),
            users,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &ProgressionEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let user_match =
            self.users.is_empty() || event.users().iter().any(|u| self.users.contains(u));

        topic_match && user_match
    }
}
