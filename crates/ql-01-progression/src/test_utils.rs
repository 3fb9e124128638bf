//! Builders shared by the unit tests.

use std::sync::Arc;

use shared_types::entities::{NewQuest, NewTask, NewUser, Quest, QuestId, Task, TaskId, User};

use crate::adapters::{InMemoryFriendships, InMemoryQuestStore, RecordingEventSink};
use crate::ports::inbound::ProgressionApi;
use crate::ports::outbound::MockTimeSource;
use crate::service::{ProgressionConfig, ProgressionDependencies, ProgressionService};

pub const T0: u64 = 1_700_000_000;

/// A three-task quest with ids `id*10+1 ..= id*10+3`.
pub fn sample_quest(id: u64, sequential: bool) -> Quest {
    let quest_id = QuestId(id);
    let tasks = (1..=3)
        .map(|n| Task {
            id: TaskId(id * 10 + n),
            quest_id,
            order: n as u32,
            title: format!("Step {}", n),
            description: String::new(),
            difficulty: 1,
            rarity: "common".into(),
            category: "health".into(),
            base_xp_reward: 10,
            base_coin_reward: 1,
        })
        .collect();

    Quest {
        id: quest_id,
        title: format!("Quest {}", id),
        description: String::new(),
        category: "health".into(),
        rarity: "common".into(),
        difficulty: 1,
        price: 10,
        reward_xp: 50,
        reward_coin: 5,
        time_limit_hours: 24,
        is_sequential: sequential,
        tasks,
    }
}

/// Registration form of a three-task quest.
pub fn new_quest(title: &str, price: u64, sequential: bool) -> NewQuest {
    NewQuest {
        title: title.into(),
        description: String::new(),
        category: "health".into(),
        rarity: "common".into(),
        difficulty: 1,
        price,
        reward_xp: 50,
        reward_coin: 5,
        time_limit_hours: 24,
        is_sequential: sequential,
        tasks: (1..=3)
            .map(|n| NewTask {
                order: n,
                title: format!("Step {}", n),
                base_xp_reward: 10,
                base_coin_reward: 1,
                ..NewTask::default()
            })
            .collect(),
    }
}

pub type TestService = ProgressionService<
    Arc<InMemoryQuestStore>,
    Arc<InMemoryFriendships>,
    Arc<MockTimeSource>,
    Arc<RecordingEventSink>,
>;

/// A service over in-memory adapters, with handles to each adapter.
pub struct Harness {
    pub service: TestService,
    pub store: Arc<InMemoryQuestStore>,
    pub friendships: Arc<InMemoryFriendships>,
    pub clock: Arc<MockTimeSource>,
    pub events: Arc<RecordingEventSink>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(ProgressionConfig::default())
    }

    pub fn with_config(config: ProgressionConfig) -> Self {
        let store = Arc::new(InMemoryQuestStore::new());
        let friendships = Arc::new(InMemoryFriendships::new());
        let clock = Arc::new(MockTimeSource::new(T0));
        let events = Arc::new(RecordingEventSink::new());
        let deps = ProgressionDependencies {
            store: Arc::clone(&store),
            friendships: Arc::clone(&friendships),
            time_source: Arc::clone(&clock),
            events: Arc::clone(&events),
        };
        let service = ProgressionService::new(deps, config);
        Self {
            service,
            store,
            friendships,
            clock,
            events,
        }
    }

    pub fn user(&self, name: &str, balance: u64) -> User {
        self.service
            .register_user(NewUser {
                username: name.into(),
                balance,
                experience: 0,
            })
            .unwrap()
    }

    pub fn quest(&self, price: u64, sequential: bool) -> Quest {
        self.service
            .register_quest(new_quest("Morning routine", price, sequential))
            .unwrap()
    }
}
