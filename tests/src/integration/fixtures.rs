//! # Test Fixtures
//!
//! A progression engine wired to a real event bus, plus stand-ins for the
//! recommendation service (in-process and over HTTP).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use ql_01_progression::{
    BusEventSink, InMemoryFriendships, InMemoryQuestStore, MockTimeSource, ProgressionApi,
    ProgressionConfig, ProgressionDependencies, ProgressionService,
};
use ql_02_recommendation_sync::{AddUsersRequest, RecommendationClient, RecommendationError};
use shared_bus::InMemoryEventBus;
use shared_types::entities::{NewQuest, NewTask, NewUser, Quest, User};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const T0: u64 = 1_700_000_000;

pub type WorldService = ProgressionService<
    Arc<InMemoryQuestStore>,
    Arc<InMemoryFriendships>,
    Arc<MockTimeSource>,
    BusEventSink,
>;

/// A progression engine publishing to a shared bus.
pub struct World {
    pub service: Arc<WorldService>,
    pub bus: Arc<InMemoryEventBus>,
    pub store: Arc<InMemoryQuestStore>,
    pub friendships: Arc<InMemoryFriendships>,
    pub clock: Arc<MockTimeSource>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self::with_config(ProgressionConfig::default())
    }

    pub fn with_config(config: ProgressionConfig) -> Self {
        let bus = Arc::new(InMemoryEventBus::new());
        let store = Arc::new(InMemoryQuestStore::new());
        let friendships = Arc::new(InMemoryFriendships::new());
        let clock = Arc::new(MockTimeSource::new(T0));
        let service = Arc::new(ProgressionService::new(
            ProgressionDependencies {
                store: Arc::clone(&store),
                friendships: Arc::clone(&friendships),
                time_source: Arc::clone(&clock),
                events: BusEventSink::new(Arc::clone(&bus)),
            },
            config,
        ));
        Self {
            service,
            bus,
            store,
            friendships,
            clock,
        }
    }

    pub fn user(&self, name: &str, balance: u64) -> User {
        self.service
            .register_user(NewUser {
                username: name.into(),
                balance,
                experience: 0,
            })
            .expect("register user")
    }

    /// Register a quest whose tasks each pay `task_xp` xp and 1 coin.
    pub fn quest(&self, title: &str, price: u64, tasks: u32, task_xp: u64) -> Quest {
        self.service
            .register_quest(quest_form(title, price, tasks, task_xp, false))
            .expect("register quest")
    }
}

pub fn quest_form(title: &str, price: u64, tasks: u32, task_xp: u64, sequential: bool) -> NewQuest {
    NewQuest {
        title: title.into(),
        description: format!("{} description", title),
        category: "wellness".into(),
        rarity: "common".into(),
        difficulty: 1,
        price,
        reward_xp: 50,
        reward_coin: 5,
        time_limit_hours: 24,
        is_sequential: sequential,
        tasks: (1..=tasks)
            .map(|order| NewTask {
                order,
                title: format!("{} step {}", title, order),
                base_xp_reward: task_xp,
                base_coin_reward: 1,
                ..NewTask::default()
            })
            .collect(),
    }
}

/// In-process recommendation service.
#[derive(Default)]
pub struct MockRecommendations {
    requests: Mutex<Vec<AddUsersRequest>>,
    fail: AtomicBool,
}

impl MockRecommendations {
    pub fn failing() -> Self {
        Self {
            fail: AtomicBool::new(true),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<AddUsersRequest> {
        self.requests.lock().clone()
    }

    /// Wait until at least `count` requests arrived, or panic after 2s.
    pub async fn wait_for(&self, count: usize) -> Vec<AddUsersRequest> {
        for _ in 0..200 {
            if self.requests.lock().len() >= count {
                return self.requests();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!(
            "expected {} recommendation request(s), got {}",
            count,
            self.requests.lock().len()
        );
    }
}

#[async_trait]
impl RecommendationClient for MockRecommendations {
    async fn add_users(&self, request: &AddUsersRequest) -> Result<(), RecommendationError> {
        self.requests.lock().push(request.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(RecommendationError::Status {
                status: 500,
                body: "recommendation model unavailable".into(),
            });
        }
        Ok(())
    }
}

/// Minimal HTTP server that answers every request with `200 OK` and keeps
/// the request bodies.
pub struct MockHttpServer {
    pub base_url: String,
    bodies: Arc<Mutex<Vec<String>>>,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let base_url = format!("http://{}/api", listener.local_addr().expect("addr"));
        let bodies = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&bodies);
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let sink = Arc::clone(&sink);
                tokio::spawn(async move {
                    let mut raw = Vec::new();
                    let mut buf = [0u8; 4096];
                    while let Ok(n) = socket.read(&mut buf).await {
                        raw.extend_from_slice(&buf[..n]);
                        if n == 0 || body_of(&raw).is_some() {
                            break;
                        }
                    }
                    if let Some(body) = body_of(&raw) {
                        sink.lock().push(body);
                    }
                    let _ = socket
                        .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\nconnection: close\r\n\r\n")
                        .await;
                });
            }
        });

        Self { base_url, bodies }
    }

    pub async fn wait_for(&self, count: usize) -> Vec<String> {
        for _ in 0..200 {
            if self.bodies.lock().len() >= count {
                return self.bodies.lock().clone();
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("expected {} HTTP request(s)", count);
    }
}

/// The body of a complete request, once all `content-length` bytes arrived.
fn body_of(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let header_end = text.find("\r\n\r\n")?;
    let length = text[..header_end]
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().ok())
                .flatten()
        })
        .unwrap_or(0);
    let body_start = header_end + 4;
    (raw.len() >= body_start + length)
        .then(|| String::from_utf8_lossy(&raw[body_start..body_start + length]).into_owned())
}
