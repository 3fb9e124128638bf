//! # Subsystem Container
//!
//! Holds the subsystem instances and the adapters wired into them.
//!
//! ## Initialization Order
//!
//! ```text
//! Phase 1: Event bus
//! Phase 2: Quest store (memory or RocksDB), friendships
//! Phase 3: Progression engine (ql-01), publishing to the bus
//! Phase 4: Recommendation client (ql-02), if enabled
//! ```
//!
//! The recommendation handler itself is spawned by the runtime, since it
//! needs a Tokio context and the shutdown channel.

use std::sync::Arc;
use std::time::Duration;

use ql_01_progression::{
    BusEventSink, InMemoryFriendships, ProgressionDependencies, ProgressionService, QuestStore,
    StoreError, SystemTimeSource,
};
use ql_02_recommendation_sync::{HttpRecommendationClient, RecommendationError};
use shared_bus::InMemoryEventBus;
use thiserror::Error;
use tracing::{info, instrument};

use crate::adapters::storage::open_store;
use crate::container::config::{ConfigError, RuntimeConfig};

/// Concrete progression engine used by the runtime.
pub type ProgressionEngine = ProgressionService<
    Arc<dyn QuestStore>,
    Arc<InMemoryFriendships>,
    SystemTimeSource,
    BusEventSink,
>;

#[derive(Debug, Error)]
pub enum ContainerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to open quest store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to build recommendation client: {0}")]
    Recommendation(#[from] RecommendationError),
}

/// Central container holding all subsystem instances.
pub struct SubsystemContainer {
    /// Quest progression engine (Subsystem 1).
    pub progression: Arc<ProgressionEngine>,

    /// Recommendation client (Subsystem 2). `None` when disabled.
    pub recommendation: Option<Arc<HttpRecommendationClient>>,

    /// Committed rows.
    pub store: Arc<dyn QuestStore>,

    /// Friendship graph consulted by shared quests.
    pub friendships: Arc<InMemoryFriendships>,

    /// Event bus carrying committed progression events.
    pub event_bus: Arc<InMemoryEventBus>,

    /// Runtime configuration (immutable after initialization).
    pub config: RuntimeConfig,
}

impl SubsystemContainer {
    #[instrument(name = "subsystem_init", skip(config))]
    pub fn new(config: RuntimeConfig) -> Result<Self, ContainerError> {
        config.validate()?;
        info!("Initializing Questline subsystem container");

        info!("Phase 1: Creating event bus");
        let event_bus = Arc::new(InMemoryEventBus::with_capacity(config.bus.capacity));

        info!(backend = ?config.storage.backend, "Phase 2: Opening quest store");
        let store = open_store(&config.storage)?;
        let friendships = Arc::new(InMemoryFriendships::new());

        info!("Phase 3: Initializing progression engine");
        let progression = Arc::new(ProgressionService::new(
            ProgressionDependencies {
                store: Arc::clone(&store),
                friendships: Arc::clone(&friendships),
                time_source: SystemTimeSource,
                events: BusEventSink::new(Arc::clone(&event_bus)),
            },
            config.progression.clone(),
        ));
        info!(
            enforce_sequential = config.progression.enforce_sequential,
            "  [01] Progression initialized"
        );

        let recommendation = if config.recommendation.enabled {
            let client = HttpRecommendationClient::with_timeout(
                config.recommendation.base_url.clone(),
                Duration::from_secs(config.recommendation.timeout_secs),
            )?;
            info!(
                base_url = %client.base_url(),
                "  [02] Recommendation client initialized"
            );
            Some(Arc::new(client))
        } else {
            info!("  [02] Recommendation sync disabled");
            None
        };

        Ok(Self {
            progression,
            recommendation,
            store,
            friendships,
            event_bus,
            config,
        })
    }
}
