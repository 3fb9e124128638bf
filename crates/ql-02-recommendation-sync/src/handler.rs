//! # Recommendation Sync Handler
//!
//! Subscribes to purchase events and forwards each buyer's owned quest ids
//! to the recommendation service. Spawn [`RecommendationSyncHandler::run`]
//! as a background task; it stops when the shutdown signal flips or the bus
//! closes.

use quest_telemetry::metrics::{HistogramTimer, RECOMMENDATION_LATENCY, RECOMMENDATION_SYNCS};
use shared_bus::{EventFilter, EventTopic, InMemoryEventBus, Subscription};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::domain::payloads::AddUsersRequest;
use crate::ports::outbound::RecommendationClient;

pub struct RecommendationSyncHandler<C: RecommendationClient> {
    client: C,
    subscription: Subscription,
    shutdown: watch::Receiver<bool>,
}

impl<C: RecommendationClient> RecommendationSyncHandler<C> {
    /// Subscribe to the purchases topic of `bus`.
    pub fn new(client: C, bus: &InMemoryEventBus, shutdown: watch::Receiver<bool>) -> Self {
        let subscription = bus.subscribe(EventFilter::topics(vec![EventTopic::Purchases]));
        Self {
            client,
            subscription,
            shutdown,
        }
    }

    #[instrument(skip(self), name = "recommendation_sync")]
    pub async fn run(mut self) {
        info!("[ql-02] Recommendation sync started");

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        info!("[ql-02] Shutdown signal received");
                        break;
                    }
                }
                event = self.subscription.recv() => match event {
                    Some(event) => match AddUsersRequest::from_event(&event) {
                        Some(request) => {
                            self.sync(&request).await;
                        }
                        None => debug!(topic = ?event.topic(), "Ignoring event"),
                    },
                    None => {
                        warn!("[ql-02] Event bus closed, stopping");
                        break;
                    }
                },
            }
        }
    }

    /// Post one request. Returns whether the service accepted it.
    pub async fn sync(&self, request: &AddUsersRequest) -> bool {
        let _timer = HistogramTimer::new(&RECOMMENDATION_LATENCY);

        match self.client.add_users(request).await {
            Ok(()) => {
                RECOMMENDATION_SYNCS.with_label_values(&["ok"]).inc();
                debug!(users = request.users.len(), "Recommendation sync delivered");
                true
            }
            Err(err) => {
                RECOMMENDATION_SYNCS.with_label_values(&["failed"]).inc();
                for user in &request.users {
                    warn!(
                        user_id = %user.user_id,
                        quests = user.quest_ids.len(),
                        kind = err.kind(),
                        error = %err,
                        "Failed to sync quest ids to recommendation service"
                    );
                }
                false
            }
        }
    }
}
