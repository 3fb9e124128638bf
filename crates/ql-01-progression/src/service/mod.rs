//! # Progression Service
//!
//! Implements `ProgressionApi` on top of the outbound ports.
//!
//! ## Architecture
//!
//! Every mutating call:
//! 1. Opens one store transaction and wraps it in a `UnitOfWork`
//! 2. Runs the rule checks and staged writes of the operation
//! 3. Commits, or drops the transaction on the first error
//! 4. Publishes the buffered events only after the commit succeeded

mod api;
mod engine;
mod ledger;
mod shared;

use quest_telemetry::metrics::{
    HistogramTimer, COINS_SPENT, LEVEL_UPS, OPERATION_DURATION, OPERATION_FAILURES,
    QUESTS_COMPLETED, QUESTS_PURCHASED, TASKS_COMPLETED,
};
use serde::{Deserialize, Serialize};
use shared_bus::ProgressionEvent;
use tracing::{debug, warn};

use crate::domain::ProgressionError;
use crate::ports::outbound::{
    FriendshipProvider, ProgressionEventSink, QuestStore, StoreTransaction, TimeSource,
};
use engine::UnitOfWork;

/// Rule switches of the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionConfig {
    /// Tasks of a sequential quest must be completed in ascending order.
    pub enforce_sequential: bool,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            enforce_sequential: true,
        }
    }
}

/// Dependencies for ProgressionService
pub struct ProgressionDependencies<S, F, T, P> {
    pub store: S,
    pub friendships: F,
    pub time_source: T,
    pub events: P,
}

/// The quest progression engine.
pub struct ProgressionService<S, F, T, P>
where
    S: QuestStore,
    F: FriendshipProvider,
    T: TimeSource,
    P: ProgressionEventSink,
{
    pub(crate) store: S,
    pub(crate) friendships: F,
    pub(crate) time_source: T,
    pub(crate) events: P,
    pub(crate) config: ProgressionConfig,
}

impl<S, F, T, P> ProgressionService<S, F, T, P>
where
    S: QuestStore,
    F: FriendshipProvider,
    T: TimeSource,
    P: ProgressionEventSink,
{
    pub fn new(deps: ProgressionDependencies<S, F, T, P>, config: ProgressionConfig) -> Self {
        Self {
            store: deps.store,
            friendships: deps.friendships,
            time_source: deps.time_source,
            events: deps.events,
            config,
        }
    }

    pub fn config(&self) -> &ProgressionConfig {
        &self.config
    }

    /// Run `op` as one unit of work, then publish its events.
    fn run<R>(
        &self,
        operation: &'static str,
        op: impl FnOnce(&mut UnitOfWork<'_>) -> Result<R, ProgressionError>,
    ) -> Result<R, ProgressionError> {
        let _timer = HistogramTimer::labelled(&OPERATION_DURATION, &[operation]);

        let result = self.execute(op);
        if let Err(err) = &result {
            record_failure(operation, err);
        }
        result
    }

    fn execute<R>(
        &self,
        op: impl FnOnce(&mut UnitOfWork<'_>) -> Result<R, ProgressionError>,
    ) -> Result<R, ProgressionError> {
        let tx = self.store.begin()?;
        let mut uow = UnitOfWork::new(tx, self.time_source.now(), &self.config);
        let value = op(&mut uow)?;
        let outbox = uow.commit()?;

        for event in outbox {
            record_event(&event);
            self.events.publish(event);
        }
        Ok(value)
    }

    /// Read inside a transaction that is never committed.
    fn read<R>(
        &self,
        op: impl FnOnce(&mut dyn StoreTransaction) -> Result<R, ProgressionError>,
    ) -> Result<R, ProgressionError> {
        let mut tx = self.store.begin()?;
        op(tx.as_mut())
    }
}

fn record_failure(operation: &'static str, err: &ProgressionError) {
    OPERATION_FAILURES
        .with_label_values(&[operation, err.kind()])
        .inc();

    if err.is_infrastructure() {
        warn!(operation, error = %err, "[ql-01] Operation failed");
    } else {
        debug!(operation, error = %err, "[ql-01] Operation rejected");
    }
}

/// Count committed state changes.
fn record_event(event: &ProgressionEvent) {
    match event {
        ProgressionEvent::QuestPurchased { price, .. } => {
            QUESTS_PURCHASED.inc();
            COINS_SPENT.inc_by(*price as f64);
        }
        ProgressionEvent::TaskCompleted { .. } => TASKS_COMPLETED.inc(),
        ProgressionEvent::QuestCompleted {
            shared_quest_id, ..
        } => {
            let kind = if shared_quest_id.is_some() {
                "shared"
            } else {
                "solo"
            };
            QUESTS_COMPLETED.with_label_values(&[kind]).inc();
        }
        ProgressionEvent::LevelUp { .. } => LEVEL_UPS.inc(),
        ProgressionEvent::QuestStarted { .. }
        | ProgressionEvent::SharedQuestCreated { .. }
        | ProgressionEvent::SharedQuestCompleted { .. } => {}
    }
}
