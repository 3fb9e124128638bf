//! # Quest Runtime
//!
//! Lifecycle of the running service: build the container, seed the catalog,
//! spawn background handlers, and stop them on shutdown.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use ql_01_progression::{ProgressionApi, ProgressionError};
use ql_02_recommendation_sync::RecommendationSyncHandler;
use quest_telemetry::metrics::encode_metrics;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::container::subsystems::ContainerError;
use crate::container::{RuntimeConfig, SubsystemContainer};
use crate::seed::{CatalogFile, SeedError, SeedReport, Seeder};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Container(#[from] ContainerError),

    #[error(transparent)]
    Seed(#[from] SeedError),

    #[error("Store health check failed: {0}")]
    Health(#[source] ProgressionError),
}

/// The Questline runtime.
pub struct QuestRuntime {
    container: Arc<SubsystemContainer>,
    shutdown_tx: watch::Sender<bool>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl QuestRuntime {
    pub fn new(config: RuntimeConfig) -> Result<Self, RuntimeError> {
        let container = Arc::new(SubsystemContainer::new(config)?);
        let (shutdown_tx, _) = watch::channel(false);
        Ok(Self {
            container,
            shutdown_tx,
            tasks: Mutex::new(Vec::new()),
        })
    }

    pub fn container(&self) -> &Arc<SubsystemContainer> {
        &self.container
    }

    /// Seed the catalog, check the store and spawn the background handlers.
    ///
    /// Must be called from within a Tokio runtime.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        info!("Starting Questline runtime");

        if let Some(path) = &self.container.config.seed.catalog {
            self.seed(CatalogFile::load(path)?)?;
        }

        self.container
            .progression
            .health()
            .map_err(RuntimeError::Health)?;

        if let Some(client) = &self.container.recommendation {
            let handler = RecommendationSyncHandler::new(
                Arc::clone(client),
                &self.container.event_bus,
                self.shutdown_tx.subscribe(),
            );
            self.tasks.lock().push(tokio::spawn(handler.run()));
            info!("  [02] Recommendation sync handler spawned");
        }

        info!("Questline runtime started");
        Ok(())
    }

    pub fn seed(&self, catalog: CatalogFile) -> Result<SeedReport, SeedError> {
        Seeder::new(
            self.container.progression.as_ref(),
            &self.container.friendships,
        )
        .seed(catalog)
    }

    /// Signal every handler to stop and wait for them.
    pub async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        // No receivers just means nothing was spawned
        let _ = self.shutdown_tx.send(true);

        let tasks: Vec<JoinHandle<()>> = self.tasks.lock().drain(..).collect();
        for task in tasks {
            match tokio::time::timeout(SHUTDOWN_GRACE, task).await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => warn!(error = %err, "Background task failed"),
                Err(_) => warn!("Background task did not stop within the grace period"),
            }
        }

        match encode_metrics() {
            Ok(metrics) => debug!(%metrics, "Final metrics"),
            Err(err) => debug!(error = %err, "Metrics unavailable"),
        }
        info!("Shutdown complete");
    }
}
