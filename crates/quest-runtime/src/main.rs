//! # Questline Runtime
//!
//! The main entry point for the Questline backend.
//!
//! ## Startup
//!
//! 1. Initialize telemetry (logging, metrics)
//! 2. Load configuration from `QL_CONFIG` and `QL_*` variables
//! 3. Build the subsystem container
//! 4. Seed the catalog and spawn the recommendation sync
//! 5. Run until Ctrl+C, then shut down gracefully

use anyhow::{Context, Result};
use quest_runtime::{QuestRuntime, RuntimeConfig};
use quest_telemetry::{init_telemetry, TelemetryConfig};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry = init_telemetry(&TelemetryConfig::from_env())
        .context("Failed to initialize telemetry")?;

    info!("===========================================");
    info!("  Questline v{}", env!("CARGO_PKG_VERSION"));
    info!("===========================================");

    let config = RuntimeConfig::load().context("Failed to load configuration")?;
    let runtime = QuestRuntime::new(config).context("Failed to build runtime")?;
    runtime.start().await.context("Failed to start runtime")?;

    info!("Questline is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;

    runtime.shutdown().await;
    Ok(())
}
