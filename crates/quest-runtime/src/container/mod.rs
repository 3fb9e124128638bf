//! # Subsystem Container
//!
//! Central container holding the progression engine, its adapters and the
//! shared event bus.

pub mod config;
pub mod subsystems;

pub use config::{ConfigError, RuntimeConfig};
pub use subsystems::{ContainerError, ProgressionEngine, SubsystemContainer};
