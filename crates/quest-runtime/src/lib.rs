//! # Questline Runtime
//!
//! Entry point library of the Questline backend. Builds the subsystem
//! container from configuration, seeds the quest catalog and runs the
//! background handlers.
//!
//! ## Subsystems
//!
//! | ID | Crate | Role |
//! |----|-------|------|
//! | 01 | `ql-01-progression` | Purchase, start, task/quest completion, shared quests |
//! | 02 | `ql-02-recommendation-sync` | Forwards owned quest ids after each purchase |
//!
//! ## Configuration
//!
//! See [`container::config::RuntimeConfig`]. Set `QL_CONFIG` to a TOML file
//! and override single values with `QL_*` variables.

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod adapters;
pub mod container;
pub mod runtime;
pub mod seed;

pub use container::{ConfigError, RuntimeConfig, SubsystemContainer};
pub use runtime::{QuestRuntime, RuntimeError};
