//! Domain layer: pure progression rules with no I/O.

pub mod entities;
pub mod errors;
pub mod level;
pub mod state;
pub mod wallet;

pub use entities::*;
pub use errors::{IneligibleReason, ProgressionError};
pub use level::LevelCalculator;
pub use state::{check_task_eligibility, QuestInstance, QuestProgress};
pub use wallet::LevelChange;
