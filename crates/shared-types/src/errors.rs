//! # Error Types
//!
//! Errors raised while validating catalog data before it is registered.

use thiserror::Error;

/// A quest definition that cannot enter the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// Quest title is blank.
    #[error("Quest title must not be empty")]
    EmptyTitle,

    /// A quest needs at least one task to be completable.
    #[error("Quest '{title}' has no tasks")]
    NoTasks { title: String },

    /// Two task templates share the same order index.
    #[error("Duplicate task order {order} in quest '{title}'")]
    DuplicateTaskOrder { title: String, order: u32 },

    /// Time limit of zero hours would expire a quest the moment it starts.
    #[error("Quest '{title}' has a zero time limit")]
    ZeroTimeLimit { title: String },
}
