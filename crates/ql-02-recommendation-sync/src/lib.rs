//! # Recommendation Sync
//!
//! **Crate ID:** 02
//!
//! Keeps the external recommendation service informed of which quests each
//! user owns. After every committed purchase the progression engine emits a
//! `QuestPurchased` event carrying the buyer's full list of owned quest ids;
//! this crate turns it into one HTTP call.
//!
//! ```text
//! ql-01 ──QuestPurchased──→ [Event Bus] ──→ RecommendationSyncHandler
//!                                                 │
//!                                                 │ POST {base_url}/users/add
//!                                                 ▼
//!                                       recommendation service
//! ```
//!
//! Delivery is best-effort: a failed call is logged and counted, never
//! retried, and never reaches the purchase that triggered it.

pub mod adapters;
pub mod domain;
pub mod handler;
pub mod ports;

pub use adapters::http::{HttpRecommendationClient, DEFAULT_BASE_URL};
pub use domain::errors::RecommendationError;
pub use domain::payloads::{AddUsersRequest, UserQuestIds};
pub use handler::RecommendationSyncHandler;
pub use ports::outbound::RecommendationClient;
