//! # Outbound Ports

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::RecommendationError;
use crate::domain::payloads::AddUsersRequest;

/// Client of the recommendation service.
#[async_trait]
pub trait RecommendationClient: Send + Sync {
    /// Register (or refresh) the owned quest ids of the given users.
    async fn add_users(&self, request: &AddUsersRequest) -> Result<(), RecommendationError>;
}

#[async_trait]
impl<C: RecommendationClient + ?Sized> RecommendationClient for Arc<C> {
    async fn add_users(&self, request: &AddUsersRequest) -> Result<(), RecommendationError> {
        (**self).add_users(request).await
    }
}
