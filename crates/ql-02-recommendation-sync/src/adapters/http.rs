//! HTTP client for the recommendation service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::domain::errors::RecommendationError;
use crate::domain::payloads::AddUsersRequest;
use crate::ports::outbound::RecommendationClient;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";

/// Posts user quest lists to `{base_url}/users/add`.
pub struct HttpRecommendationClient {
    client: Client,
    base_url: String,
}

impl HttpRecommendationClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, RecommendationError> {
        Self::with_timeout(base_url, Duration::from_secs(5))
    }

    pub fn with_timeout(
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RecommendationError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(2))
            .build()
            .map_err(RecommendationError::Http)?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn add_users_url(&self) -> String {
        format!("{}/users/add", self.base_url)
    }
}

#[async_trait]
impl RecommendationClient for HttpRecommendationClient {
    async fn add_users(&self, request: &AddUsersRequest) -> Result<(), RecommendationError> {
        let url = self.add_users_url();
        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    RecommendationError::Connection(format!("Cannot connect to {}", url))
                } else {
                    RecommendationError::Http(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RecommendationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        debug!(url = %url, users = request.users.len(), "Recommendation service updated");
        Ok(())
    }
}
