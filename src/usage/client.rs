//! Authenticated fetch against the OAuth usage endpoint

use std::time::Duration;

use async_trait::async_trait;

use super::response::UsageResponse;
use super::UsageSnapshot;
use crate::credentials::Credential;
use crate::error::UsageError;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const USAGE_PATH: &str = "/api/oauth/usage";
const BETA_HEADER: &str = "anthropic-beta";
const BETA_VALUE: &str = "oauth-2025-04-20";
const FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Seam between the service and the HTTP layer.
#[async_trait]
pub trait UsageFetcher: Send + Sync {
    async fn fetch(&self, credential: &Credential) -> Result<UsageSnapshot, UsageError>;
}

/// [`UsageFetcher`] over the real endpoint.
pub struct UsageClient {
    client: reqwest::Client,
    base_url: String,
}

impl UsageClient {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    /// Client pointed at an alternate host, for tests.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

impl Default for UsageClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UsageFetcher for UsageClient {
    async fn fetch(&self, credential: &Credential) -> Result<UsageSnapshot, UsageError> {
        tracing::debug!("fetching usage");

        let response = self
            .client
            .get(format!("{}{}", self.base_url, USAGE_PATH))
            .header("Authorization", format!("Bearer {}", credential.token()))
            .header("Accept", "application/json")
            .header(BETA_HEADER, BETA_VALUE)
            .header(
                "User-Agent",
                concat!("claudebar/", env!("CARGO_PKG_VERSION")),
            )
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(UsageError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(transport_error)?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| UsageError::Decode(e.to_string()))?;
        let decoded = UsageResponse::from_value(value).map_err(UsageError::Decode)?;

        Ok(UsageSnapshot::from_response(decoded))
    }
}

fn transport_error(error: reqwest::Error) -> UsageError {
    if error.is_timeout() {
        UsageError::Transport(format!(
            "request timed out after {}s",
            FETCH_TIMEOUT.as_secs()
        ))
    } else {
        UsageError::Transport(error.to_string())
    }
}
