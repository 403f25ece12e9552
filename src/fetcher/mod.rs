use crate::config::ApiConfig;
use crate::models::ElectionResult;
use crate::models::api::{MalformedResults, ResultsResponse};
use async_trait::async_trait;
use log::{debug, info};
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("API answered with status {0}")]
    Status(StatusCode),
    #[error("malformed results body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("unusable results: {0}")]
    Malformed(#[from] MalformedResults),
}

/// Anything that can produce the current election result.
#[async_trait]
pub trait ResultsSource: Send + Sync {
    /// `Ok(None)` means the provider has no results yet.
    async fn fetch(&self) -> Result<Option<ElectionResult>, FetchError>;
}

pub struct ElectionClient {
    client: reqwest::Client,
    config: ApiConfig,
}

impl ElectionClient {
    pub fn new(config: ApiConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, config })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/results", self.config.url)
    }
}

#[async_trait]
impl ResultsSource for ElectionClient {
    async fn fetch(&self) -> Result<Option<ElectionResult>, FetchError> {
        let endpoint = self.endpoint();
        info!(
            "Fetching results for election {} ({}) from {}",
            self.config.election_id, self.config.stage, endpoint
        );

        let response = self
            .client
            .get(&endpoint)
            .query(&[
                ("election", self.config.election_id.as_str()),
                ("stage", self.config.stage.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        let body = response.bytes().await?;
        debug!("Received {} bytes of results", body.len());
        let parsed: ResultsResponse = serde_json::from_slice(&body)?;

        Ok(parsed.into_election_result(&self.config.election_id, &self.config.stage)?)
    }
}
