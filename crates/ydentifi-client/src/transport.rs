//! Fetching server challenges

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::wire::ServerChallenge;
use crate::{codec, ClientError};

/// Source of fresh server challenges
///
/// Each call must return a new challenge; challenges are single-use.
#[async_trait]
pub trait ChallengeTransport: Send + Sync {
    async fn fetch_challenge(&self) -> Result<ServerChallenge, ClientError>;
}

/// Fetches challenges from the service over HTTP
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(config: &ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ClientError::Transport {
                status: None,
                body: format!("http client setup: {e}"),
            })?;
        Ok(Self::with_client(client, config.challenge_url()))
    }

    /// Reuse an existing client (connection pool, proxies, TLS roots)
    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl ChallengeTransport for HttpTransport {
    async fn fetch_challenge(&self) -> Result<ServerChallenge, ClientError> {
        debug!(url = %self.url, "fetching server challenge");

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| ClientError::Transport {
                status: None,
                body: e.to_string(),
            })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| ClientError::Transport {
            status: Some(status.as_u16()),
            body: format!("reading response body: {e}"),
        })?;

        if !status.is_success() {
            let body = String::from_utf8_lossy(&body).into_owned();
            warn!(status = status.as_u16(), "challenge request rejected");
            return Err(ClientError::Transport {
                status: Some(status.as_u16()),
                body,
            });
        }

        let challenge: ServerChallenge = codec::from_slice(&body)?;
        if challenge.authorization_challenge.is_empty() {
            return Err(ClientError::Decode("empty authorization challenge".to_string()));
        }
        Ok(challenge)
    }
}
