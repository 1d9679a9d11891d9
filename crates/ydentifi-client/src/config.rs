//! Client configuration

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Path of the challenge endpoint, relative to `api_base_url`
pub const DEFAULT_CHALLENGE_PATH: &str = "/server-challenge";
/// Challenge fetch timeout in milliseconds
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Where the API lives and who is calling it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Unique app ID issued by the service; the `RequestorId` of API tokens
    pub client_app_id: String,
    /// Scheme and host of the API, e.g. `https://ydentifi.example.com`
    pub api_base_url: String,
    #[serde(default = "default_challenge_path")]
    pub challenge_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_challenge_path() -> String {
    DEFAULT_CHALLENGE_PATH.to_string()
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

impl ClientConfig {
    pub fn new(client_app_id: impl Into<String>, api_base_url: impl Into<String>) -> Self {
        Self {
            client_app_id: client_app_id.into(),
            api_base_url: api_base_url.into(),
            challenge_path: default_challenge_path(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_challenge_path(mut self, path: impl Into<String>) -> Self {
        self.challenge_path = path.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Full URL of the challenge endpoint
    pub fn challenge_url(&self) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            self.challenge_path.trim_start_matches('/')
        )
    }
}
