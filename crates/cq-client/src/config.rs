//! # Client Configuration
//!
//! Connection settings for [`HttpTransport`](crate::HttpTransport), read from
//! TOML:
//!
//! ```toml
//! base_url = "https://api.example.com"
//! app_id = "my-app"
//! app_key = "secret"
//! timeout_ms = 5000
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Service root, without the API version segment.
    pub base_url: String,
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub app_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Whole-request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_api_version() -> String {
    "1.1".into()
}
fn default_timeout_ms() -> u64 {
    15_000
}

/// Local development service with no credentials.
impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1337".into(),
            app_id: String::new(),
            app_key: String::new(),
            session_token: None,
            api_version: default_api_version(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl ClientConfig {
    pub fn new(
        base_url: impl Into<String>,
        app_id: impl Into<String>,
        app_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            app_id: app_id.into(),
            app_key: app_key.into(),
            ..Default::default()
        }
    }

    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Absolute URL for an endpoint such as `classes/Todo`.
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/{}/{}",
            self.base_url.trim_end_matches('/'),
            self.api_version,
            endpoint.trim_start_matches('/')
        )
    }
}
