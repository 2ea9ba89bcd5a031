//! Builder for configuring prediction clients

use std::time::Duration;

use reqwest::Client;

use super::http::PredictionClient;
use crate::config::ApiConfig;
use crate::session::SessionStore;
use crate::{NutriscopeError, Result};

/// Default service base URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Default blanket request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder for configuring [`PredictionClient`] instances.
#[derive(Default)]
pub struct PredictionClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    session: Option<SessionStore>,
}

impl PredictionClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the builder from an `[api]` config section.
    pub fn from_config(api: &ApiConfig) -> Self {
        Self::new().base_url(&api.base_url).timeout(api.timeout())
    }

    /// Service base URL, e.g. `http://localhost:8000`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Ceiling applied to every request.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Session supplying the bearer token; signed out on `401`.
    pub fn session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn build(self) -> Result<PredictionClient> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(NutriscopeError::Configuration(format!(
                "base URL must start with http:// or https://, got {base_url:?}"
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(NutriscopeError::Configuration(
                "request timeout must be greater than zero".to_string(),
            ));
        }

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nutriscope/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                NutriscopeError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(PredictionClient {
            http,
            base_url,
            session: self.session,
        })
    }
}
