use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;

/// Application state that can be shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ServerConfig,
    /// Client for vendor REST calls (signed conversation URLs)
    pub http_client: reqwest::Client,
}

impl AppState {
    pub async fn new(config: ServerConfig) -> Arc<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build configured HTTP client, using defaults: {}", e);
                reqwest::Client::new()
            });

        Arc::new(Self {
            config,
            http_client,
        })
    }
}
