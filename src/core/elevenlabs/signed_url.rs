//! Signed conversation URLs for private agents.
//!
//! The API key stays on the server; clients connect with a short-lived URL
//! that embeds a conversation signature.

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, error};

use super::config::url_encode;

#[derive(Debug, thiserror::Error)]
pub enum SignedUrlError {
    #[error("ElevenLabs API key is not configured")]
    MissingApiKey,
    #[error("Agent id is required")]
    MissingAgentId,
    #[error("ElevenLabs returned {status}: {message}")]
    Upstream { status: StatusCode, message: String },
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct SignedUrlResponse {
    signed_url: String,
}

/// Fetch a signed WebSocket URL for `agent_id`.
pub async fn fetch_signed_url(
    client: &Client,
    api_base_url: &str,
    api_key: &str,
    agent_id: &str,
) -> Result<String, SignedUrlError> {
    if api_key.is_empty() {
        return Err(SignedUrlError::MissingApiKey);
    }
    if agent_id.trim().is_empty() {
        return Err(SignedUrlError::MissingAgentId);
    }

    let url = format!(
        "{}/v1/convai/conversation/get_signed_url?agent_id={}",
        api_base_url.trim_end_matches('/'),
        url_encode(agent_id)
    );
    debug!("Requesting signed URL for agent {}", agent_id);

    let response = client
        .get(&url)
        .header("xi-api-key", api_key)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        error!("Signed URL request failed with {}: {}", status, message);
        return Err(SignedUrlError::Upstream { status, message });
    }

    let body: SignedUrlResponse = response.json().await?;
    Ok(body.signed_url)
}
