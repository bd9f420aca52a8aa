//! Signed conversation URL endpoint
//!
//! Browser clients must not hold the ElevenLabs API key. They ask this
//! endpoint for a short-lived signed WebSocket URL instead.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::elevenlabs::{SignedUrlError, fetch_signed_url};
use crate::errors::AppResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct SignedUrlQuery {
    /// Falls back to the server's configured agent when omitted
    pub agent_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedUrlResponse {
    pub signed_url: String,
}

/// `GET /api/get-signed-url?agent_id=<optional>`
pub async fn get_signed_url(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SignedUrlQuery>,
) -> AppResult<Json<SignedUrlResponse>> {
    let config = &state.config;

    let api_key = config
        .elevenlabs_api_key
        .as_deref()
        .ok_or(SignedUrlError::MissingApiKey)?;
    let agent_id = config
        .resolve_agent_id(query.agent_id.as_deref())
        .ok_or(SignedUrlError::MissingAgentId)?;

    let signed_url = fetch_signed_url(
        &state.http_client,
        &config.elevenlabs_api_base_url,
        api_key,
        &agent_id,
    )
    .await?;

    info!("Issued signed conversation URL for agent {}", agent_id);
    Ok(Json(SignedUrlResponse { signed_url }))
}
