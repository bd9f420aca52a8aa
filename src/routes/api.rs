use axum::{Router, routing::get};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{api, signed_url};
use crate::state::AppState;
use std::sync::Arc;

pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/get-signed-url", get(signed_url::get_signed_url))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Full application router: public health check plus the API routes.
pub fn create_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::health_check))
        .merge(create_api_router())
        .with_state(state)
}
