pub mod health;
pub mod match_ws;

use std::sync::Arc;

use axum::{routing::get, Extension, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::config::Config;
use crate::registry::SessionRegistry;

/// The full HTTP surface: health probe plus the match WebSocket.
pub fn router(config: Config, registry: Arc<SessionRegistry>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health_check))
        .route("/ws", get(match_ws::ws_handler))
        .layer(Extension(registry))
        .layer(Extension(config))
        .layer(cors)
}
