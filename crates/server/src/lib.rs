//! Live match server: session registry, per-match sessions and the WebSocket
//! gateway in front of them.

pub mod auth;
pub mod config;
pub mod error;
pub mod protocol;
pub mod registry;
pub mod routes;
pub mod session;

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::config::Config;
use crate::registry::SessionRegistry;

/// Serve the match API on an already-bound listener until the process stops.
pub async fn serve(listener: TcpListener, config: Config) -> std::io::Result<()> {
    let registry = Arc::new(SessionRegistry::new(config.reclaim_empty_matches));
    axum::serve(listener, routes::router(config, registry)).await
}
