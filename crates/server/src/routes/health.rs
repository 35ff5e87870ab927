use std::sync::Arc;

use axum::{Extension, Json};
use serde_json::{json, Value};

use crate::registry::SessionRegistry;

pub async fn health_check(Extension(registry): Extension<Arc<SessionRegistry>>) -> Json<Value> {
    let matches = registry.len().await;
    Json(json!({
        "status": "ok",
        "matches": matches,
    }))
}
