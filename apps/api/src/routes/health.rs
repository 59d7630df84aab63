use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /
/// Liveness check. Does not touch the database.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "ok": true,
        "service": state.config.service_name
    }))
}
