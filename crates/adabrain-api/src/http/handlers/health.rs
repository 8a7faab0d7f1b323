use axum::Json;
use axum::extract::State;

use crate::state::AppState;

/// GET /health - liveness probe with a little relay state (no auth required).
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "connections": state.relay.active_connections(),
        "model": state.relay.agent().model(),
    }))
}
