use axum::response::Json;
use serde_json::{json, Value};
use tracing::instrument;

/// Root endpoint handler, doubles as the liveness probe
#[instrument(name = "health_check")]
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "message": "GET request successful !"
    }))
}
