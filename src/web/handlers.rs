use axum::Json;
use serde_json::{Value, json};

/// Service banner; also used as a readiness probe.
pub async fn index() -> Json<Value> {
    Json(json!({
        "name": "pubtrack",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
