//! Handlers for `/health` and `/topics`.

use axum::Json;
use chrono::Utc;
use serde_json::{Value, json};
use tenet_core::topic::Topic;

/// `GET /health`
pub async fn health() -> Json<Value> {
  Json(json!({ "ok": true, "time": Utc::now() }))
}

/// `GET /topics`: the fixed topic list, in ledger order.
pub async fn topics() -> Json<Vec<Topic>> {
  Json(Topic::all().collect())
}
