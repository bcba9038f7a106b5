//! # GET /health

use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::config::GatewayState;

/// GET /health — 死活監視。読み込み済みスキーマ数を返す。
pub async fn handle_health(State(state): State<Arc<GatewayState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "schemas": state.registry.len(),
    }))
}
