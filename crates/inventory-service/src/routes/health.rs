//! Health and service identity endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::AppState;

/// GET /health
pub async fn check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({ "status": "healthy", "service": state.service_name }))
}

/// GET /
pub async fn root(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "service": state.service_name,
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}
