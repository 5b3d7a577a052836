use std::sync::Arc;

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::AppState;

/// # GET /v1/healthcheck
pub async fn healthcheck(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "available",
        "system_info": {
            "environment": state.environment,
            "version": state.version,
        },
    }))
}
