use axum::{
    extract::{OriginalUri, State},
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use crate::errors::AppError;
use crate::state::AppState;

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    tracing::debug!("Health check");
    let now = Utc::now();

    Json(json!({
        "status": "OK",
        "message": "Servidor funcionando",
        "timestamp": now.to_rfc3339(),
        "uptime": (now - state.started_at).num_seconds(),
        "storage": state.repo.backend_name(),
    }))
}

pub async fn api_not_found(OriginalUri(uri): OriginalUri) -> AppError {
    tracing::warn!("Unknown API route: {}", uri.path());
    AppError::not_found(format!("Ruta API no encontrada: {}", uri.path()))
}
