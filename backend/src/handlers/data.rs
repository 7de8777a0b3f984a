//! HTTP handlers for whole-store backup and reset

use std::collections::BTreeMap;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::Value;

use crate::error::AppResult;
use crate::AppState;

/// Download every stored record
pub async fn export_backup(
    State(state): State<AppState>,
) -> AppResult<Json<BTreeMap<String, Value>>> {
    let backup = state.records.backup().await?;
    Ok(Json(backup))
}

/// Overwrite records from a backup
pub async fn import_backup(
    State(state): State<AppState>,
    Json(backup): Json<BTreeMap<String, Value>>,
) -> AppResult<StatusCode> {
    state.records.restore(backup).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete all beans, notes and settings
pub async fn clear_data(State(state): State<AppState>) -> AppResult<StatusCode> {
    state.records.reset().await?;
    Ok(StatusCode::NO_CONTENT)
}
