//! HTTP handlers for user settings

use axum::{extract::State, Json};
use shared::Settings;

use crate::error::AppResult;
use crate::services::SettingsService;
use crate::AppState;

/// Current settings
pub async fn get_settings(State(state): State<AppState>) -> Json<Settings> {
    let service = SettingsService::new(state.records);
    Json(service.get().await)
}

/// Replace settings; missing fields fall back to defaults
pub async fn update_settings(
    State(state): State<AppState>,
    Json(input): Json<Settings>,
) -> AppResult<Json<Settings>> {
    let service = SettingsService::new(state.records);
    let settings = service.update(input).await?;
    Ok(Json(settings))
}
