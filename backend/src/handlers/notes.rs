//! HTTP handlers for brewing notes

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use shared::BrewingNote;

use crate::error::AppResult;
use crate::services::notes::{NoteInput, NoteService};
use crate::AppState;

/// List notes, newest first
pub async fn list_notes(State(state): State<AppState>) -> Json<Vec<BrewingNote>> {
    let service = NoteService::new(state.records);
    Json(service.list().await)
}

/// Get a single note
pub async fn get_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<BrewingNote>> {
    let service = NoteService::new(state.records);
    let note = service.get(&id).await?;
    Ok(Json(note))
}

/// Log a brew
pub async fn create_note(
    State(state): State<AppState>,
    Json(input): Json<NoteInput>,
) -> AppResult<(StatusCode, Json<BrewingNote>)> {
    let service = NoteService::new(state.records);
    let note = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Edit a note
pub async fn update_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<NoteInput>,
) -> AppResult<Json<BrewingNote>> {
    let service = NoteService::new(state.records);
    let note = service.update(&id, input).await?;
    Ok(Json(note))
}

/// Delete a note
pub async fn delete_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<StatusCode> {
    let service = NoteService::new(state.records);
    service.delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
