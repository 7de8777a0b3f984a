//! Route definitions for the coffee tracker API

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::{handlers, AppState};

/// Create API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health_check))
        .nest("/beans", bean_routes())
        .nest("/notes", note_routes())
        .nest("/statistics", statistics_routes())
        .route(
            "/settings",
            get(handlers::get_settings).put(handlers::update_settings),
        )
        .route("/blogger/beans", get(handlers::list_blogger_beans))
        // Backup, restore and reset of the whole store
        .route(
            "/data",
            get(handlers::export_backup)
                .put(handlers::import_backup)
                .delete(handlers::clear_data),
        )
        // Storage change notifications (SSE)
        .route("/events", get(handlers::storage_events))
}

/// Bean inventory routes
fn bean_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_beans).post(handlers::create_bean))
        .route("/export", get(handlers::export_beans))
        .route("/filters", get(handlers::get_filter_options))
        .route(
            "/:id",
            get(handlers::get_bean)
                .put(handlers::update_bean)
                .delete(handlers::delete_bean),
        )
        .route("/:id/decrement", post(handlers::quick_decrement))
        .route("/:id/remaining", put(handlers::adjust_remaining))
}

/// Brewing note routes
fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_notes).post(handlers::create_note))
        .route(
            "/:id",
            get(handlers::get_note)
                .put(handlers::update_note)
                .delete(handlers::delete_note),
        )
}

/// Statistics routes
fn statistics_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_statistics))
        .route("/consumption", get(handlers::get_consumption))
        .route("/depletion", get(handlers::get_depletion))
}
