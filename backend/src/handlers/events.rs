//! Server-sent events for storage changes

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;

use crate::AppState;

/// Stream a `storage-change` event after every write
pub async fn storage_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.feed.sse()
}
