//! Change notifications for the record store
//!
//! Every write publishes the key that changed. Subscribers re-read the whole
//! record; no payload or diff travels with the notification.

use std::convert::Infallible;
use std::time::Duration;

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

/// SSE event name for storage changes
pub const STORAGE_CHANGE_EVENT: &str = "storage-change";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageChange {
    pub key: String,
}

/// Fan-out of storage changes to every open view
#[derive(Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<StorageChange>,
}

impl ChangeFeed {
    /// `capacity` is the number of notifications buffered per subscriber
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        info!("Change feed initialized with capacity {}", capacity);
        Self { tx }
    }

    /// Announce a change, ignoring the case where nobody listens
    pub fn publish(&self, key: &str) {
        let change = StorageChange {
            key: key.to_string(),
        };
        if let Ok(count) = self.tx.send(change) {
            debug!("Storage change '{}' sent to {} subscribers", key, count);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stream of SSE events for one client
    pub fn event_stream(&self) -> impl Stream<Item = Result<Event, Infallible>> {
        BroadcastStream::new(self.subscribe()).filter_map(|result| async move {
            match result {
                Ok(change) => Event::default()
                    .event(STORAGE_CHANGE_EVENT)
                    .json_data(&change)
                    .ok()
                    .map(Ok),
                Err(e) => {
                    // Lagged receivers skip ahead; clients re-read anyway
                    warn!("Change feed client error: {:?}", e);
                    None
                }
            }
        })
    }

    /// SSE response for `GET /events`
    pub fn sse(&self) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
        info!(
            "New change feed client connected, total clients: {}",
            self.subscriber_count() + 1
        );
        Sse::new(self.event_stream()).keep_alive(
            KeepAlive::new()
                .interval(Duration::from_secs(15))
                .text("keep-alive"),
        )
    }
}
