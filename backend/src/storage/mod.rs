//! Persistence for bean, note and settings records

pub mod change_feed;
pub mod record_store;

pub use change_feed::ChangeFeed;
pub use record_store::{RecordStore, BEANS_KEY, NOTES_KEY, SETTINGS_KEY};
