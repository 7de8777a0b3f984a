//! HTTP handlers

pub mod beans;
pub mod blogger;
pub mod data;
pub mod events;
pub mod health;
pub mod notes;
pub mod settings;
pub mod statistics;

pub use beans::*;
pub use blogger::*;
pub use data::*;
pub use events::*;
pub use health::*;
pub use notes::*;
pub use settings::*;
pub use statistics::*;
