//! Shared models and derivations for the coffee tracker
//!
//! Everything here is pure: bean and note models, freshness phases,
//! consumption totals, the statistics snapshot and the list sort/filter
//! engine. The backend and the WASM bindings both build on this crate.

pub mod consumption;
pub mod filter;
pub mod freshness;
pub mod models;
pub mod sorting;
pub mod statistics;
pub mod types;
pub mod validation;

pub use consumption::*;
pub use filter::*;
pub use freshness::*;
pub use models::*;
pub use sorting::*;
pub use statistics::*;
pub use types::*;
pub use validation::*;
