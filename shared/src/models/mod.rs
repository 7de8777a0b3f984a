//! Domain models for the coffee tracker

mod bean;
mod brewing_note;
mod roast;
mod settings;

pub use bean::*;
pub use brewing_note::*;
pub use roast::*;
pub use settings::*;
