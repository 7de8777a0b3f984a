//! User preference models

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DayCountMode, Language};

/// User preferences stored as one JSON blob.
///
/// Every field has a default so partial or older blobs still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub username: String,
    pub language: Language,
    /// Preset grams offered by the quick-decrement action
    pub decrement_presets: Vec<Decimal>,
    pub day_count_mode: DayCountMode,
    /// Leave depleted beans out of the statistics view
    pub exclude_empty_from_stats: bool,
    pub show_flavor_period: bool,
    pub show_only_bean_name: bool,
    pub show_ratings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            username: String::new(),
            language: Language::Chinese,
            decrement_presets: vec![Decimal::from(15), Decimal::from(16), Decimal::from(18)],
            day_count_mode: DayCountMode::CoffeeDay,
            exclude_empty_from_stats: false,
            show_flavor_period: true,
            show_only_bean_name: false,
            show_ratings: true,
        }
    }
}
