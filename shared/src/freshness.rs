//! Freshness phase derivation from roast date and flavor window

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{Bean, FlavorWindow, RoastLevel, StorageState};

/// Default peak window for light roasts (days after roasting)
pub const LIGHT_ROAST_WINDOW: (i64, i64) = (7, 30);
/// Default peak window for medium roasts and unknown levels
pub const MEDIUM_ROAST_WINDOW: (i64, i64) = (10, 30);
/// Default peak window for dark roasts
pub const DARK_ROAST_WINDOW: (i64, i64) = (14, 60);

/// Where a bean sits in its flavor life
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FreshnessPhase {
    InTransit,
    Frozen,
    /// Resting before the peak window
    Aging,
    /// Inside the peak window
    Peak,
    /// Past the peak window
    Declining,
    /// No roast date
    Unknown,
}

impl FreshnessPhase {
    pub const ALL: [FreshnessPhase; 6] = [
        FreshnessPhase::InTransit,
        FreshnessPhase::Frozen,
        FreshnessPhase::Aging,
        FreshnessPhase::Peak,
        FreshnessPhase::Declining,
        FreshnessPhase::Unknown,
    ];

    /// Primary key for freshness sorting; frozen and peak share a rank and
    /// unknown ranks with declining
    pub fn sort_rank(&self) -> i8 {
        match self {
            FreshnessPhase::InTransit => -1,
            FreshnessPhase::Frozen | FreshnessPhase::Peak => 0,
            FreshnessPhase::Aging => 1,
            FreshnessPhase::Declining | FreshnessPhase::Unknown => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FreshnessPhase::InTransit => "in_transit",
            FreshnessPhase::Frozen => "frozen",
            FreshnessPhase::Aging => "aging",
            FreshnessPhase::Peak => "peak",
            FreshnessPhase::Declining => "declining",
            FreshnessPhase::Unknown => "unknown",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        let key = raw.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|p| p.as_str() == key)
    }
}

impl std::fmt::Display for FreshnessPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FreshnessPhase::InTransit => write!(f, "In Transit"),
            FreshnessPhase::Frozen => write!(f, "Frozen"),
            FreshnessPhase::Aging => write!(f, "Aging"),
            FreshnessPhase::Peak => write!(f, "Peak"),
            FreshnessPhase::Declining => write!(f, "Declining"),
            FreshnessPhase::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Result of the freshness computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Freshness {
    pub phase: FreshnessPhase,
    /// Days until the next phase boundary; 0 outside aging/peak
    pub remaining_days: i64,
    pub days_since_roast: Option<i64>,
}

impl Freshness {
    fn fixed(phase: FreshnessPhase) -> Self {
        Self {
            phase,
            remaining_days: 0,
            days_since_roast: None,
        }
    }
}

/// Default peak window for a roast level
pub fn default_window(roast_level: Option<RoastLevel>) -> (i64, i64) {
    match roast_level {
        Some(level) if level.is_light_family() => LIGHT_ROAST_WINDOW,
        Some(level) if level.is_dark_family() => DARK_ROAST_WINDOW,
        _ => MEDIUM_ROAST_WINDOW,
    }
}

/// Effective (start, end) window for a bean
pub fn resolve_window(bean: &Bean) -> (i64, i64) {
    match bean.flavor_window {
        FlavorWindow::Default => default_window(bean.roast_level),
        FlavorWindow::Custom { start_day, end_day } => (start_day, end_day),
    }
}

/// Whole calendar days between the roast date and today.
///
/// Negative when the roast date lies in the future.
pub fn days_since_roast(roast_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - roast_date).num_days()
}

/// Classify a bean's freshness on `today`
pub fn calculate_freshness(bean: &Bean, today: NaiveDate) -> Freshness {
    match bean.storage {
        StorageState::InTransit => return Freshness::fixed(FreshnessPhase::InTransit),
        StorageState::Frozen => return Freshness::fixed(FreshnessPhase::Frozen),
        StorageState::Normal => {}
    }

    let Some(roast_date) = bean.roast_date else {
        return Freshness::fixed(FreshnessPhase::Unknown);
    };

    let days = days_since_roast(roast_date, today);
    let (start_day, end_day) = resolve_window(bean);

    let (phase, remaining_days) = if days < start_day {
        (FreshnessPhase::Aging, start_day - days)
    } else if days <= end_day {
        (FreshnessPhase::Peak, end_day - days)
    } else {
        (FreshnessPhase::Declining, 0)
    };

    Freshness {
        phase,
        remaining_days,
        days_since_roast: Some(days),
    }
}
