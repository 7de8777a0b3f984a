//! Common types used across the tracker

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Milliseconds in one day
pub const DAY_MS: i64 = 86_400_000;

lazy_static! {
    static ref LEADING_NUMBER: Regex = Regex::new(r"^\s*(-?\d+(?:\.\d+)?)").unwrap();
}

/// A decimal quantity (grams or money) parsed once from user input.
///
/// The original text is kept for display and so records round-trip through
/// storage unchanged. `value` is `None` when the text has no leading number.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Quantity {
    raw: String,
    value: Option<Decimal>,
}

impl Quantity {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let value = LEADING_NUMBER
            .captures(&raw)
            .and_then(|c| Decimal::from_str(&c[1]).ok());
        Self { raw, value }
    }

    pub fn from_decimal(value: Decimal) -> Self {
        let value = value.normalize();
        Self {
            raw: value.to_string(),
            value: Some(value),
        }
    }

    /// Original input text
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Parsed value, if the input was numeric
    pub fn value(&self) -> Option<Decimal> {
        self.value
    }

    /// Parsed value, or zero for missing/non-numeric input
    pub fn value_or_zero(&self) -> Decimal {
        self.value.unwrap_or(Decimal::ZERO)
    }

    pub fn is_numeric(&self) -> bool {
        self.value.is_some()
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<Decimal> for Quantity {
    fn from(value: Decimal) -> Self {
        Self::from_decimal(value)
    }
}

impl From<&str> for Quantity {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl Serialize for Quantity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Stored blobs carry both "200" and 200
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Text(s) => Quantity::parse(s),
            Wire::Number(n) => Quantity::parse(n.to_string()),
        })
    }
}

/// Supported languages for labels
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::Chinese => "zh",
            Language::English => "en",
        }
    }
}

/// Time range used for consumption queries
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeWindow {
    #[default]
    AllTime,
    Last7Days,
    Last30Days,
}

impl TimeWindow {
    /// Earliest timestamp (ms) included in the window
    pub fn cutoff_ms(&self, now_ms: i64) -> i64 {
        match self.natural_days() {
            Some(days) => now_ms - days * DAY_MS,
            None => 0,
        }
    }

    /// Fixed calendar length, `None` for all-time
    pub fn natural_days(&self) -> Option<i64> {
        match self {
            TimeWindow::AllTime => None,
            TimeWindow::Last7Days => Some(7),
            TimeWindow::Last30Days => Some(30),
        }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" | "all_time" => Ok(TimeWindow::AllTime),
            "week" | "7d" | "last_7_days" => Ok(TimeWindow::Last7Days),
            "month" | "30d" | "last_30_days" => Ok(TimeWindow::Last30Days),
            other => Err(format!("unknown time window: {other}")),
        }
    }
}

/// Divisor used when averaging consumption per day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DayCountMode {
    /// Calendar length of the window (or days since the first note)
    NaturalDay,
    /// Distinct dates with at least one qualifying note
    #[default]
    CoffeeDay,
}

impl FromStr for DayCountMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "natural" | "natural_day" => Ok(DayCountMode::NaturalDay),
            "coffee" | "coffee_day" => Ok(DayCountMode::CoffeeDay),
            other => Err(format!("unknown day count mode: {other}")),
        }
    }
}

/// Calendar date of a millisecond timestamp at the given UTC offset
pub fn local_date(timestamp_ms: i64, offset: FixedOffset) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|dt| dt.with_timezone(&offset).date_naive())
        .unwrap_or(NaiveDate::MIN)
}

/// Parse a stored roast date ("2024-05-01", optionally with a time part)
pub fn parse_calendar_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.date_naive())
        })
        .or_else(|| raw.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()))
}

/// Sum of decimals, skipping any addend that would overflow
pub fn sum_decimals(values: impl IntoIterator<Item = Decimal>) -> Decimal {
    values
        .into_iter()
        .fold(Decimal::ZERO, |acc, v| acc.checked_add(v).unwrap_or(acc))
}

/// Fresh opaque id for a new record
pub fn new_record_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
