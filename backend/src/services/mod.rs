//! Business logic services for the coffee tracker

pub mod beans;
pub mod blogger;
pub mod export;
pub mod notes;
pub mod records;
pub mod settings;
pub mod statistics;

pub use beans::BeanService;
pub use blogger::BloggerService;
pub use notes::NoteService;
pub use records::Records;
pub use settings::SettingsService;
pub use statistics::StatisticsService;

use chrono::{FixedOffset, NaiveDate, Utc};

use crate::error::{AppError, AppResult};

/// Current time in epoch milliseconds
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's calendar date at the given offset
pub fn local_today(offset: FixedOffset) -> NaiveDate {
    Utc::now().with_timezone(&offset).date_naive()
}

/// Offset from a configured number of minutes east of UTC
pub fn utc_offset(minutes: i32) -> AppResult<FixedOffset> {
    minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            AppError::Configuration(format!("UTC offset out of range: {} minutes", minutes))
        })
}
