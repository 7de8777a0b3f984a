//! Bean ordering

use std::cmp::Ordering;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::freshness::{calculate_freshness, FreshnessPhase};
use crate::models::Bean;

/// Display orders offered for bean lists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Stored order
    #[default]
    Original,
    FreshnessAsc,
    FreshnessDesc,
    NameAsc,
    NameDesc,
    RatingAsc,
    RatingDesc,
    RemainingAsc,
    RemainingDesc,
    RoastDateAsc,
    RoastDateDesc,
    PricePerGramAsc,
    PricePerGramDesc,
    LastModifiedAsc,
    LastModifiedDesc,
}

impl SortKey {
    pub const ALL: [SortKey; 15] = [
        SortKey::Original,
        SortKey::FreshnessAsc,
        SortKey::FreshnessDesc,
        SortKey::NameAsc,
        SortKey::NameDesc,
        SortKey::RatingAsc,
        SortKey::RatingDesc,
        SortKey::RemainingAsc,
        SortKey::RemainingDesc,
        SortKey::RoastDateAsc,
        SortKey::RoastDateDesc,
        SortKey::PricePerGramAsc,
        SortKey::PricePerGramDesc,
        SortKey::LastModifiedAsc,
        SortKey::LastModifiedDesc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Original => "original",
            SortKey::FreshnessAsc => "freshness_asc",
            SortKey::FreshnessDesc => "freshness_desc",
            SortKey::NameAsc => "name_asc",
            SortKey::NameDesc => "name_desc",
            SortKey::RatingAsc => "rating_asc",
            SortKey::RatingDesc => "rating_desc",
            SortKey::RemainingAsc => "remaining_asc",
            SortKey::RemainingDesc => "remaining_desc",
            SortKey::RoastDateAsc => "roast_date_asc",
            SortKey::RoastDateDesc => "roast_date_desc",
            SortKey::PricePerGramAsc => "price_per_gram_asc",
            SortKey::PricePerGramDesc => "price_per_gram_desc",
            SortKey::LastModifiedAsc => "last_modified_asc",
            SortKey::LastModifiedDesc => "last_modified_desc",
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

/// Price per gram, 0 when price or capacity is missing or non-numeric
pub fn price_per_gram(bean: &Bean) -> Decimal {
    bean.unit_price().unwrap_or(Decimal::ZERO)
}

/// Case-insensitive name order, falling back to the exact text
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

/// Stable sorted copy of `beans`
pub fn sort_beans(beans: &[Bean], key: SortKey, today: NaiveDate) -> Vec<Bean> {
    let mut sorted = beans.to_vec();
    sort_beans_in_place(&mut sorted, key, today);
    sorted
}

/// Stable in-place sort
pub fn sort_beans_in_place(beans: &mut [Bean], key: SortKey, today: NaiveDate) {
    match key {
        SortKey::Original => {}
        SortKey::FreshnessAsc => beans.sort_by(|a, b| compare_freshness(a, b, today, false)),
        SortKey::FreshnessDesc => beans.sort_by(|a, b| compare_freshness(a, b, today, true)),
        SortKey::NameAsc => beans.sort_by(|a, b| compare_names(&a.name, &b.name)),
        SortKey::NameDesc => beans.sort_by(|a, b| compare_names(&b.name, &a.name)),
        SortKey::RatingAsc => beans.sort_by(|a, b| compare_rating(a, b)),
        SortKey::RatingDesc => beans.sort_by(|a, b| compare_rating(b, a)),
        SortKey::RemainingAsc => beans.sort_by_key(remaining),
        SortKey::RemainingDesc => beans.sort_by(|a, b| remaining(b).cmp(&remaining(a))),
        SortKey::RoastDateAsc => {
            beans.sort_by(|a, b| missing_last(a.roast_date, b.roast_date, Ordering::Less))
        }
        SortKey::RoastDateDesc => {
            beans.sort_by(|a, b| missing_last(a.roast_date, b.roast_date, Ordering::Greater))
        }
        SortKey::PricePerGramAsc => beans.sort_by_key(price_per_gram),
        SortKey::PricePerGramDesc => {
            beans.sort_by(|a, b| price_per_gram(b).cmp(&price_per_gram(a)))
        }
        SortKey::LastModifiedAsc => beans.sort_by_key(|b| b.timestamp),
        SortKey::LastModifiedDesc => beans.sort_by(|a, b| b.timestamp.cmp(&a.timestamp)),
    }
}

fn remaining(bean: &Bean) -> Decimal {
    bean.remaining_grams().unwrap_or(Decimal::ZERO)
}

fn compare_rating(a: &Bean, b: &Bean) -> Ordering {
    let a = a.overall_rating.unwrap_or(0.0);
    let b = b.overall_rating.unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Orders present values by `present_order` (Less = ascending), missing last
fn missing_last<T: Ord>(a: Option<T>, b: Option<T>, present_order: Ordering) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            if present_order == Ordering::Less {
                a.cmp(&b)
            } else {
                b.cmp(&a)
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Phase rank first; then days left inside aging/peak (soonest first when
/// ascending), or roast date among declining beans (newest first when
/// ascending). Descending keeps the phase order and flips the secondary key.
fn compare_freshness(a: &Bean, b: &Bean, today: NaiveDate, descending: bool) -> Ordering {
    let fa = calculate_freshness(a, today);
    let fb = calculate_freshness(b, today);

    let by_rank = fa.phase.sort_rank().cmp(&fb.phase.sort_rank());
    if by_rank != Ordering::Equal {
        return by_rank;
    }

    let secondary = match fa.phase {
        FreshnessPhase::Declining | FreshnessPhase::Unknown => {
            missing_last(a.roast_date, b.roast_date, Ordering::Greater)
        }
        _ => fa.remaining_days.cmp(&fb.remaining_days),
    };

    if descending {
        secondary.reverse()
    } else {
        secondary
    }
}
