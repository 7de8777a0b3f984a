//! Consumption aggregation over brewing notes
//!
//! Sums consumed grams and attributed cost for a bean, bean name, or bean
//! type within a time window. Capacity adjustments are inventory corrections
//! and never count as consumption; quick decrements always do.

use std::collections::BTreeSet;
use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Bean, BeanType, BrewingNote, NoteSource};
use crate::types::{local_date, DayCountMode, TimeWindow, DAY_MS};

lazy_static! {
    static ref FIRST_NUMBER: Regex = Regex::new(r"\d+(?:\.\d+)?").unwrap();
}

/// First decimal number in a free-text dose such as "15g" or "约 18.5 克"
pub fn parse_coffee_amount(text: &str) -> Option<Decimal> {
    FIRST_NUMBER
        .find(text)
        .and_then(|m| Decimal::from_str(m.as_str()).ok())
}

/// Grams consumed by a note, `None` when it is not consumption or has no
/// readable amount
pub fn note_amount(note: &BrewingNote) -> Option<Decimal> {
    match &note.source {
        NoteSource::QuickDecrement { amount } => amount.value(),
        NoteSource::OrdinaryBrew(brew) => brew.params.coffee.as_deref().and_then(parse_coffee_amount),
        NoteSource::CapacityAdjustment { .. } => None,
    }
}

/// Bean the note refers to: by id first, then by name
pub fn resolve_bean<'a>(note: &BrewingNote, beans: &'a [Bean]) -> Option<&'a Bean> {
    note.bean_id
        .as_deref()
        .and_then(|id| beans.iter().find(|b| b.id == id))
        .or_else(|| {
            note.bean_name()
                .and_then(|name| beans.iter().find(|b| b.name == name))
        })
}

/// Which notes a consumption query covers
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "by", content = "value", rename_all = "snake_case")]
pub enum BeanSelector {
    #[default]
    All,
    Id(String),
    Name(String),
    Type(BeanType),
}

impl BeanSelector {
    fn matches(&self, note: &BrewingNote, bean: Option<&Bean>) -> bool {
        match self {
            BeanSelector::All => true,
            BeanSelector::Id(id) => {
                note.bean_id.as_deref() == Some(id.as_str())
                    || bean.is_some_and(|b| &b.id == id)
            }
            BeanSelector::Name(name) => {
                note.bean_name() == Some(name.as_str()) || bean.is_some_and(|b| &b.name == name)
            }
            BeanSelector::Type(bean_type) => {
                bean.and_then(|b| b.bean_type) == Some(*bean_type)
            }
        }
    }
}

/// Parameters of a consumption query
#[derive(Debug, Clone)]
pub struct ConsumptionQuery {
    pub selector: BeanSelector,
    pub window: TimeWindow,
    pub now_ms: i64,
    /// Offset used to bucket notes into calendar days
    pub utc_offset: FixedOffset,
}

impl ConsumptionQuery {
    pub fn new(selector: BeanSelector, window: TimeWindow, now_ms: i64) -> Self {
        Self {
            selector,
            window,
            now_ms,
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }
}

/// Grams and cost for one bucket
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConsumptionTotals {
    pub grams: Decimal,
    pub cost: Decimal,
    pub note_count: usize,
}

impl ConsumptionTotals {
    /// Amounts that would overflow the running totals are left out
    fn add(&mut self, grams: Decimal, cost: Option<Decimal>) {
        let Some(total) = self.grams.checked_add(grams) else {
            return;
        };
        self.grams = total;
        if let Some(cost) = cost.and_then(|c| self.cost.checked_add(c)) {
            self.cost = cost;
        }
        self.note_count += 1;
    }
}

/// Aggregated consumption for a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionSummary {
    pub window: TimeWindow,
    pub now_ms: i64,
    pub total: ConsumptionTotals,
    pub espresso: ConsumptionTotals,
    pub filter: ConsumptionTotals,
    /// Notes whose bean is missing or has no type
    pub other: ConsumptionTotals,
    pub first_timestamp: Option<i64>,
    /// Calendar dates with at least one counted note
    pub coffee_days: BTreeSet<NaiveDate>,
}

impl ConsumptionSummary {
    /// Divisor for per-day averages, never below 1
    pub fn actual_days(&self, mode: DayCountMode) -> i64 {
        let days = match mode {
            DayCountMode::NaturalDay => match self.window.natural_days() {
                Some(days) => days,
                None => self
                    .first_timestamp
                    .map(|first| {
                        let elapsed = (self.now_ms - first).max(0);
                        (elapsed + DAY_MS - 1) / DAY_MS
                    })
                    .unwrap_or(1),
            },
            DayCountMode::CoffeeDay => self.coffee_days.len() as i64,
        };
        days.max(1)
    }

    /// Average grams per day
    pub fn daily_average(&self, mode: DayCountMode) -> Decimal {
        self.total.grams / Decimal::from(self.actual_days(mode))
    }

    /// Average cost per day
    pub fn daily_cost(&self, mode: DayCountMode) -> Decimal {
        self.total.cost / Decimal::from(self.actual_days(mode))
    }
}

/// Sum consumption of the notes selected by `query`.
///
/// Notes without a readable amount are skipped. Notes whose bean can no
/// longer be found still count toward grams but contribute no cost.
pub fn aggregate_consumption(
    notes: &[BrewingNote],
    beans: &[Bean],
    query: &ConsumptionQuery,
) -> ConsumptionSummary {
    let cutoff = query.window.cutoff_ms(query.now_ms);
    let mut summary = ConsumptionSummary {
        window: query.window,
        now_ms: query.now_ms,
        total: ConsumptionTotals::default(),
        espresso: ConsumptionTotals::default(),
        filter: ConsumptionTotals::default(),
        other: ConsumptionTotals::default(),
        first_timestamp: None,
        coffee_days: BTreeSet::new(),
    };

    for note in notes.iter().filter(|n| n.timestamp >= cutoff) {
        let Some(grams) = note_amount(note) else {
            continue;
        };
        let bean = resolve_bean(note, beans);
        if !query.selector.matches(note, bean) {
            continue;
        }

        let cost = bean
            .and_then(Bean::unit_price)
            .and_then(|unit| grams.checked_mul(unit));
        summary.total.add(grams, cost);
        match bean.and_then(|b| b.bean_type) {
            Some(BeanType::Espresso) => summary.espresso.add(grams, cost),
            Some(BeanType::Filter) => summary.filter.add(grams, cost),
            None => summary.other.add(grams, cost),
        }

        summary.first_timestamp = Some(match summary.first_timestamp {
            Some(first) => first.min(note.timestamp),
            None => note.timestamp,
        });
        summary
            .coffee_days
            .insert(local_date(note.timestamp, query.utc_offset));
    }

    summary
}
