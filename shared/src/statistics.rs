//! Inventory statistics
//!
//! Combines freshness and consumption with raw bean fields into the
//! dashboard snapshot. All maps are ordered so that composing twice over the
//! same records serializes identically.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, FixedOffset, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::consumption::{
    aggregate_consumption, BeanSelector, ConsumptionQuery, ConsumptionSummary, ConsumptionTotals,
};
use crate::freshness::{calculate_freshness, FreshnessPhase};
use crate::models::{Bean, BeanKind, BeanType, BrewingNote};
use crate::types::{local_date, sum_decimals, Language, TimeWindow};

/// Bucket for beans without a value in a category
pub const UNKNOWN_LABEL: &str = "unknown";
/// Number of flavor tags kept in the ranking
pub const TOP_FLAVOR_COUNT: usize = 10;

/// A bean is empty when it has a capacity and exactly zero grams left.
///
/// Beans without a capacity are never empty, whatever `remaining` says.
pub fn is_empty(bean: &Bean) -> bool {
    bean.capacity.is_some() && bean.remaining_grams() == Some(Decimal::ZERO)
}

/// Inputs that are not part of the records themselves
#[derive(Debug, Clone)]
pub struct StatisticsOptions {
    pub today: NaiveDate,
    pub utc_offset: FixedOffset,
    pub exclude_empty: bool,
    pub language: Language,
}

/// Counts, weights and costs over a set of beans
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InventoryOverview {
    pub total_beans: usize,
    pub active_beans: usize,
    pub empty_beans: usize,
    pub total_weight: Decimal,
    pub remaining_weight: Decimal,
    pub consumed_weight: Decimal,
    pub total_cost: Decimal,
    pub average_bean_price: Decimal,
    pub average_price_per_gram: Decimal,
}

/// Beans per freshness phase
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PhaseCounts {
    pub in_transit: usize,
    pub frozen: usize,
    pub aging: usize,
    pub peak: usize,
    pub declining: usize,
    pub unknown: usize,
}

impl PhaseCounts {
    fn record(&mut self, phase: FreshnessPhase) {
        match phase {
            FreshnessPhase::InTransit => self.in_transit += 1,
            FreshnessPhase::Frozen => self.frozen += 1,
            FreshnessPhase::Aging => self.aging += 1,
            FreshnessPhase::Peak => self.peak += 1,
            FreshnessPhase::Declining => self.declining += 1,
            FreshnessPhase::Unknown => self.unknown += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct KindCounts {
    pub single_origin: usize,
    pub blend: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BeanTypeCounts {
    pub espresso: usize,
    pub filter: usize,
    pub unspecified: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlavorCount {
    pub flavor: String,
    pub count: usize,
}

/// Categorical breakdowns of a set of beans
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Breakdown {
    pub roast_levels: BTreeMap<String, usize>,
    /// Counted per blend component
    pub origins: BTreeMap<String, usize>,
    pub processes: BTreeMap<String, usize>,
    pub varieties: BTreeMap<String, usize>,
    pub top_flavors: Vec<FlavorCount>,
    pub kinds: KindCounts,
    pub freshness: PhaseCounts,
}

/// Statistics restricted to one bean type
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TypeStatistics {
    pub overview: InventoryOverview,
    pub today: ConsumptionTotals,
    #[serde(flatten)]
    pub breakdown: Breakdown,
}

/// Full dashboard snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatisticsSnapshot {
    pub date: NaiveDate,
    pub overview: InventoryOverview,
    /// Consumption logged on `date`
    pub today: ConsumptionTotals,
    #[serde(flatten)]
    pub breakdown: Breakdown,
    pub bean_types: BeanTypeCounts,
    pub espresso: TypeStatistics,
    pub filter: TypeStatistics,
}

/// Consumption from notes logged on `today` (local calendar date)
pub fn todays_consumption(
    notes: &[BrewingNote],
    beans: &[Bean],
    today: NaiveDate,
    utc_offset: FixedOffset,
) -> ConsumptionSummary {
    let todays: Vec<BrewingNote> = notes
        .iter()
        .filter(|n| local_date(n.timestamp, utc_offset) == today)
        .cloned()
        .collect();
    let now_ms = todays.iter().map(|n| n.timestamp).max().unwrap_or(0);
    aggregate_consumption(
        &todays,
        beans,
        &ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, now_ms)
            .with_offset(utc_offset),
    )
}

/// Build the statistics snapshot for the given records
pub fn compose_statistics(
    beans: &[Bean],
    notes: &[BrewingNote],
    options: &StatisticsOptions,
) -> StatisticsSnapshot {
    let today = todays_consumption(notes, beans, options.today, options.utc_offset);
    let included: Vec<&Bean> = beans
        .iter()
        .filter(|b| !(options.exclude_empty && is_empty(b)))
        .collect();

    let of_type = |bean_type: BeanType| -> Vec<&Bean> {
        included
            .iter()
            .copied()
            .filter(|b| b.bean_type == Some(bean_type))
            .collect()
    };
    let espresso = of_type(BeanType::Espresso);
    let filter = of_type(BeanType::Filter);

    let mut bean_types = BeanTypeCounts::default();
    for bean in &included {
        match bean.bean_type {
            Some(BeanType::Espresso) => bean_types.espresso += 1,
            Some(BeanType::Filter) => bean_types.filter += 1,
            None => bean_types.unspecified += 1,
        }
    }

    StatisticsSnapshot {
        date: options.today,
        overview: overview(&included),
        today: today.total,
        breakdown: breakdown(&included, options),
        bean_types,
        espresso: TypeStatistics {
            overview: overview(&espresso),
            today: today.espresso,
            breakdown: breakdown(&espresso, options),
        },
        filter: TypeStatistics {
            overview: overview(&filter),
            today: today.filter,
            breakdown: breakdown(&filter, options),
        },
    }
}

fn overview(beans: &[&Bean]) -> InventoryOverview {
    let mut o = InventoryOverview {
        total_beans: beans.len(),
        ..Default::default()
    };
    let mut priced = 0usize;

    for bean in beans {
        if is_empty(bean) {
            o.empty_beans += 1;
        }
        let capacity = bean.capacity_grams();
        let remaining = bean.remaining_grams();
        o.total_weight = sum_decimals([o.total_weight, capacity.unwrap_or_default()]);
        o.remaining_weight = sum_decimals([o.remaining_weight, remaining.unwrap_or_default()]);
        if let (Some(capacity), Some(remaining)) = (capacity, remaining) {
            let consumed = capacity
                .checked_sub(remaining)
                .unwrap_or_default()
                .max(Decimal::ZERO);
            o.consumed_weight = sum_decimals([o.consumed_weight, consumed]);
        }
        if let Some(price) = bean.price_value() {
            o.total_cost = sum_decimals([o.total_cost, price]);
            priced += 1;
        }
    }

    o.active_beans = o.total_beans - o.empty_beans;
    if priced > 0 {
        o.average_bean_price = (o.total_cost / Decimal::from(priced)).round_dp(2);
    }
    if o.total_weight > Decimal::ZERO {
        o.average_price_per_gram = o
            .total_cost
            .checked_div(o.total_weight)
            .map(|p| p.round_dp(2))
            .unwrap_or_default();
    }
    o
}

fn breakdown(beans: &[&Bean], options: &StatisticsOptions) -> Breakdown {
    let mut b = Breakdown::default();
    let mut flavors: BTreeMap<String, usize> = BTreeMap::new();

    for bean in beans {
        let level = bean
            .roast_level
            .map(|l| l.label(options.language).to_string())
            .unwrap_or_else(|| UNKNOWN_LABEL.to_string());
        *b.roast_levels.entry(level).or_default() += 1;

        if bean.components.is_empty() {
            for map in [&mut b.origins, &mut b.processes, &mut b.varieties] {
                *map.entry(UNKNOWN_LABEL.to_string()).or_default() += 1;
            }
        }
        for component in &bean.components {
            count_label(&mut b.origins, component.origin.as_deref());
            count_label(&mut b.processes, component.process.as_deref());
            count_label(&mut b.varieties, component.variety.as_deref());
        }

        for flavor in &bean.flavor {
            *flavors.entry(flavor.clone()).or_default() += 1;
        }

        match bean.kind() {
            BeanKind::SingleOrigin => b.kinds.single_origin += 1,
            BeanKind::Blend => b.kinds.blend += 1,
        }

        b.freshness.record(calculate_freshness(bean, options.today).phase);
    }

    let mut ranked: Vec<FlavorCount> = flavors
        .into_iter()
        .map(|(flavor, count)| FlavorCount { flavor, count })
        .collect();
    // BTreeMap order already breaks ties by name
    ranked.sort_by(|a, b| b.count.cmp(&a.count));
    ranked.truncate(TOP_FLAVOR_COUNT);
    b.top_flavors = ranked;

    b
}

fn count_label(map: &mut BTreeMap<String, usize>, value: Option<&str>) {
    let key = value.unwrap_or(UNKNOWN_LABEL).to_string();
    *map.entry(key).or_default() += 1;
}

/// How soon a projected depletion date falls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DepletionHorizon {
    ThisWeek,
    ThisMonth,
    Later,
    BeyondYear,
}

/// Projected date on which the remaining stock runs out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DepletionEstimate {
    Unknown,
    Projected {
        date: NaiveDate,
        days_remaining: i64,
        horizon: DepletionHorizon,
    },
}

/// Project when `remaining_weight` grams run out at `daily_rate` grams/day.
///
/// Rates below one gram per day are treated as one.
pub fn estimate_depletion(
    remaining_weight: Decimal,
    daily_rate: Decimal,
    today: NaiveDate,
) -> DepletionEstimate {
    if remaining_weight <= Decimal::ZERO || daily_rate <= Decimal::ZERO {
        return DepletionEstimate::Unknown;
    }

    let rate = daily_rate.max(Decimal::ONE);
    let Some(days_remaining) = (remaining_weight / rate).ceil().to_i64() else {
        return DepletionEstimate::Unknown;
    };
    let Some(date) = today.checked_add_signed(Duration::days(days_remaining)) else {
        return DepletionEstimate::Unknown;
    };

    let horizon = if days_remaining > 365 {
        DepletionHorizon::BeyondYear
    } else if date.iso_week() == today.iso_week() {
        DepletionHorizon::ThisWeek
    } else if date.year() == today.year() && date.month() == today.month() {
        DepletionHorizon::ThisMonth
    } else {
        DepletionHorizon::Later
    };

    DepletionEstimate::Projected {
        date,
        days_remaining,
        horizon,
    }
}

impl std::fmt::Display for DepletionEstimate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DepletionEstimate::Unknown => write!(f, "unknown"),
            DepletionEstimate::Projected { horizon: DepletionHorizon::BeyondYear, .. } => {
                write!(f, "more than a year")
            }
            DepletionEstimate::Projected { date, horizon, .. } => {
                let date = date.format("%Y-%m-%d");
                match horizon {
                    DepletionHorizon::ThisWeek => write!(f, "{date} (this week)"),
                    DepletionHorizon::ThisMonth => write!(f, "{date} (this month)"),
                    _ => write!(f, "{date}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Quantity;
    use chrono::{Offset, Utc};

    fn options(today: NaiveDate) -> StatisticsOptions {
        StatisticsOptions {
            today,
            utc_offset: Utc.fix(),
            exclude_empty: false,
            language: Language::English,
        }
    }

    fn stocked(id: &str, capacity: Option<&str>, remaining: &str) -> Bean {
        let mut bean = Bean::new(id, id, 0);
        bean.capacity = capacity.map(Quantity::parse);
        bean.remaining = Some(Quantity::parse(remaining));
        bean
    }

    #[test]
    fn test_is_empty() {
        assert!(is_empty(&stocked("a", Some("200"), "0")));
        assert!(is_empty(&stocked("b", Some("200"), "0g")));
        assert!(!is_empty(&stocked("c", None, "0")));
        assert!(!is_empty(&stocked("d", Some("200"), "12")));
    }

    #[test]
    fn test_overview_weights_and_costs() {
        let mut a = stocked("a", Some("200"), "50");
        a.price = Some(Quantity::parse("100"));
        let mut b = stocked("b", Some("250"), "0");
        b.price = Some(Quantity::parse("80"));
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let snapshot = compose_statistics(&[a, b], &[], &options(today));
        let o = &snapshot.overview;
        assert_eq!(o.total_beans, 2);
        assert_eq!(o.empty_beans, 1);
        assert_eq!(o.active_beans, 1);
        assert_eq!(o.total_weight, Decimal::from(450));
        assert_eq!(o.remaining_weight, Decimal::from(50));
        assert_eq!(o.consumed_weight, Decimal::from(400));
        assert_eq!(o.total_cost, Decimal::from(180));
        assert_eq!(o.average_bean_price, Decimal::from(90));
        assert_eq!(o.average_price_per_gram, Decimal::new(40, 2));
    }

    #[test]
    fn test_exclude_empty() {
        let beans = vec![stocked("a", Some("200"), "50"), stocked("b", Some("250"), "0")];
        let mut opts = options(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        opts.exclude_empty = true;
        let snapshot = compose_statistics(&beans, &[], &opts);
        assert_eq!(snapshot.overview.total_beans, 1);
    }

    #[test]
    fn test_unknown_buckets() {
        let bean = Bean::new("a", "Mystery", 0);
        let snapshot = compose_statistics(
            &[bean],
            &[],
            &options(NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()),
        );
        assert_eq!(snapshot.breakdown.origins.get(UNKNOWN_LABEL), Some(&1));
        assert_eq!(snapshot.breakdown.roast_levels.get(UNKNOWN_LABEL), Some(&1));
        assert_eq!(snapshot.breakdown.freshness.unknown, 1);
    }

    #[test]
    fn test_depletion_projection() {
        // 2024-05-01 is a Wednesday
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();

        let soon = estimate_depletion(Decimal::from(45), Decimal::from(20), today);
        assert_eq!(
            soon,
            DepletionEstimate::Projected {
                date: NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
                days_remaining: 3,
                horizon: DepletionHorizon::ThisWeek,
            }
        );
        assert_eq!(soon.to_string(), "2024-05-04 (this week)");

        let month = estimate_depletion(Decimal::from(100), Decimal::from(10), today);
        assert_eq!(month.to_string(), "2024-05-11 (this month)");

        let far = estimate_depletion(Decimal::from(1000), Decimal::new(5, 1), today);
        assert_eq!(far.to_string(), "more than a year");
    }

    #[test]
    fn test_depletion_unknown() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        assert_eq!(
            estimate_depletion(Decimal::ZERO, Decimal::from(10), today),
            DepletionEstimate::Unknown
        );
        assert_eq!(
            estimate_depletion(Decimal::from(100), Decimal::ZERO, today),
            DepletionEstimate::Unknown
        );
    }
}
