//! Statistics service
//!
//! Thin layer over the shared composer: loads the current records, applies
//! the user's settings where a query leaves a choice open, and rounds the
//! per-day figures for display.

use chrono::FixedOffset;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    aggregate_consumption, compose_statistics, estimate_depletion, sum_decimals, BeanSelector,
    BeanType, ConsumptionQuery, ConsumptionSummary, DayCountMode, DepletionEstimate,
    StatisticsOptions, StatisticsSnapshot, TimeWindow,
};
use tracing::debug;

use super::{local_today, now_ms, Records};

/// Statistics service for the dashboard
#[derive(Clone)]
pub struct StatisticsService {
    records: Records,
    utc_offset: FixedOffset,
}

/// Options for the dashboard snapshot
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SnapshotQuery {
    /// Overrides the stored "exclude empty beans" setting
    pub exclude_empty: Option<bool>,
}

/// Consumption request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConsumptionRequest {
    #[serde(default)]
    pub selector: BeanSelector,
    #[serde(default)]
    pub window: TimeWindow,
    /// Overrides the stored day-count mode
    pub mode: Option<DayCountMode>,
}

/// Consumption totals with per-day figures
#[derive(Debug, Clone, Serialize)]
pub struct ConsumptionReport {
    pub mode: DayCountMode,
    pub actual_days: i64,
    pub daily_average: Decimal,
    pub daily_cost: Decimal,
    #[serde(flatten)]
    pub summary: ConsumptionSummary,
}

/// Depletion request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DepletionRequest {
    pub bean_type: Option<BeanType>,
    pub mode: Option<DayCountMode>,
}

/// Projected run-out date of the current stock
#[derive(Debug, Clone, Serialize)]
pub struct DepletionReport {
    pub remaining_weight: Decimal,
    /// Grams per day over the last 30 days
    pub daily_rate: Decimal,
    pub estimate: DepletionEstimate,
    pub label: String,
}

impl StatisticsService {
    pub fn new(records: Records, utc_offset: FixedOffset) -> Self {
        Self {
            records,
            utc_offset,
        }
    }

    pub async fn snapshot(&self, query: &SnapshotQuery) -> StatisticsSnapshot {
        let settings = self.records.settings().await;
        let beans = self.records.beans().await;
        let notes = self.records.notes().await;

        let options = StatisticsOptions {
            today: local_today(self.utc_offset),
            utc_offset: self.utc_offset,
            exclude_empty: query
                .exclude_empty
                .unwrap_or(settings.exclude_empty_from_stats),
            language: settings.language,
        };
        debug!(
            "Composing statistics over {} beans and {} notes",
            beans.len(),
            notes.len()
        );
        compose_statistics(&beans, &notes, &options)
    }

    pub async fn consumption(&self, request: &ConsumptionRequest) -> ConsumptionReport {
        let mode = match request.mode {
            Some(mode) => mode,
            None => self.records.settings().await.day_count_mode,
        };
        let summary = self
            .summarize(request.selector.clone(), request.window)
            .await;

        ConsumptionReport {
            mode,
            actual_days: summary.actual_days(mode),
            daily_average: summary.daily_average(mode).round_dp(2),
            daily_cost: summary.daily_cost(mode).round_dp(2),
            summary,
        }
    }

    /// When the remaining stock runs out at the last-30-day rate
    pub async fn depletion(&self, request: &DepletionRequest) -> DepletionReport {
        let mode = match request.mode {
            Some(mode) => mode,
            None => self.records.settings().await.day_count_mode,
        };
        let remaining_weight = sum_decimals(
            self.records
                .beans()
                .await
                .iter()
                .filter(|b| request.bean_type.is_none() || b.bean_type == request.bean_type)
                .filter_map(|b| b.remaining_grams())
                .filter(|g| *g > Decimal::ZERO),
        );

        let selector = match request.bean_type {
            Some(bean_type) => BeanSelector::Type(bean_type),
            None => BeanSelector::All,
        };
        let summary = self.summarize(selector, TimeWindow::Last30Days).await;
        let daily_rate = summary.daily_average(mode).round_dp(2);

        let estimate = estimate_depletion(
            remaining_weight,
            daily_rate,
            local_today(self.utc_offset),
        );
        DepletionReport {
            remaining_weight,
            daily_rate,
            label: estimate.to_string(),
            estimate,
        }
    }

    async fn summarize(&self, selector: BeanSelector, window: TimeWindow) -> ConsumptionSummary {
        let beans = self.records.beans().await;
        let notes = self.records.notes().await;
        let query =
            ConsumptionQuery::new(selector, window, now_ms()).with_offset(self.utc_offset);
        aggregate_consumption(&notes, &beans, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{ChangeFeed, RecordStore};
    use shared::{
        Bean, BrewingNote, CoffeeBeanInfo, NoteSource, Quantity, Settings, DAY_MS,
    };

    fn quick(id: &str, bean: &Bean, grams: &str, timestamp: i64) -> BrewingNote {
        BrewingNote {
            id: id.to_string(),
            timestamp,
            bean_id: Some(bean.id.clone()),
            bean_info: Some(CoffeeBeanInfo {
                name: bean.name.clone(),
                ..Default::default()
            }),
            source: NoteSource::QuickDecrement {
                amount: Quantity::parse(grams),
            },
            notes: None,
        }
    }

    async fn seeded() -> StatisticsService {
        let records = Records::new(RecordStore::memory(ChangeFeed::new(8)), Settings::default());

        let mut espresso = Bean::new("e1", "House Blend", 0);
        espresso.bean_type = Some(BeanType::Espresso);
        espresso.capacity = Some(Quantity::parse("1000"));
        espresso.remaining = Some(Quantity::parse("600"));
        espresso.price = Some(Quantity::parse("200"));

        let mut empty = Bean::new("f1", "Finished", 0);
        empty.bean_type = Some(BeanType::Filter);
        empty.capacity = Some(Quantity::parse("200"));
        empty.remaining = Some(Quantity::parse("0"));

        let now = now_ms();
        let notes = vec![
            quick("n1", &espresso, "20", now - DAY_MS),
            quick("n2", &espresso, "20", now - 2 * DAY_MS),
            quick("n3", &espresso, "500", now - 90 * DAY_MS),
        ];
        records.save_beans(vec![espresso, empty]).await.unwrap();
        records.save_notes(notes).await.unwrap();

        StatisticsService::new(records, FixedOffset::east_opt(0).unwrap())
    }

    #[tokio::test]
    async fn test_snapshot_respects_exclude_empty() {
        let service = seeded().await;

        let all = service.snapshot(&SnapshotQuery::default()).await;
        assert_eq!(all.overview.total_beans, 2);
        assert_eq!(all.overview.empty_beans, 1);

        let active = service
            .snapshot(&SnapshotQuery {
                exclude_empty: Some(true),
            })
            .await;
        assert_eq!(active.overview.total_beans, 1);
    }

    #[tokio::test]
    async fn test_consumption_report_windows() {
        let service = seeded().await;

        let month = service
            .consumption(&ConsumptionRequest {
                window: TimeWindow::Last30Days,
                mode: Some(DayCountMode::NaturalDay),
                ..Default::default()
            })
            .await;
        assert_eq!(month.summary.total.grams, Decimal::from(40));
        assert_eq!(month.actual_days, 30);
        assert_eq!(month.daily_average, Decimal::new(133, 2));
        // 40g at 0.2 per gram
        assert_eq!(month.summary.total.cost, Decimal::from(8));

        let all_time = service
            .consumption(&ConsumptionRequest {
                mode: Some(DayCountMode::CoffeeDay),
                ..Default::default()
            })
            .await;
        assert_eq!(all_time.summary.total.grams, Decimal::from(540));
        assert_eq!(all_time.actual_days, 3);
    }

    #[tokio::test]
    async fn test_depletion_projection() {
        let service = seeded().await;
        let report = service
            .depletion(&DepletionRequest {
                bean_type: Some(BeanType::Espresso),
                mode: Some(DayCountMode::CoffeeDay),
            })
            .await;

        assert_eq!(report.remaining_weight, Decimal::from(600));
        assert_eq!(report.daily_rate, Decimal::from(20));
        assert!(matches!(
            report.estimate,
            DepletionEstimate::Projected { days_remaining: 30, .. }
        ));
    }

    #[tokio::test]
    async fn test_depletion_unknown_without_consumption() {
        let service = seeded().await;
        let report = service
            .depletion(&DepletionRequest {
                bean_type: Some(BeanType::Filter),
                mode: None,
            })
            .await;
        assert_eq!(report.estimate, DepletionEstimate::Unknown);
        assert_eq!(report.label, "unknown");
    }
}
