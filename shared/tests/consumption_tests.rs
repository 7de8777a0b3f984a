//! Consumption aggregator tests
//!
//! - Capacity adjustments never count, quick decrements always do
//! - Cost attribution through price per gram
//! - Day-count modes and time windows

use std::str::FromStr;

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    aggregate_consumption, Bean, BeanSelector, BeanType, Brew, BrewParams, BrewingNote,
    CoffeeBeanInfo, ConsumptionQuery, DayCountMode, NoteSource, Quantity, TimeWindow, DAY_MS,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn priced_bean(id: &str, name: &str, bean_type: Option<BeanType>) -> Bean {
    let mut bean = Bean::new(id, name, 0);
    bean.price = Some(Quantity::parse("100"));
    bean.capacity = Some(Quantity::parse("200"));
    bean.remaining = Some(Quantity::parse("200"));
    bean.bean_type = bean_type;
    bean
}

fn note(id: &str, ts: i64, bean: &Bean, source: NoteSource) -> BrewingNote {
    BrewingNote {
        id: id.to_string(),
        timestamp: ts,
        bean_id: Some(bean.id.clone()),
        bean_info: Some(CoffeeBeanInfo {
            name: bean.name.clone(),
            ..Default::default()
        }),
        source,
        notes: None,
    }
}

fn brew(dose: &str) -> NoteSource {
    NoteSource::OrdinaryBrew(Brew {
        params: BrewParams {
            coffee: Some(dose.to_string()),
            ..Default::default()
        },
        ..Default::default()
    })
}

fn quick(amount: &str) -> NoteSource {
    NoteSource::QuickDecrement {
        amount: Quantity::parse(amount),
    }
}

fn adjustment(from: &str, to: &str) -> NoteSource {
    NoteSource::CapacityAdjustment {
        original_amount: Some(Quantity::parse(from)),
        new_amount: Some(Quantity::parse(to)),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_twenty_grams_at_half_per_gram_costs_ten() {
        let bean = priced_bean("b1", "Kenya", None);
        assert_eq!(bean.unit_price(), Some(dec("0.5")));

        let notes = vec![note("n1", 1_000, &bean, brew("20g"))];
        let summary = aggregate_consumption(
            &notes,
            &[bean],
            &ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 2_000),
        );
        assert_eq!(summary.total.grams, dec("20"));
        assert_eq!(summary.total.cost, dec("10"));
    }

    #[test]
    fn test_adjustment_excluded_quick_decrement_included() {
        let bean = priced_bean("b1", "Kenya", Some(BeanType::Filter));
        let notes = vec![
            note("n1", 1_000, &bean, adjustment("200", "150")),
            note("n2", 2_000, &bean, quick("15")),
        ];
        let summary = aggregate_consumption(
            &notes,
            &[bean],
            &ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 3_000),
        );
        assert_eq!(summary.total.grams, dec("15"));
        assert_eq!(summary.total.note_count, 1);
        assert_eq!(summary.filter.grams, dec("15"));
    }

    #[test]
    fn test_type_selector_splits_buckets() {
        let espresso = priced_bean("e", "Espresso Blend", Some(BeanType::Espresso));
        let filter = priced_bean("f", "Ethiopia", Some(BeanType::Filter));
        let notes = vec![
            note("n1", 1_000, &espresso, brew("18g")),
            note("n2", 2_000, &filter, brew("15g")),
        ];
        let beans = vec![espresso, filter];

        let summary = aggregate_consumption(
            &notes,
            &beans,
            &ConsumptionQuery::new(
                BeanSelector::Type(BeanType::Espresso),
                TimeWindow::AllTime,
                3_000,
            ),
        );
        assert_eq!(summary.total.grams, dec("18"));
        assert_eq!(summary.filter.grams, Decimal::ZERO);
    }

    #[test]
    fn test_window_cutoff() {
        let bean = priced_bean("b1", "Kenya", None);
        let now = 40 * DAY_MS;
        let notes = vec![
            note("old", now - 10 * DAY_MS, &bean, brew("15g")),
            note("new", now - DAY_MS, &bean, brew("16g")),
        ];
        let beans = vec![bean];

        let week = aggregate_consumption(
            &notes,
            &beans,
            &ConsumptionQuery::new(BeanSelector::All, TimeWindow::Last7Days, now),
        );
        assert_eq!(week.total.grams, dec("16"));
        assert_eq!(week.actual_days(DayCountMode::NaturalDay), 7);
        assert_eq!(week.actual_days(DayCountMode::CoffeeDay), 1);

        let month = aggregate_consumption(
            &notes,
            &beans,
            &ConsumptionQuery::new(BeanSelector::All, TimeWindow::Last30Days, now),
        );
        assert_eq!(month.total.grams, dec("31"));
        assert_eq!(month.daily_average(DayCountMode::CoffeeDay), dec("15.5"));
    }

    #[test]
    fn test_name_selector_matches_snapshot_name() {
        let bean = priced_bean("b1", "Kenya", None);
        let mut orphan = note("n1", 1_000, &bean, brew("12g"));
        orphan.bean_id = Some("deleted".into());

        let summary = aggregate_consumption(
            &[orphan],
            &[],
            &ConsumptionQuery::new(BeanSelector::Name("Kenya".into()), TimeWindow::AllTime, 2_000),
        );
        assert_eq!(summary.total.grams, dec("12"));
        assert_eq!(summary.total.cost, Decimal::ZERO);
    }

    #[test]
    fn test_unreadable_dose_skipped() {
        let bean = priced_bean("b1", "Kenya", None);
        let notes = vec![note("n1", 1_000, &bean, brew("a scoop"))];
        let summary = aggregate_consumption(
            &notes,
            &[bean],
            &ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 2_000),
        );
        assert_eq!(summary.total.note_count, 0);
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    #[derive(Debug, Clone)]
    enum Kind {
        Brew,
        Quick,
        Adjustment,
    }

    fn kind_strategy() -> impl Strategy<Value = Kind> {
        prop_oneof![Just(Kind::Brew), Just(Kind::Quick), Just(Kind::Adjustment)]
    }

    fn notes_strategy() -> impl Strategy<Value = Vec<(Kind, u32)>> {
        prop::collection::vec((kind_strategy(), 1u32..=40), 0..30)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Totals equal the sum of brew and quick-decrement doses only
        #[test]
        fn prop_adjustments_never_count(entries in notes_strategy()) {
            let bean = priced_bean("b1", "Kenya", Some(BeanType::Espresso));
            let mut expected = Decimal::ZERO;
            let notes: Vec<BrewingNote> = entries
                .iter()
                .enumerate()
                .map(|(i, (kind, grams))| {
                    let grams = grams.to_string();
                    let source = match kind {
                        Kind::Brew => brew(&format!("{grams}g")),
                        Kind::Quick => quick(&grams),
                        Kind::Adjustment => adjustment("200", &grams),
                    };
                    if !matches!(kind, Kind::Adjustment) {
                        expected += dec(&grams);
                    }
                    note(&format!("n{i}"), i as i64 * 1_000, &bean, source)
                })
                .collect();

            let summary = aggregate_consumption(
                &notes,
                &[bean],
                &ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 1_000_000),
            );
            prop_assert_eq!(summary.total.grams, expected);
            prop_assert_eq!(summary.espresso.grams, expected);
            prop_assert_eq!(summary.total.cost, expected * dec("0.5"));
        }

        /// Per-day divisors never drop below one
        #[test]
        fn prop_actual_days_at_least_one(entries in notes_strategy(), now in 0i64..(400 * DAY_MS)) {
            let bean = priced_bean("b1", "Kenya", None);
            let notes: Vec<BrewingNote> = entries
                .iter()
                .enumerate()
                .map(|(i, (_, grams))| note(&format!("n{i}"), now - i as i64 * DAY_MS, &bean, quick(&grams.to_string())))
                .collect();

            for window in [TimeWindow::AllTime, TimeWindow::Last7Days, TimeWindow::Last30Days] {
                let summary = aggregate_consumption(
                    &notes,
                    std::slice::from_ref(&bean),
                    &ConsumptionQuery::new(BeanSelector::All, window, now),
                );
                prop_assert!(summary.actual_days(DayCountMode::NaturalDay) >= 1);
                prop_assert!(summary.actual_days(DayCountMode::CoffeeDay) >= 1);
            }
        }
    }
}
