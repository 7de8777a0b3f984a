//! Inventory bookkeeping tests
//!
//! Tests for the rules the inventory endpoints rely on:
//! - Remaining amounts stay within [0, capacity]
//! - Quick decrements count as consumption, capacity adjustments do not
//! - Hiding empty beans never hides a bean with stock left

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    aggregate_consumption, decrement_remaining, is_empty, Bean, BeanFilter, BeanSelector,
    BrewingNote, CoffeeBeanInfo, ConsumptionQuery, NoteSource, Quantity, TimeWindow,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stocked(id: &str, capacity: &str, remaining: &str) -> Bean {
    let mut bean = Bean::new(id, format!("Bean {}", id), 0);
    bean.capacity = Some(Quantity::parse(capacity));
    bean.remaining = Some(Quantity::parse(remaining));
    bean.price = Some(Quantity::parse("100"));
    bean
}

fn note(id: &str, bean: &Bean, source: NoteSource, timestamp: i64) -> BrewingNote {
    BrewingNote {
        id: id.to_string(),
        timestamp,
        bean_id: Some(bean.id.clone()),
        bean_info: Some(CoffeeBeanInfo {
            name: bean.name.clone(),
            ..Default::default()
        }),
        source,
        notes: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_decrement_stops_at_zero() {
        let bean = stocked("1", "200", "10");
        let left = decrement_remaining(&bean, dec("15"));
        assert_eq!(left.value(), Some(Decimal::ZERO));
        assert_eq!(left.raw(), "0");
    }

    #[test]
    fn test_decrement_without_remaining_starts_from_capacity() {
        let mut bean = stocked("1", "250g", "");
        bean.remaining = None;
        assert_eq!(decrement_remaining(&bean, dec("18")).value(), Some(dec("232")));
    }

    #[test]
    fn test_decrement_from_extreme_negative_remaining() {
        let mut bean = stocked("1", "200", "0");
        bean.remaining = Some(Quantity::from_decimal(Decimal::MIN));
        assert_eq!(decrement_remaining(&bean, dec("15")).value(), Some(Decimal::ZERO));
    }

    #[test]
    fn test_adjustments_are_not_consumption() {
        let bean = stocked("1", "200", "200");
        let notes = vec![
            note(
                "n1",
                &bean,
                NoteSource::QuickDecrement {
                    amount: Quantity::parse("15"),
                },
                1_000,
            ),
            note(
                "n2",
                &bean,
                NoteSource::CapacityAdjustment {
                    original_amount: Some(Quantity::parse("185")),
                    new_amount: Some(Quantity::parse("100")),
                },
                2_000,
            ),
        ];

        let query = ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 10_000);
        let summary = aggregate_consumption(&notes, &[bean], &query);
        assert_eq!(summary.total.grams, dec("15"));
        assert_eq!(summary.total.note_count, 1);
        assert_eq!(summary.total.cost, dec("7.5"));
    }

    #[test]
    fn test_empty_needs_capacity() {
        let mut bean = stocked("1", "200", "0");
        assert!(is_empty(&bean));

        bean.capacity = None;
        assert!(!is_empty(&bean));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Decrementing never leaves a negative amount or more than the capacity
        #[test]
        fn prop_decrement_stays_in_bounds(
            capacity in 1u32..2000,
            remaining in 0u32..4000,
            amount in 1u32..500,
        ) {
            let bean = stocked("1", &capacity.to_string(), &remaining.to_string());
            let left = decrement_remaining(&bean, Decimal::from(amount)).value().unwrap();

            prop_assert!(left >= Decimal::ZERO);
            prop_assert!(left <= Decimal::from(capacity));
        }

        /// Quick decrements sum to exactly the logged amounts
        #[test]
        fn prop_quick_decrements_sum(amounts in prop::collection::vec(1u32..100, 1..20)) {
            let bean = stocked("1", "1000", "1000");
            let notes: Vec<BrewingNote> = amounts
                .iter()
                .enumerate()
                .map(|(i, a)| note(
                    &format!("n{}", i),
                    &bean,
                    NoteSource::QuickDecrement { amount: Quantity::parse(a.to_string()) },
                    i as i64 * 1_000,
                ))
                .collect();

            let query = ConsumptionQuery::new(BeanSelector::Id("1".into()), TimeWindow::AllTime, 1_000_000);
            let summary = aggregate_consumption(&notes, &[bean], &query);
            let expected: u32 = amounts.iter().sum();
            prop_assert_eq!(summary.total.grams, Decimal::from(expected));
        }

        /// Excluding empty beans removes exactly the empty ones
        #[test]
        fn prop_exclude_empty_filter(remainings in prop::collection::vec(0u32..3, 1..15)) {
            let beans: Vec<Bean> = remainings
                .iter()
                .enumerate()
                .map(|(i, r)| stocked(&i.to_string(), "200", &r.to_string()))
                .collect();

            let filter = BeanFilter { include_empty: false, ..Default::default() };
            let today = chrono::NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
            let kept = filter.apply(&beans, today);

            let stocked_count = remainings.iter().filter(|r| **r > 0).count();
            prop_assert_eq!(kept.len(), stocked_count);
            prop_assert!(kept.iter().all(|b| !is_empty(b)));
        }
    }
}
