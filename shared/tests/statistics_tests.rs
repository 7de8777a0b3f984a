//! Statistics composer tests
//!
//! - Empty determination
//! - Overview totals and exclusion of empty beans
//! - Deterministic output
//! - Depletion projection

use std::str::FromStr;

use chrono::{FixedOffset, NaiveDate, Utc, Offset};
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    aggregate_consumption, compose_statistics, estimate_depletion, is_empty, price_per_gram,
    sort_beans, Bean, BeanSelector, BeanType, BlendComponent, BrewingNote, CoffeeBeanInfo,
    ConsumptionQuery, DepletionEstimate, DepletionHorizon, Language, NoteSource, Quantity,
    RoastLevel, SortKey, StatisticsOptions, TimeWindow, UNKNOWN_LABEL,
};

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn utc() -> FixedOffset {
    Utc.fix()
}

fn options(today: NaiveDate, exclude_empty: bool) -> StatisticsOptions {
    StatisticsOptions {
        today,
        utc_offset: utc(),
        exclude_empty,
        language: Language::English,
    }
}

fn stocked(id: &str, capacity: &str, remaining: &str, price: &str) -> Bean {
    let mut bean = Bean::new(id, format!("Roaster {id}"), 0);
    bean.capacity = Some(Quantity::parse(capacity));
    bean.remaining = Some(Quantity::parse(remaining));
    bean.price = Some(Quantity::parse(price));
    bean
}

fn quick_note(id: &str, ts: i64, bean: &Bean, grams: &str) -> BrewingNote {
    BrewingNote {
        id: id.to_string(),
        timestamp: ts,
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

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_empty_requires_capacity() {
        let mut bean = Bean::new("1", "x", 0);
        bean.remaining = Some(Quantity::parse("0"));
        assert!(!is_empty(&bean));

        bean.capacity = Some(Quantity::parse("200"));
        assert!(is_empty(&bean));

        bean.remaining = Some(Quantity::parse("0.5"));
        assert!(!is_empty(&bean));
    }

    #[test]
    fn test_overview_totals() {
        let beans = vec![
            stocked("a", "200", "150", "100"),
            stocked("b", "250", "0", "80"),
        ];
        let snapshot = compose_statistics(&beans, &[], &options(date(2024, 6, 1), false));
        let o = &snapshot.overview;

        assert_eq!(o.total_beans, 2);
        assert_eq!(o.empty_beans, 1);
        assert_eq!(o.active_beans, 1);
        assert_eq!(o.total_weight, dec("450"));
        assert_eq!(o.remaining_weight, dec("150"));
        assert_eq!(o.consumed_weight, dec("300"));
        assert_eq!(o.total_cost, dec("180"));
        assert_eq!(o.average_bean_price, dec("90"));
        assert_eq!(o.average_price_per_gram, dec("0.4"));
    }

    #[test]
    fn test_exclude_empty() {
        let beans = vec![
            stocked("a", "200", "150", "100"),
            stocked("b", "250", "0", "80"),
        ];
        let snapshot = compose_statistics(&beans, &[], &options(date(2024, 6, 1), true));
        assert_eq!(snapshot.overview.total_beans, 1);
        assert_eq!(snapshot.overview.empty_beans, 0);
    }

    #[test]
    fn test_non_numeric_price_degrades_to_zero() {
        let beans = vec![stocked("a", "200", "100", "free sample")];
        let snapshot = compose_statistics(&beans, &[], &options(date(2024, 6, 1), false));
        assert_eq!(snapshot.overview.total_cost, Decimal::ZERO);
        assert_eq!(snapshot.overview.average_bean_price, Decimal::ZERO);
    }

    #[test]
    fn test_breakdowns_and_unknown_bucket() {
        let mut blend = stocked("a", "200", "200", "100");
        blend.roast_level = Some(RoastLevel::Medium);
        blend.bean_type = Some(BeanType::Espresso);
        blend.components = vec![
            BlendComponent {
                origin: Some("Brazil".into()),
                ..Default::default()
            },
            BlendComponent {
                origin: Some("Colombia".into()),
                ..Default::default()
            },
        ];
        blend.flavor = vec!["Chocolate".into(), "Nutty".into()];

        let mut plain = stocked("b", "200", "200", "100");
        plain.flavor = vec!["Chocolate".into()];

        let snapshot = compose_statistics(&[blend, plain], &[], &options(date(2024, 6, 1), false));
        let b = &snapshot.breakdown;

        assert_eq!(b.roast_levels.get("Medium"), Some(&1));
        assert_eq!(b.roast_levels.get(UNKNOWN_LABEL), Some(&1));
        assert_eq!(b.origins.get("Brazil"), Some(&1));
        assert_eq!(b.origins.get(UNKNOWN_LABEL), Some(&1));
        assert_eq!(b.kinds.blend, 1);
        assert_eq!(b.kinds.single_origin, 1);
        assert_eq!(b.top_flavors[0].flavor, "Chocolate");
        assert_eq!(b.top_flavors[0].count, 2);
        assert_eq!(b.freshness.unknown, 2);

        assert_eq!(snapshot.bean_types.espresso, 1);
        assert_eq!(snapshot.bean_types.unspecified, 1);
        assert_eq!(snapshot.espresso.overview.total_beans, 1);
        assert_eq!(snapshot.filter.overview.total_beans, 0);
    }

    #[test]
    fn test_todays_consumption() {
        let today = date(2024, 6, 1);
        let mut bean = stocked("a", "200", "150", "100");
        bean.bean_type = Some(BeanType::Filter);
        let midday = today
            .and_hms_opt(12, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        let notes = vec![
            quick_note("n1", midday, &bean, "15"),
            quick_note("n2", midday - 86_400_000, &bean, "18"),
        ];

        let snapshot = compose_statistics(&[bean], &notes, &options(today, false));
        assert_eq!(snapshot.today.grams, dec("15"));
        assert_eq!(snapshot.today.cost, dec("7.5"));
        assert_eq!(snapshot.filter.today.grams, dec("15"));
    }

    #[test]
    fn test_depletion_projection() {
        let today = date(2024, 6, 3); // Monday
        assert_eq!(
            estimate_depletion(dec("30"), dec("15"), today),
            DepletionEstimate::Projected {
                date: date(2024, 6, 5),
                days_remaining: 2,
                horizon: DepletionHorizon::ThisWeek,
            }
        );

        match estimate_depletion(dec("150"), dec("15"), today) {
            DepletionEstimate::Projected { horizon, .. } => {
                assert_eq!(horizon, DepletionHorizon::ThisMonth)
            }
            other => panic!("unexpected {other:?}"),
        }

        match estimate_depletion(dec("5000"), dec("0.2"), today) {
            DepletionEstimate::Projected { horizon, days_remaining, .. } => {
                assert_eq!(horizon, DepletionHorizon::BeyondYear);
                assert_eq!(days_remaining, 5000);
            }
            other => panic!("unexpected {other:?}"),
        }

        assert_eq!(estimate_depletion(dec("100"), Decimal::ZERO, today), DepletionEstimate::Unknown);
        assert_eq!(estimate_depletion(Decimal::ZERO, dec("10"), today), DepletionEstimate::Unknown);
    }

    #[test]
    fn test_huge_price_does_not_break_derivations() {
        let today = date(2024, 6, 1);
        let huge = "1000000000000000000000000000";
        let beans = vec![
            stocked("1", "0.01", "0.01", huge),
            stocked("2", "0.01", "0.01", huge),
            stocked("3", "200", "100", "100"),
        ];
        let notes = vec![
            quick_note("n1", 1_000, &beans[0], "15"),
            quick_note("n2", 2_000, &beans[1], "15"),
            quick_note("n3", 3_000, &beans[2], "10"),
        ];

        assert_eq!(price_per_gram(&beans[0]), Decimal::ZERO);
        let sorted = sort_beans(&beans, SortKey::PricePerGramDesc, today);
        assert_eq!(sorted.len(), 3);
        assert_eq!(sorted[0].id, "3");

        let query = ConsumptionQuery::new(BeanSelector::All, TimeWindow::AllTime, 10_000);
        let summary = aggregate_consumption(&notes, &beans, &query);
        assert_eq!(summary.total.grams, dec("40"));
        assert_eq!(summary.total.cost, dec("5"));

        let snapshot = compose_statistics(&beans, &notes, &options(today, false));
        assert_eq!(snapshot.overview.total_beans, 3);
        assert_eq!(snapshot.overview.average_price_per_gram, Decimal::ZERO);
        assert_eq!(snapshot.overview.total_cost, dec("2000000000000000000000000100"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn bean_strategy() -> impl Strategy<Value = Bean> {
        (
            "[a-z]{3,8}",
            prop::option::of(0u32..1000),
            prop::option::of(0u32..1000),
            prop::option::of(0u32..500),
            prop::option::of(proptest::sample::select(RoastLevel::ALL.to_vec())),
            prop::collection::vec("[A-Z][a-z]{2,6}", 0..4),
        )
            .prop_map(|(name, capacity, remaining, price, level, flavor)| {
                let mut bean = Bean::new(name.clone(), name, 0);
                bean.capacity = capacity.map(|c| Quantity::parse(c.to_string()));
                bean.remaining = remaining.map(|r| Quantity::parse(r.to_string()));
                bean.price = price.map(|p| Quantity::parse(p.to_string()));
                bean.roast_level = level;
                bean.flavor = flavor;
                bean.clamp_remaining();
                bean
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Composing twice over the same records serializes identically
        #[test]
        fn prop_statistics_idempotent(beans in prop::collection::vec(bean_strategy(), 0..12)) {
            let opts = options(date(2024, 6, 1), false);
            let first = serde_json::to_string(&compose_statistics(&beans, &[], &opts)).unwrap();
            let second = serde_json::to_string(&compose_statistics(&beans, &[], &opts)).unwrap();
            prop_assert_eq!(first, second);
        }

        /// Clamped beans never hold more than their capacity
        #[test]
        fn prop_clamp_invariant(bean in bean_strategy()) {
            if let (Some(cap), Some(rem)) = (bean.capacity_grams(), bean.remaining_grams()) {
                prop_assert!(rem <= cap);
            }
        }

        /// Excluding empties removes exactly the empty beans
        #[test]
        fn prop_exclude_empty_counts(beans in prop::collection::vec(bean_strategy(), 0..12)) {
            let all = compose_statistics(&beans, &[], &options(date(2024, 6, 1), false));
            let kept = compose_statistics(&beans, &[], &options(date(2024, 6, 1), true));
            let empties = beans.iter().filter(|b| is_empty(b)).count();

            prop_assert_eq!(all.overview.empty_beans, empties);
            prop_assert_eq!(kept.overview.total_beans, beans.len() - empties);
            prop_assert_eq!(kept.overview.active_beans, all.overview.active_beans);
        }
    }
}
