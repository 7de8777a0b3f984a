//! Bean list filtering

use std::collections::{BTreeSet, HashSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::freshness::{calculate_freshness, FreshnessPhase};
use crate::models::{Bean, BeanType};
use crate::statistics::{is_empty, UNKNOWN_LABEL};

/// Secondary filter dimension picked in the list view
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum FilterMode {
    #[default]
    All,
    Variety(String),
    Origin(String),
    Phase(FreshnessPhase),
    Roaster(String),
}

/// Filter applied to the bean list before sorting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeanFilter {
    /// Restrict to one bean type; `None` keeps all
    pub bean_type: Option<BeanType>,
    pub include_empty: bool,
    pub mode: FilterMode,
}

impl Default for BeanFilter {
    fn default() -> Self {
        Self {
            bean_type: None,
            include_empty: true,
            mode: FilterMode::All,
        }
    }
}

impl BeanFilter {
    pub fn matches(&self, bean: &Bean, today: NaiveDate) -> bool {
        if let Some(bean_type) = self.bean_type {
            if bean.bean_type != Some(bean_type) {
                return false;
            }
        }
        if !self.include_empty && is_empty(bean) {
            return false;
        }

        match &self.mode {
            FilterMode::All => true,
            FilterMode::Variety(v) => matches_label(bean.varieties(), v),
            FilterMode::Origin(o) => matches_label(bean.origins(), o),
            FilterMode::Phase(phase) => calculate_freshness(bean, today).phase == *phase,
            FilterMode::Roaster(r) => bean.roaster_name().unwrap_or(UNKNOWN_LABEL) == r,
        }
    }

    /// Beans passing the filter, in input order
    pub fn apply(&self, beans: &[Bean], today: NaiveDate) -> Vec<Bean> {
        beans
            .iter()
            .filter(|b| self.matches(b, today))
            .cloned()
            .collect()
    }
}

/// A bean matches a label when any component carries it; the unknown label
/// matches beans with no value at all
fn matches_label<'a>(mut values: impl Iterator<Item = &'a str>, label: &str) -> bool {
    let mut seen = false;
    let found = values.any(|v| {
        seen = true;
        v == label
    });
    found || (!seen && label == UNKNOWN_LABEL)
}

/// Distinct values offered by each filter mode
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FilterOptions {
    pub varieties: Vec<String>,
    pub origins: Vec<String>,
    pub roasters: Vec<String>,
    pub phases: Vec<FreshnessPhase>,
}

/// Collect the values the filter modes can choose from, sorted and deduplicated
pub fn available_values(beans: &[Bean], today: NaiveDate) -> FilterOptions {
    let mut varieties = BTreeSet::new();
    let mut origins = BTreeSet::new();
    let mut roasters = BTreeSet::new();
    let mut phases = HashSet::new();

    for bean in beans {
        varieties.extend(bean.varieties().map(str::to_string));
        origins.extend(bean.origins().map(str::to_string));
        if let Some(roaster) = bean.roaster_name() {
            roasters.insert(roaster.to_string());
        }
        phases.insert(calculate_freshness(bean, today).phase);
    }

    FilterOptions {
        varieties: varieties.into_iter().collect(),
        origins: origins.into_iter().collect(),
        roasters: roasters.into_iter().collect(),
        phases: FreshnessPhase::ALL
            .into_iter()
            .filter(|p| phases.contains(p))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BlendComponent, StorageState};
    use crate::types::Quantity;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn bean(id: &str, origin: Option<&str>, variety: Option<&str>) -> Bean {
        let mut b = Bean::new(id, format!("Roaster{id} {id}"), 0);
        if origin.is_some() || variety.is_some() {
            b.components.push(BlendComponent {
                origin: origin.map(str::to_string),
                variety: variety.map(str::to_string),
                ..Default::default()
            });
        }
        b
    }

    #[test]
    fn test_default_filter_keeps_everything() {
        let beans = vec![bean("a", None, None), bean("b", Some("Kenya"), None)];
        assert_eq!(BeanFilter::default().apply(&beans, today()).len(), 2);
    }

    #[test]
    fn test_type_and_empty_filters() {
        let mut espresso = bean("e", None, None);
        espresso.bean_type = Some(BeanType::Espresso);
        let mut empty = bean("f", None, None);
        empty.bean_type = Some(BeanType::Filter);
        empty.capacity = Some(Quantity::parse("200"));
        empty.remaining = Some(Quantity::parse("0"));
        let beans = vec![espresso, empty];

        let filter = BeanFilter {
            bean_type: Some(BeanType::Filter),
            ..Default::default()
        };
        assert_eq!(filter.apply(&beans, today())[0].id, "f");

        let filter = BeanFilter {
            include_empty: false,
            ..Default::default()
        };
        let kept = filter.apply(&beans, today());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "e");
    }

    #[test]
    fn test_origin_and_unknown_variety() {
        let beans = vec![
            bean("a", Some("Kenya"), Some("SL28")),
            bean("b", Some("Ethiopia"), None),
        ];

        let by_origin = BeanFilter {
            mode: FilterMode::Origin("Kenya".into()),
            ..Default::default()
        };
        assert_eq!(by_origin.apply(&beans, today())[0].id, "a");

        let unknown = BeanFilter {
            mode: FilterMode::Variety(UNKNOWN_LABEL.into()),
            ..Default::default()
        };
        let kept = unknown.apply(&beans, today());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, "b");
    }

    #[test]
    fn test_phase_filter() {
        let mut frozen = bean("a", None, None);
        frozen.storage = StorageState::Frozen;
        let beans = vec![frozen, bean("b", None, None)];

        let filter = BeanFilter {
            mode: FilterMode::Phase(FreshnessPhase::Unknown),
            ..Default::default()
        };
        assert_eq!(filter.apply(&beans, today())[0].id, "b");
    }

    #[test]
    fn test_available_values() {
        let beans = vec![
            bean("a", Some("Kenya"), Some("SL28")),
            bean("b", Some("Ethiopia"), None),
            bean("c", Some("Kenya"), None),
        ];
        let options = available_values(&beans, today());
        assert_eq!(options.origins, vec!["Ethiopia", "Kenya"]);
        assert_eq!(options.varieties, vec!["SL28"]);
        assert_eq!(options.roasters.len(), 3);
        assert_eq!(options.phases, vec![FreshnessPhase::Unknown]);
    }
}
