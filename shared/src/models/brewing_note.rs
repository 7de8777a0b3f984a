//! Brewing note models

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::Quantity;

const SOURCE_QUICK_DECREMENT: &str = "quick-decrement";
const SOURCE_CAPACITY_ADJUSTMENT: &str = "capacity-adjustment";

/// A coffee consumption event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "NoteRecord", into = "NoteRecord")]
pub struct BrewingNote {
    pub id: String,
    /// Creation time in ms
    pub timestamp: i64,
    /// Preferred link to the consumed bean
    pub bean_id: Option<String>,
    /// Snapshot of the bean at brew time; `name` is the fallback link
    pub bean_info: Option<CoffeeBeanInfo>,
    pub source: NoteSource,
    pub notes: Option<String>,
}

/// What produced the note
#[derive(Debug, Clone, PartialEq)]
pub enum NoteSource {
    /// A full brew log
    OrdinaryBrew(Brew),
    /// Grams used without a full brew log
    QuickDecrement { amount: Quantity },
    /// Inventory correction, not consumption
    CapacityAdjustment {
        original_amount: Option<Quantity>,
        new_amount: Option<Quantity>,
    },
}

impl NoteSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            NoteSource::OrdinaryBrew(_) => "brew",
            NoteSource::QuickDecrement { .. } => SOURCE_QUICK_DECREMENT,
            NoteSource::CapacityAdjustment { .. } => SOURCE_CAPACITY_ADJUSTMENT,
        }
    }
}

/// Details of a full brew, carried through for display
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Brew {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<String>,
    #[serde(default)]
    pub params: BrewParams,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    /// Taste axes (acidity, sweetness, ...) on the user's scale
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub taste: BTreeMap<String, f64>,
    /// Seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_time: Option<f64>,
}

/// Free-text brew parameters as entered
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrewParams {
    /// Dose, e.g. "15g"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coffee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub water: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grind_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp: Option<String>,
}

/// Bean snapshot embedded in a note
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoffeeBeanInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roast_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roast_date: Option<String>,
}

impl BrewingNote {
    /// Name used as the fallback bean link
    pub fn bean_name(&self) -> Option<&str> {
        self.bean_info
            .as_ref()
            .map(|info| info.name.as_str())
            .filter(|name| !name.is_empty())
    }

    pub fn is_capacity_adjustment(&self) -> bool {
        matches!(self.source, NoteSource::CapacityAdjustment { .. })
    }

    pub fn is_quick_decrement(&self) -> bool {
        matches!(self.source, NoteSource::QuickDecrement { .. })
    }
}

/// Storage shape of a note (camelCase JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NoteRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bean_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    coffee_bean_info: Option<CoffeeBeanInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quick_decrement_amount: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    change_record: Option<ChangeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    equipment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    params: Option<BrewParams>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating: Option<f64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    taste: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    total_time: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChangeRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity_adjustment: Option<CapacityAdjustmentRecord>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CapacityAdjustmentRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    original_amount: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    new_amount: Option<Quantity>,
}

impl From<NoteRecord> for BrewingNote {
    fn from(r: NoteRecord) -> Self {
        let source = match r.source.as_deref() {
            Some(SOURCE_QUICK_DECREMENT) => NoteSource::QuickDecrement {
                amount: r
                    .quick_decrement_amount
                    .unwrap_or_else(|| Quantity::parse("")),
            },
            Some(SOURCE_CAPACITY_ADJUSTMENT) => {
                let adjustment = r
                    .change_record
                    .and_then(|c| c.capacity_adjustment)
                    .unwrap_or_default();
                NoteSource::CapacityAdjustment {
                    original_amount: adjustment.original_amount,
                    new_amount: adjustment.new_amount,
                }
            }
            _ => NoteSource::OrdinaryBrew(Brew {
                method: r.method,
                equipment: r.equipment,
                params: r.params.unwrap_or_default(),
                rating: r.rating,
                taste: r.taste,
                total_time: r.total_time,
            }),
        };

        BrewingNote {
            id: r.id,
            timestamp: r.timestamp,
            bean_id: r.bean_id.filter(|id| !id.is_empty()),
            bean_info: r.coffee_bean_info,
            source,
            notes: r.notes,
        }
    }
}

impl From<BrewingNote> for NoteRecord {
    fn from(n: BrewingNote) -> Self {
        let mut record = NoteRecord {
            id: n.id,
            timestamp: n.timestamp,
            bean_id: n.bean_id,
            coffee_bean_info: n.bean_info,
            notes: n.notes,
            ..Default::default()
        };

        match n.source {
            NoteSource::OrdinaryBrew(brew) => {
                record.method = brew.method;
                record.equipment = brew.equipment;
                record.params = Some(brew.params);
                record.rating = brew.rating;
                record.taste = brew.taste;
                record.total_time = brew.total_time;
            }
            NoteSource::QuickDecrement { amount } => {
                record.source = Some(SOURCE_QUICK_DECREMENT.to_string());
                record.params = Some(BrewParams {
                    coffee: Some(format!("{}g", amount.raw())),
                    ..Default::default()
                });
                record.quick_decrement_amount = Some(amount);
            }
            NoteSource::CapacityAdjustment {
                original_amount,
                new_amount,
            } => {
                record.source = Some(SOURCE_CAPACITY_ADJUSTMENT.to_string());
                record.change_record = Some(ChangeRecord {
                    capacity_adjustment: Some(CapacityAdjustmentRecord {
                        original_amount,
                        new_amount,
                    }),
                });
            }
        }

        record
    }
}
