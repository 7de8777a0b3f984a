//! Coffee bean inventory models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::RoastLevel;
use crate::types::{parse_calendar_date, Language, Quantity};

/// A coffee bean inventory record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BeanRecord", into = "BeanRecord")]
pub struct Bean {
    pub id: String,
    /// Creation time in ms, also used as "last modified"
    pub timestamp: i64,
    pub name: String,
    /// Total grams purchased
    pub capacity: Option<Quantity>,
    /// Grams left, never above `capacity`
    pub remaining: Option<Quantity>,
    /// Total cost for `capacity`
    pub price: Option<Quantity>,
    pub roast_date: Option<NaiveDate>,
    pub roast_level: Option<RoastLevel>,
    /// Roast level as entered, so free-typed labels survive a save
    pub roast_label: Option<String>,
    pub flavor_window: FlavorWindow,
    pub storage: StorageState,
    /// One entry for single origins, several for blends
    pub components: Vec<BlendComponent>,
    pub bean_type: Option<BeanType>,
    pub roaster: Option<String>,
    pub flavor: Vec<String>,
    pub notes: Option<String>,
    pub image: Option<String>,
    /// 0-5 in half-star steps
    pub overall_rating: Option<f64>,
    pub rating_notes: Option<String>,
}

/// Peak flavor window, in days after the roast date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FlavorWindow {
    /// Derived from the roast level
    #[default]
    Default,
    Custom { start_day: i64, end_day: i64 },
}

/// Storage condition overriding the freshness computation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageState {
    #[default]
    Normal,
    /// Ordered but not yet received
    InTransit,
    Frozen,
}

/// Intended brewing style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeanType {
    Filter,
    Espresso,
}

impl BeanType {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "filter" | "手冲" => Some(BeanType::Filter),
            "espresso" | "意式" => Some(BeanType::Espresso),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BeanType::Filter => "filter",
            BeanType::Espresso => "espresso",
        }
    }
}

/// Single origin vs blend, derived from the component count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BeanKind {
    SingleOrigin,
    Blend,
}

/// One constituent of a bean
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlendComponent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    /// Share of the blend, 0-100
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage: Option<Quantity>,
}

impl BlendComponent {
    fn normalized(self) -> Self {
        Self {
            origin: non_blank(self.origin),
            process: non_blank(self.process),
            variety: non_blank(self.variety),
            percentage: self.percentage.filter(|p| !p.raw().trim().is_empty()),
        }
    }

    fn is_blank(&self) -> bool {
        self.origin.is_none()
            && self.process.is_none()
            && self.variety.is_none()
            && self.percentage.is_none()
    }
}

impl Bean {
    /// An empty record with the given identity
    pub fn new(id: impl Into<String>, name: impl Into<String>, timestamp: i64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            name: name.into(),
            capacity: None,
            remaining: None,
            price: None,
            roast_date: None,
            roast_level: None,
            roast_label: None,
            flavor_window: FlavorWindow::Default,
            storage: StorageState::Normal,
            components: Vec::new(),
            bean_type: None,
            roaster: None,
            flavor: Vec::new(),
            notes: None,
            image: None,
            overall_rating: None,
            rating_notes: None,
        }
    }

    pub fn kind(&self) -> BeanKind {
        if self.components.len() > 1 {
            BeanKind::Blend
        } else {
            BeanKind::SingleOrigin
        }
    }

    pub fn capacity_grams(&self) -> Option<Decimal> {
        self.capacity.as_ref().and_then(Quantity::value)
    }

    pub fn remaining_grams(&self) -> Option<Decimal> {
        self.remaining.as_ref().and_then(Quantity::value)
    }

    pub fn price_value(&self) -> Option<Decimal> {
        self.price.as_ref().and_then(Quantity::value)
    }

    /// Price per gram, when both price and a non-zero capacity are numeric
    /// and the quotient fits in a `Decimal`
    pub fn unit_price(&self) -> Option<Decimal> {
        let price = self.price_value()?;
        let capacity = self.capacity_grams()?;
        price.checked_div(capacity)
    }

    /// Roast level text to store: the entered label while it still reads as
    /// `roast_level`, otherwise the canonical label
    pub fn roast_level_text(&self) -> Option<String> {
        match &self.roast_label {
            Some(raw) if RoastLevel::parse(raw) == self.roast_level => Some(raw.clone()),
            _ => self
                .roast_level
                .map(|l| l.label(Language::Chinese).to_string()),
        }
    }

    /// Explicit roaster, else the first word of the name
    pub fn roaster_name(&self) -> Option<&str> {
        match self.roaster.as_deref().map(str::trim) {
            Some(r) if !r.is_empty() => Some(r),
            _ => self.name.split_whitespace().next(),
        }
    }

    pub fn origins(&self) -> impl Iterator<Item = &str> {
        self.components.iter().filter_map(|c| c.origin.as_deref())
    }

    pub fn processes(&self) -> impl Iterator<Item = &str> {
        self.components.iter().filter_map(|c| c.process.as_deref())
    }

    pub fn varieties(&self) -> impl Iterator<Item = &str> {
        self.components.iter().filter_map(|c| c.variety.as_deref())
    }

    pub fn is_in_transit(&self) -> bool {
        self.storage == StorageState::InTransit
    }

    pub fn is_frozen(&self) -> bool {
        self.storage == StorageState::Frozen
    }
}

/// Storage shape of a bean (camelCase JSON)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BeanRecord {
    #[serde(default)]
    id: String,
    #[serde(default)]
    timestamp: i64,
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    capacity: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    remaining: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    price: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roast_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roast_level: Option<String>,
    #[serde(default)]
    start_day: i64,
    #[serde(default)]
    end_day: i64,
    #[serde(default)]
    is_in_transit: bool,
    #[serde(default)]
    is_frozen: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    process: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    variety: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    blend_components: Vec<BlendComponent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bean_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    roaster: Option<String>,
    #[serde(default)]
    flavor: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    overall_rating: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    rating_notes: Option<String>,
}

impl From<BeanRecord> for Bean {
    fn from(r: BeanRecord) -> Self {
        let mut components: Vec<BlendComponent> = r
            .blend_components
            .into_iter()
            .map(BlendComponent::normalized)
            .filter(|c| !c.is_blank())
            .collect();
        if components.is_empty() {
            let flat = BlendComponent {
                origin: r.origin,
                process: r.process,
                variety: r.variety,
                percentage: None,
            }
            .normalized();
            if !flat.is_blank() {
                components.push(flat);
            }
        }

        let flavor_window = if r.start_day == 0 && r.end_day == 0 {
            FlavorWindow::Default
        } else {
            FlavorWindow::Custom {
                start_day: r.start_day,
                end_day: r.end_day,
            }
        };

        let storage = if r.is_in_transit {
            StorageState::InTransit
        } else if r.is_frozen {
            StorageState::Frozen
        } else {
            StorageState::Normal
        };

        Bean {
            id: r.id,
            timestamp: r.timestamp,
            name: r.name,
            capacity: r.capacity.filter(|q| !q.raw().trim().is_empty()),
            remaining: r.remaining.filter(|q| !q.raw().trim().is_empty()),
            price: r.price.filter(|q| !q.raw().trim().is_empty()),
            roast_date: r.roast_date.as_deref().and_then(parse_calendar_date),
            roast_level: r.roast_level.as_deref().and_then(RoastLevel::parse),
            roast_label: non_blank(r.roast_level),
            flavor_window,
            storage,
            components,
            bean_type: r.bean_type.as_deref().and_then(BeanType::parse),
            roaster: non_blank(r.roaster),
            flavor: r
                .flavor
                .into_iter()
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect(),
            notes: r.notes,
            image: r.image,
            overall_rating: r.overall_rating,
            rating_notes: r.rating_notes,
        }
    }
}

impl From<Bean> for BeanRecord {
    fn from(b: Bean) -> Self {
        let roast_level = b.roast_level_text();
        let (start_day, end_day) = match b.flavor_window {
            FlavorWindow::Default => (0, 0),
            FlavorWindow::Custom { start_day, end_day } => (start_day, end_day),
        };

        let single = match b.components.as_slice() {
            [only] => Some(only.clone()),
            _ => None,
        };
        let blend_components = if single.is_some() {
            Vec::new()
        } else {
            b.components
        };
        let single = single.unwrap_or_default();

        BeanRecord {
            id: b.id,
            timestamp: b.timestamp,
            name: b.name,
            capacity: b.capacity,
            remaining: b.remaining,
            price: b.price,
            roast_date: b.roast_date.map(|d| d.format("%Y-%m-%d").to_string()),
            roast_level,
            start_day,
            end_day,
            is_in_transit: b.storage == StorageState::InTransit,
            is_frozen: b.storage == StorageState::Frozen,
            origin: single.origin,
            process: single.process,
            variety: single.variety,
            blend_components,
            bean_type: b.bean_type.map(|t| t.as_str().to_string()),
            roaster: b.roaster,
            flavor: b.flavor,
            notes: b.notes,
            image: b.image,
            overall_rating: b.overall_rating,
            rating_notes: b.rating_notes,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
