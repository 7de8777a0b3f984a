//! CSV export of the bean inventory

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{calculate_freshness, price_per_gram, Bean, Language};

use crate::error::{AppError, AppResult};

/// One exported bean
#[derive(Debug, Serialize)]
pub struct BeanCsvRow {
    pub id: String,
    pub name: String,
    pub roaster: String,
    pub bean_type: String,
    pub roast_level: String,
    pub roast_date: String,
    pub capacity: String,
    pub remaining: String,
    pub price: String,
    pub price_per_gram: Decimal,
    pub freshness: String,
    pub remaining_days: i64,
    pub origins: String,
    pub processes: String,
    pub varieties: String,
    pub flavor: String,
    pub rating: String,
}

impl BeanCsvRow {
    pub fn from_bean(bean: &Bean, today: NaiveDate, language: Language) -> Self {
        let freshness = calculate_freshness(bean, today);
        let raw = |q: &Option<shared::Quantity>| {
            q.as_ref().map(|q| q.raw().to_string()).unwrap_or_default()
        };

        Self {
            id: bean.id.clone(),
            name: bean.name.clone(),
            roaster: bean.roaster_name().unwrap_or_default().to_string(),
            bean_type: bean
                .bean_type
                .map(|t| t.as_str().to_string())
                .unwrap_or_default(),
            roast_level: bean
                .roast_level
                .map(|l| l.label(language).to_string())
                .unwrap_or_default(),
            roast_date: bean
                .roast_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            capacity: raw(&bean.capacity),
            remaining: raw(&bean.remaining),
            price: raw(&bean.price),
            price_per_gram: price_per_gram(bean).round_dp(2),
            freshness: freshness.phase.as_str().to_string(),
            remaining_days: freshness.remaining_days,
            origins: bean.origins().collect::<Vec<_>>().join("/"),
            processes: bean.processes().collect::<Vec<_>>().join("/"),
            varieties: bean.varieties().collect::<Vec<_>>().join("/"),
            flavor: bean.flavor.join("/"),
            rating: bean
                .overall_rating
                .map(|r| r.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Serialize rows as CSV with a header line
pub fn export_to_csv<T: Serialize>(data: &[T]) -> AppResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    for record in data {
        wtr.serialize(record)
            .map_err(|e| AppError::Internal(format!("CSV serialization error: {}", e)))?;
    }
    let bytes = wtr
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV writer error: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::Internal(format!("UTF-8 conversion error: {}", e)))
}
