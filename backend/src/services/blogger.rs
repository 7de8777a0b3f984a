//! Bundled blogger recommendation dataset
//!
//! Parsed once at startup into beans and served read-only through the same
//! filter and sort engine as the user's own inventory.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use shared::{
    sort_beans_in_place, validate_rating, Bean, BeanFilter, BeanType, BlendComponent, Quantity,
    RoastLevel, SortKey,
};
use tracing::{info, warn};

use super::beans::BeanView;
use crate::error::{AppError, AppResult};

const BLOGGER_CSV: &str = include_str!("../../data/blogger_beans.csv");

/// One line of the dataset
#[derive(Debug, Deserialize)]
struct BloggerRow {
    name: String,
    roaster: String,
    #[serde(rename = "type")]
    bean_type: String,
    roast_level: String,
    origin: String,
    process: String,
    variety: String,
    capacity: String,
    price: String,
    rating: Option<f64>,
    flavor: String,
    comment: String,
}

impl BloggerRow {
    fn into_bean(self, index: usize) -> Bean {
        let mut bean = Bean::new(format!("blogger-{}", index), self.name.trim(), 0);
        bean.roaster = non_blank(&self.roaster);
        bean.bean_type = BeanType::parse(&self.bean_type);
        bean.roast_level = RoastLevel::parse(&self.roast_level);
        bean.roast_label = non_blank(&self.roast_level);
        bean.components = components(&self.origin, &self.process, &self.variety);
        bean.capacity = non_blank(&self.capacity).map(Quantity::parse);
        bean.price = non_blank(&self.price).map(Quantity::parse);
        bean.overall_rating = self.rating.filter(|r| validate_rating(*r).is_ok());
        bean.flavor = split(&self.flavor);
        bean.rating_notes = non_blank(&self.comment);
        bean
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn split(raw: &str) -> Vec<String> {
    raw.split('/').filter_map(non_blank).collect()
}

/// Slash-separated columns line up by position into blend components
fn components(origin: &str, process: &str, variety: &str) -> Vec<BlendComponent> {
    let origins = split(origin);
    let processes = split(process);
    let varieties = split(variety);
    let count = origins.len().max(processes.len()).max(varieties.len());

    (0..count)
        .map(|i| BlendComponent {
            origin: origins.get(i).cloned(),
            process: processes.get(i).cloned(),
            variety: varieties.get(i).cloned(),
            percentage: None,
        })
        .collect()
}

/// Parse dataset text, skipping rows that do not fit the column layout
pub fn parse_dataset(text: &str) -> AppResult<Vec<Bean>> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let mut beans = Vec::new();

    for (index, row) in reader.deserialize::<BloggerRow>().enumerate() {
        match row {
            Ok(row) if !row.name.trim().is_empty() => beans.push(row.into_bean(index)),
            Ok(_) => warn!("Skipping blogger row {} without a name", index + 1),
            Err(e) if e.is_io_error() => {
                return Err(AppError::Internal(format!("Blogger dataset read error: {}", e)))
            }
            Err(e) => warn!("Skipping malformed blogger row {}: {}", index + 1, e),
        }
    }
    Ok(beans)
}

/// Read-only recommendation list
#[derive(Clone)]
pub struct BloggerService {
    beans: Arc<Vec<Bean>>,
}

impl BloggerService {
    /// Load the dataset compiled into the binary
    pub fn bundled() -> AppResult<Self> {
        let beans = parse_dataset(BLOGGER_CSV)?;
        info!("Loaded {} blogger beans", beans.len());
        Ok(Self {
            beans: Arc::new(beans),
        })
    }

    /// Filtered list, rating descending unless another key is given
    pub fn list(
        &self,
        filter: &BeanFilter,
        sort: Option<SortKey>,
        today: NaiveDate,
    ) -> Vec<BeanView> {
        let mut selected = filter.apply(&self.beans, today);
        sort_beans_in_place(&mut selected, sort.unwrap_or(SortKey::RatingDesc), today);
        selected
            .into_iter()
            .map(|bean| BeanView::new(bean, today))
            .collect()
    }
}
