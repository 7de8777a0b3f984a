//! Bean inventory service
//!
//! All mutations run under the records write lock so concurrent requests
//! never interleave their read-modify-write of the bean list.

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use shared::{
    available_values, calculate_freshness, clamp_remaining, decrement_remaining, new_record_id,
    price_per_gram, sort_beans_in_place, validate_bean, Bean, BeanFilter, BrewingNote,
    CoffeeBeanInfo, FilterOptions, Freshness, NoteSource, Quantity, SortKey,
};
use tracing::info;
use validator::Validate;

use super::export::{export_to_csv, BeanCsvRow};
use super::{now_ms, Records};
use crate::error::{AppError, AppResult};

/// Longest accepted bean name, in characters
pub const MAX_NAME_LENGTH: usize = 200;

/// Bean service for inventory records
#[derive(Clone)]
pub struct BeanService {
    records: Records,
}

/// A bean with its derived list fields
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeanView {
    #[serde(flatten)]
    pub bean: Bean,
    pub freshness: Freshness,
    pub price_per_gram: Decimal,
}

impl BeanView {
    pub fn new(bean: Bean, today: NaiveDate) -> Self {
        Self {
            freshness: calculate_freshness(&bean, today),
            price_per_gram: price_per_gram(&bean).round_dp(4),
            bean,
        }
    }
}

/// Filter and order for a bean list
#[derive(Debug, Clone, Default)]
pub struct BeanListQuery {
    pub filter: BeanFilter,
    pub sort: SortKey,
}

/// Input for the quick-decrement action
#[derive(Debug, Deserialize, Validate)]
pub struct QuickDecrementInput {
    #[validate(custom = "validate_positive_grams")]
    pub amount: Decimal,
}

/// Input for a manual remaining-amount correction
#[derive(Debug, Deserialize, Validate)]
pub struct AdjustRemainingInput {
    #[validate(custom = "validate_non_negative_quantity")]
    pub remaining: Quantity,
}

/// Result of an inventory action that also logs a note
#[derive(Debug, Clone, Serialize)]
pub struct InventoryChange {
    pub bean: Bean,
    pub note: BrewingNote,
}

fn validate_positive_grams(amount: &Decimal) -> Result<(), validator::ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(validator::ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

fn validate_non_negative_quantity(quantity: &Quantity) -> Result<(), validator::ValidationError> {
    match quantity.value() {
        Some(v) if v >= Decimal::ZERO => Ok(()),
        _ => Err(validator::ValidationError::new("remaining_must_be_non_negative")),
    }
}

/// Bean fields copied into a note at logging time
pub fn bean_snapshot(bean: &Bean) -> CoffeeBeanInfo {
    CoffeeBeanInfo {
        name: bean.name.clone(),
        roast_level: bean.roast_level_text(),
        roast_date: bean.roast_date.map(|d| d.format("%Y-%m-%d").to_string()),
    }
}

fn check_bean(bean: &Bean) -> AppResult<()> {
    if bean.name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation {
            field: "name".to_string(),
            message: format!("Bean name must be at most {} characters", MAX_NAME_LENGTH),
            message_zh: format!("咖啡豆名称不能超过 {} 个字符", MAX_NAME_LENGTH),
        });
    }
    validate_bean(bean)?;
    Ok(())
}

impl BeanService {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    /// Filtered, sorted beans with derived fields
    pub async fn list(&self, query: &BeanListQuery, today: NaiveDate) -> Vec<BeanView> {
        let beans = self.records.beans().await;
        let mut selected = query.filter.apply(&beans, today);
        sort_beans_in_place(&mut selected, query.sort, today);
        selected
            .into_iter()
            .map(|bean| BeanView::new(bean, today))
            .collect()
    }

    /// Values offered by the list filter modes
    pub async fn filter_options(&self, today: NaiveDate) -> FilterOptions {
        available_values(&self.records.beans().await, today)
    }

    pub async fn get(&self, id: &str) -> AppResult<Bean> {
        self.records
            .beans()
            .await
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Bean".to_string()))
    }

    /// Store a new bean with a fresh id and timestamp
    pub async fn create(&self, mut bean: Bean) -> AppResult<Bean> {
        check_bean(&bean)?;
        bean.id = new_record_id();
        bean.timestamp = now_ms();
        bean.clamp_remaining();

        let _guard = self.records.lock_writes().await;
        let mut beans = (*self.records.beans().await).clone();
        beans.push(bean.clone());
        self.records.save_beans(beans).await?;

        info!("Created bean {} ({})", bean.id, bean.name);
        Ok(bean)
    }

    /// Replace a bean's fields, keeping its id
    pub async fn update(&self, id: &str, mut bean: Bean) -> AppResult<Bean> {
        check_bean(&bean)?;
        bean.id = id.to_string();
        bean.timestamp = now_ms();
        bean.clamp_remaining();

        let _guard = self.records.lock_writes().await;
        let mut beans = (*self.records.beans().await).clone();
        let slot = beans
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound("Bean".to_string()))?;
        *slot = bean.clone();
        self.records.save_beans(beans).await?;

        info!("Updated bean {}", id);
        Ok(bean)
    }

    /// Remove a bean. Its notes stay and fall back to the name snapshot.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.records.lock_writes().await;
        let mut beans = (*self.records.beans().await).clone();
        let before = beans.len();
        beans.retain(|b| b.id != id);
        if beans.len() == before {
            return Err(AppError::NotFound("Bean".to_string()));
        }
        self.records.save_beans(beans).await?;

        info!("Deleted bean {}", id);
        Ok(())
    }

    /// Take `amount` grams off a bean and log a quick-decrement note.
    ///
    /// The cached list is updated before the write; a failed write drops
    /// the cache so the next read reloads the stored state.
    pub async fn quick_decrement(
        &self,
        id: &str,
        input: QuickDecrementInput,
    ) -> AppResult<InventoryChange> {
        input.validate()?;

        let _guard = self.records.lock_writes().await;
        let mut beans = (*self.records.beans().await).clone();
        let bean = beans
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound("Bean".to_string()))?;

        bean.remaining = Some(decrement_remaining(bean, input.amount));
        let updated = bean.clone();

        self.records.cache_beans(Arc::new(beans.clone())).await;
        self.records.save_beans(beans).await?;

        let note = BrewingNote {
            id: new_record_id(),
            timestamp: now_ms(),
            bean_id: Some(updated.id.clone()),
            bean_info: Some(bean_snapshot(&updated)),
            source: NoteSource::QuickDecrement {
                amount: Quantity::from_decimal(input.amount),
            },
            notes: None,
        };
        self.append_note(note.clone()).await?;

        info!("Quick decrement of {}g on bean {}", input.amount, id);
        Ok(InventoryChange {
            bean: updated,
            note,
        })
    }

    /// Set the remaining amount directly and log a capacity-adjustment note
    pub async fn adjust_remaining(
        &self,
        id: &str,
        input: AdjustRemainingInput,
    ) -> AppResult<InventoryChange> {
        input.validate()?;

        let _guard = self.records.lock_writes().await;
        let mut beans = (*self.records.beans().await).clone();
        let bean = beans
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| AppError::NotFound("Bean".to_string()))?;

        let original = bean.remaining.clone();
        let adjusted = clamp_remaining(bean.capacity.as_ref(), input.remaining);
        bean.remaining = Some(adjusted.clone());
        let updated = bean.clone();
        self.records.save_beans(beans).await?;

        let note = BrewingNote {
            id: new_record_id(),
            timestamp: now_ms(),
            bean_id: Some(updated.id.clone()),
            bean_info: Some(bean_snapshot(&updated)),
            source: NoteSource::CapacityAdjustment {
                original_amount: original,
                new_amount: Some(adjusted),
            },
            notes: None,
        };
        self.append_note(note.clone()).await?;

        info!("Adjusted remaining of bean {}", id);
        Ok(InventoryChange {
            bean: updated,
            note,
        })
    }

    /// Inventory as CSV, in stored order
    pub async fn export_csv(&self, today: NaiveDate) -> AppResult<String> {
        let language = self.records.settings().await.language;
        let rows: Vec<BeanCsvRow> = self
            .records
            .beans()
            .await
            .iter()
            .map(|b| BeanCsvRow::from_bean(b, today, language))
            .collect();
        export_to_csv(&rows)
    }

    /// Caller must hold the write lock
    async fn append_note(&self, note: BrewingNote) -> AppResult<()> {
        let mut notes = (*self.records.notes().await).clone();
        notes.push(note);
        self.records.save_notes(notes).await?;
        Ok(())
    }
}
