//! Validation utilities for bean records
//!
//! Derivations never fail; these checks run where user input enters the
//! system, before anything is persisted.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Bean, BlendComponent, FlavorWindow};
use crate::types::{sum_decimals, Quantity};

/// Highest overall rating
pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Bean name is required")]
    MissingName,

    #[error("Rating must be between 0 and 5 in half steps, got {0}")]
    InvalidRating(f64),

    #[error("Blend percentage must be a number between 0 and 100, got '{0}'")]
    InvalidPercentage(String),

    #[error("Flavor window must satisfy 0 <= start < end, got {start}..{end}")]
    InvalidFlavorWindow { start: i64, end: i64 },
}

// ============================================================================
// Inventory quantities
// ============================================================================

/// Keep `remaining` within `0..=capacity`.
///
/// Only numeric values are compared; a non-numeric side leaves the input
/// untouched apart from the lower bound.
pub fn clamp_remaining(capacity: Option<&Quantity>, remaining: Quantity) -> Quantity {
    let Some(value) = remaining.value() else {
        return remaining;
    };
    if value < Decimal::ZERO {
        return Quantity::from_decimal(Decimal::ZERO);
    }
    match capacity.and_then(Quantity::value) {
        Some(cap) if value > cap => Quantity::from_decimal(cap),
        _ => remaining,
    }
}

/// Remaining amount after taking `amount` grams from `bean`.
///
/// Starts from the capacity when no remaining amount is recorded and stops
/// at zero.
pub fn decrement_remaining(bean: &Bean, amount: Decimal) -> Quantity {
    let current = bean
        .remaining_grams()
        .or_else(|| bean.capacity_grams())
        .unwrap_or(Decimal::ZERO);
    let left = current
        .checked_sub(amount)
        .unwrap_or(Decimal::ZERO)
        .max(Decimal::ZERO);
    clamp_remaining(bean.capacity.as_ref(), Quantity::from_decimal(left))
}

impl Bean {
    /// Apply [`clamp_remaining`] to this bean in place
    pub fn clamp_remaining(&mut self) {
        if let Some(remaining) = self.remaining.take() {
            self.remaining = Some(clamp_remaining(self.capacity.as_ref(), remaining));
        }
    }
}

// ============================================================================
// Bean fields
// ============================================================================

/// Ratings run 0-5 in half-star steps
pub fn validate_rating(rating: f64) -> Result<(), ValidationError> {
    let in_range = (0.0..=MAX_RATING).contains(&rating);
    if !in_range || (rating * 2.0).fract() != 0.0 {
        return Err(ValidationError::InvalidRating(rating));
    }
    Ok(())
}

/// Each stated percentage must be numeric and within 0-100
pub fn validate_blend_percentages(components: &[BlendComponent]) -> Result<(), ValidationError> {
    let hundred = Decimal::from(100);
    for percentage in components.iter().filter_map(|c| c.percentage.as_ref()) {
        match percentage.value() {
            Some(p) if p >= Decimal::ZERO && p <= hundred => {}
            _ => return Err(ValidationError::InvalidPercentage(percentage.raw().to_string())),
        }
    }
    Ok(())
}

/// Sum of stated blend percentages
pub fn blend_percentage_total(components: &[BlendComponent]) -> Decimal {
    sum_decimals(
        components
            .iter()
            .filter_map(|c| c.percentage.as_ref().and_then(Quantity::value)),
    )
}

/// Whether the stated percentages add up to 100; blends without any
/// percentages count as complete. Used for warnings only.
pub fn is_blend_complete(components: &[BlendComponent]) -> bool {
    let stated = components.iter().any(|c| c.percentage.is_some());
    !stated || blend_percentage_total(components) == Decimal::from(100)
}

pub fn validate_flavor_window(window: &FlavorWindow) -> Result<(), ValidationError> {
    match *window {
        FlavorWindow::Default => Ok(()),
        FlavorWindow::Custom { start_day, end_day } => {
            if start_day < 0 || end_day < 0 || start_day >= end_day {
                Err(ValidationError::InvalidFlavorWindow {
                    start: start_day,
                    end: end_day,
                })
            } else {
                Ok(())
            }
        }
    }
}

/// All field checks for a bean about to be stored
pub fn validate_bean(bean: &Bean) -> Result<(), ValidationError> {
    if bean.name.trim().is_empty() {
        return Err(ValidationError::MissingName);
    }
    if let Some(rating) = bean.overall_rating {
        validate_rating(rating)?;
    }
    validate_blend_percentages(&bean.components)?;
    validate_flavor_window(&bean.flavor_window)
}
