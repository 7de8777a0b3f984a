//! User settings service

use rust_decimal::Decimal;
use shared::Settings;
use tracing::info;

use super::Records;
use crate::error::{AppError, AppResult};

const MAX_USERNAME_LENGTH: usize = 50;
const MAX_DECREMENT_PRESETS: usize = 10;

#[derive(Clone)]
pub struct SettingsService {
    records: Records,
}

impl SettingsService {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    pub async fn get(&self) -> Settings {
        self.records.settings().await
    }

    /// Replace the stored settings. Presets are deduplicated and sorted.
    pub async fn update(&self, mut settings: Settings) -> AppResult<Settings> {
        settings.username = settings.username.trim().to_string();
        if settings.username.chars().count() > MAX_USERNAME_LENGTH {
            return Err(AppError::Validation {
                field: "username".to_string(),
                message: format!("Username must be at most {} characters", MAX_USERNAME_LENGTH),
                message_zh: format!("用户名不能超过 {} 个字符", MAX_USERNAME_LENGTH),
            });
        }

        if let Some(bad) = settings
            .decrement_presets
            .iter()
            .find(|p| **p <= Decimal::ZERO)
        {
            return Err(AppError::Validation {
                field: "decrementPresets".to_string(),
                message: format!("Decrement presets must be positive, got {}", bad),
                message_zh: format!("快捷扣除量必须大于 0，当前为 {}", bad),
            });
        }
        settings.decrement_presets.sort();
        settings.decrement_presets.dedup();
        if settings.decrement_presets.len() > MAX_DECREMENT_PRESETS {
            return Err(AppError::Validation {
                field: "decrementPresets".to_string(),
                message: format!("At most {} decrement presets", MAX_DECREMENT_PRESETS),
                message_zh: format!("快捷扣除量最多 {} 个", MAX_DECREMENT_PRESETS),
            });
        }

        let _guard = self.records.lock_writes().await;
        let saved = self.records.save_settings(settings).await?;
        info!("Settings updated");
        Ok(saved)
    }
}
