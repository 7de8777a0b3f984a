//! Brewing note service

use std::collections::BTreeMap;

use serde::Deserialize;
use shared::{new_record_id, Brew, BrewParams, BrewingNote, CoffeeBeanInfo, NoteSource};
use tracing::{info, warn};
use validator::Validate;

use super::beans::bean_snapshot;
use super::{now_ms, Records};
use crate::error::{AppError, AppResult};

/// Brewing note service
#[derive(Clone)]
pub struct NoteService {
    records: Records,
}

/// Input for creating or updating an ordinary brew note
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default, rename_all = "camelCase")]
pub struct NoteInput {
    pub bean_id: Option<String>,
    /// Used only when `bean_id` does not resolve
    #[validate(length(max = 200))]
    pub bean_name: Option<String>,
    pub method: Option<String>,
    pub equipment: Option<String>,
    pub params: BrewParams,
    #[validate(range(min = 0.0, max = 5.0))]
    pub rating: Option<f64>,
    pub taste: BTreeMap<String, f64>,
    pub total_time: Option<f64>,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    /// Defaults to now
    pub timestamp: Option<i64>,
}

impl NoteService {
    pub fn new(records: Records) -> Self {
        Self { records }
    }

    /// All notes, newest first
    pub async fn list(&self) -> Vec<BrewingNote> {
        let mut notes = (*self.records.notes().await).clone();
        notes.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        notes
    }

    pub async fn get(&self, id: &str) -> AppResult<BrewingNote> {
        self.records
            .notes()
            .await
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Brewing note".to_string()))
    }

    pub async fn create(&self, input: NoteInput) -> AppResult<BrewingNote> {
        input.validate()?;

        let note = BrewingNote {
            id: new_record_id(),
            timestamp: input.timestamp.unwrap_or_else(now_ms),
            bean_id: None,
            bean_info: None,
            source: NoteSource::OrdinaryBrew(Brew::default()),
            notes: None,
        };
        let note = self.fill(note, input).await;

        let _guard = self.records.lock_writes().await;
        let mut notes = (*self.records.notes().await).clone();
        notes.push(note.clone());
        self.records.save_notes(notes).await?;

        info!("Created brewing note {}", note.id);
        Ok(note)
    }

    /// Replace a brew note's fields.
    ///
    /// Quick-decrement and capacity-adjustment entries keep their source;
    /// only their free-text notes change.
    pub async fn update(&self, id: &str, input: NoteInput) -> AppResult<BrewingNote> {
        input.validate()?;
        let existing = self.get(id).await?;

        let updated = if matches!(existing.source, NoteSource::OrdinaryBrew(_)) {
            let mut note = self.fill(existing, input).await;
            note.id = id.to_string();
            note
        } else {
            let mut note = existing;
            note.notes = input.notes;
            note
        };

        let _guard = self.records.lock_writes().await;
        let mut notes = (*self.records.notes().await).clone();
        let slot = notes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| AppError::NotFound("Brewing note".to_string()))?;
        *slot = updated.clone();
        self.records.save_notes(notes).await?;

        info!("Updated brewing note {}", id);
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let _guard = self.records.lock_writes().await;
        let mut notes = (*self.records.notes().await).clone();
        let before = notes.len();
        notes.retain(|n| n.id != id);
        if notes.len() == before {
            return Err(AppError::NotFound("Brewing note".to_string()));
        }
        self.records.save_notes(notes).await?;

        info!("Deleted brewing note {}", id);
        Ok(())
    }

    /// Copy input fields onto a brew note, snapshotting the linked bean
    async fn fill(&self, mut note: BrewingNote, input: NoteInput) -> BrewingNote {
        let beans = self.records.beans().await;
        let bean = input
            .bean_id
            .as_deref()
            .and_then(|id| beans.iter().find(|b| b.id == id));

        match bean {
            Some(bean) => {
                note.bean_id = Some(bean.id.clone());
                note.bean_info = Some(bean_snapshot(bean));
            }
            None => {
                if let Some(id) = &input.bean_id {
                    warn!("Note references unknown bean {}, keeping name only", id);
                }
                note.bean_id = None;
                note.bean_info = input.bean_name.map(|name| CoffeeBeanInfo {
                    name,
                    ..Default::default()
                });
            }
        }

        if let Some(timestamp) = input.timestamp {
            note.timestamp = timestamp;
        }
        note.source = NoteSource::OrdinaryBrew(Brew {
            method: input.method,
            equipment: input.equipment,
            params: input.params,
            rating: input.rating,
            taste: input.taste,
            total_time: input.total_time,
        });
        note.notes = input.notes;
        note
    }
}
