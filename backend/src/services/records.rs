//! Application state for loaded records
//!
//! `Records` is the single source of truth for beans, notes and settings
//! inside the server. Collections are loaded lazily from the record store,
//! cached, and dropped again through [`Records::invalidate`]. Reads degrade
//! to empty collections; writes propagate their errors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use shared::{Bean, BrewingNote, Settings};
use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult};
use crate::storage::{RecordStore, BEANS_KEY, NOTES_KEY, SETTINGS_KEY};

const KNOWN_KEYS: [&str; 3] = [BEANS_KEY, NOTES_KEY, SETTINGS_KEY];

#[derive(Default)]
struct Cache {
    beans: Option<Arc<Vec<Bean>>>,
    notes: Option<Arc<Vec<BrewingNote>>>,
    settings: Option<Settings>,
    /// Bumped by every write or invalidation; a fill that started under an
    /// older generation must not overwrite the cache
    generation: u64,
}

impl Cache {
    fn bump(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }

    fn clear(&mut self) {
        *self = Cache {
            generation: self.generation,
            ..Cache::default()
        };
        self.bump();
    }
}

/// Outcome of a cache lookup
enum Lookup<T> {
    Hit(T),
    /// Miss, with the generation observed at the time
    Miss(u64),
}

struct Inner {
    store: RecordStore,
    default_settings: Settings,
    cache: RwLock<Cache>,
    write_lock: Mutex<()>,
}

/// Cached view of the record store shared by all services
#[derive(Clone)]
pub struct Records {
    inner: Arc<Inner>,
}

impl Records {
    pub fn new(store: RecordStore, default_settings: Settings) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                default_settings,
                cache: RwLock::new(Cache::default()),
                write_lock: Mutex::new(()),
            }),
        }
    }

    pub fn store(&self) -> &RecordStore {
        &self.inner.store
    }

    /// Serializes read-modify-write sequences across services
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.inner.write_lock.lock().await
    }

    async fn lookup<T: Clone>(&self, field: fn(&Cache) -> &Option<T>) -> Lookup<T> {
        let cache = self.inner.cache.read().await;
        match field(&*cache) {
            Some(value) => Lookup::Hit(value.clone()),
            None => Lookup::Miss(cache.generation),
        }
    }

    /// Cache a value loaded under `generation`.
    ///
    /// When a write or invalidation happened in the meantime the loaded value
    /// is not cached, and the newer cached value is returned if there is one.
    async fn fill<T: Clone>(
        &self,
        generation: u64,
        loaded: T,
        field: fn(&mut Cache) -> &mut Option<T>,
    ) -> T {
        let mut cache = self.inner.cache.write().await;
        let current = cache.generation;
        let slot = field(&mut *cache);
        if current == generation {
            *slot = Some(loaded.clone());
            return loaded;
        }
        match slot {
            Some(newer) => newer.clone(),
            None => loaded,
        }
    }

    pub async fn beans(&self) -> Arc<Vec<Bean>> {
        let generation = match self.lookup(|c| &c.beans).await {
            Lookup::Hit(beans) => return beans,
            Lookup::Miss(generation) => generation,
        };
        let Some(loaded) = self.load_collection::<Bean>(BEANS_KEY).await else {
            return Arc::new(Vec::new());
        };
        self.fill(generation, Arc::new(loaded), |c| &mut c.beans).await
    }

    pub async fn notes(&self) -> Arc<Vec<BrewingNote>> {
        let generation = match self.lookup(|c| &c.notes).await {
            Lookup::Hit(notes) => return notes,
            Lookup::Miss(generation) => generation,
        };
        let Some(loaded) = self.load_collection::<BrewingNote>(NOTES_KEY).await else {
            return Arc::new(Vec::new());
        };
        self.fill(generation, Arc::new(loaded), |c| &mut c.notes).await
    }

    /// Stored settings, or the configured defaults when none were saved
    pub async fn settings(&self) -> Settings {
        let generation = match self.lookup(|c| &c.settings).await {
            Lookup::Hit(settings) => return settings,
            Lookup::Miss(generation) => generation,
        };

        let settings = match self.inner.store.get(SETTINGS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Settings>(&raw) {
                Ok(settings) => settings,
                Err(e) => {
                    warn!("Malformed settings blob, using defaults: {}", e);
                    self.inner.default_settings.clone()
                }
            },
            Ok(None) => self.inner.default_settings.clone(),
            Err(e) => {
                error!("Failed to read settings: {}", e);
                return self.inner.default_settings.clone();
            }
        };
        self.fill(generation, settings, |c| &mut c.settings).await
    }

    pub async fn save_beans(&self, beans: Vec<Bean>) -> AppResult<Arc<Vec<Bean>>> {
        self.persist(BEANS_KEY, &beans).await?;
        let beans = Arc::new(beans);
        self.cache_beans(beans.clone()).await;
        info!("Saved {} beans", beans.len());
        Ok(beans)
    }

    pub async fn save_notes(&self, notes: Vec<BrewingNote>) -> AppResult<Arc<Vec<BrewingNote>>> {
        self.persist(NOTES_KEY, &notes).await?;
        let notes = Arc::new(notes);
        {
            let mut cache = self.inner.cache.write().await;
            cache.notes = Some(notes.clone());
            cache.bump();
        }
        info!("Saved {} brewing notes", notes.len());
        Ok(notes)
    }

    pub async fn save_settings(&self, settings: Settings) -> AppResult<Settings> {
        self.persist(SETTINGS_KEY, &settings).await?;
        {
            let mut cache = self.inner.cache.write().await;
            cache.settings = Some(settings.clone());
            cache.bump();
        }
        info!("Saved settings");
        Ok(settings)
    }

    /// Replace the cached beans before they are persisted
    pub async fn cache_beans(&self, beans: Arc<Vec<Bean>>) {
        let mut cache = self.inner.cache.write().await;
        cache.beans = Some(beans);
        cache.bump();
    }

    /// Drop the cached copy of `key`; the next read goes to the store
    pub async fn invalidate(&self, key: &str) {
        let mut cache = self.inner.cache.write().await;
        match key {
            BEANS_KEY => cache.beans = None,
            NOTES_KEY => cache.notes = None,
            SETTINGS_KEY => cache.settings = None,
            other => {
                warn!("Invalidate called for unknown key '{}'", other);
                return;
            }
        }
        cache.bump();
    }

    pub async fn invalidate_all(&self) {
        self.inner.cache.write().await.clear();
    }

    /// Every stored record as parsed JSON, keyed by storage key
    pub async fn backup(&self) -> AppResult<BTreeMap<String, serde_json::Value>> {
        let mut backup = BTreeMap::new();
        for key in self.inner.store.keys().await? {
            let Some(raw) = self.inner.store.get(&key).await? else {
                continue;
            };
            let value = serde_json::from_str(&raw).unwrap_or(serde_json::Value::String(raw));
            backup.insert(key, value);
        }
        Ok(backup)
    }

    /// Write a backup back to the store; only the known keys are accepted
    pub async fn restore(&self, backup: BTreeMap<String, serde_json::Value>) -> AppResult<()> {
        if let Some(key) = backup.keys().find(|k| !KNOWN_KEYS.contains(&k.as_str())) {
            return Err(AppError::Validation {
                field: key.clone(),
                message: format!("Unknown record key '{}'", key),
                message_zh: format!("未知的记录键 '{}'", key),
            });
        }

        let _guard = self.lock_writes().await;
        for (key, value) in &backup {
            self.inner.store.set(key, &value.to_string()).await?;
        }
        self.invalidate_all().await;
        info!("Restored {} records from backup", backup.len());
        Ok(())
    }

    /// Remove every stored record
    pub async fn reset(&self) -> AppResult<()> {
        let _guard = self.lock_writes().await;
        let result = self.inner.store.clear().await;
        self.invalidate_all().await;
        result?;
        info!("All records cleared");
        Ok(())
    }

    async fn persist<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> AppResult<()> {
        let raw = serde_json::to_string(value)?;
        if let Err(e) = self.inner.store.set(key, &raw).await {
            error!("Failed to persist '{}': {}", key, e);
            self.invalidate(key).await;
            return Err(e);
        }
        Ok(())
    }

    /// Parse a stored JSON array one element at a time.
    ///
    /// A malformed blob reads as empty and a malformed element is skipped.
    /// Returns `None` when the store itself failed, so nothing gets cached.
    async fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Option<Vec<T>> {
        let raw = match self.inner.store.get(key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Some(Vec::new()),
            Err(e) => {
                error!("Failed to read '{}': {}", key, e);
                return None;
            }
        };

        let values = match serde_json::from_str::<Vec<serde_json::Value>>(&raw) {
            Ok(values) => values,
            Err(e) => {
                warn!("Malformed '{}' blob, treating as empty: {}", key, e);
                return Some(Vec::new());
            }
        };

        let total = values.len();
        let records: Vec<T> = values
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<T>(value) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping malformed record in '{}': {}", key, e);
                    None
                }
            })
            .collect();
        if records.len() < total {
            warn!("Loaded {} of {} records from '{}'", records.len(), total, key);
        }
        Some(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::ChangeFeed;

    fn records() -> Records {
        Records::new(RecordStore::memory(ChangeFeed::new(8)), Settings::default())
    }

    #[tokio::test]
    async fn test_missing_keys_load_empty() {
        let records = records();
        assert!(records.beans().await.is_empty());
        assert!(records.notes().await.is_empty());
        assert_eq!(records.settings().await, Settings::default());
    }

    #[tokio::test]
    async fn test_malformed_blob_and_records_degrade() {
        let records = records();
        records.store().set(NOTES_KEY, "{not json").await.unwrap();
        records
            .store()
            .set(BEANS_KEY, r#"[{"id":"1","name":"Good"}, 42, {"id":"2","name":"Also good"}]"#)
            .await
            .unwrap();

        assert!(records.notes().await.is_empty());
        let beans = records.beans().await;
        assert_eq!(beans.len(), 2);
        assert_eq!(beans[1].name, "Also good");
    }

    #[tokio::test]
    async fn test_cache_until_invalidated() {
        let records = records();
        assert!(records.beans().await.is_empty());

        // A write behind the cache's back stays invisible until invalidated
        records
            .store()
            .set(BEANS_KEY, r#"[{"id":"1","name":"New"}]"#)
            .await
            .unwrap();
        assert!(records.beans().await.is_empty());

        records.invalidate(BEANS_KEY).await;
        assert_eq!(records.beans().await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_updates_cache_and_store() {
        let records = records();
        records
            .save_beans(vec![Bean::new("1", "Saved", 0)])
            .await
            .unwrap();

        assert_eq!(records.beans().await.len(), 1);
        let raw = records.store().get(BEANS_KEY).await.unwrap().unwrap();
        assert!(raw.contains("Saved"));
    }

    #[tokio::test]
    async fn test_fill_after_concurrent_save_keeps_newer_beans() {
        let records = records();
        records
            .store()
            .set(BEANS_KEY, r#"[{"id":"1","name":"Old"}]"#)
            .await
            .unwrap();

        // A reader misses the cache and loads the old list...
        let Lookup::Miss(generation) = records.lookup(|c| &c.beans).await else {
            panic!("cache should start empty");
        };
        let stale = Arc::new(records.load_collection::<Bean>(BEANS_KEY).await.unwrap());

        // ...while a writer saves a new one
        records
            .save_beans(vec![Bean::new("2", "New", 0)])
            .await
            .unwrap();

        let filled = records.fill(generation, stale, |c| &mut c.beans).await;
        assert_eq!(filled[0].name, "New");
        assert_eq!(records.beans().await[0].name, "New");
    }

    #[tokio::test]
    async fn test_fill_after_invalidate_is_not_cached() {
        let records = records();
        let Lookup::Miss(generation) = records.lookup(|c| &c.notes).await else {
            panic!("cache should start empty");
        };
        records.invalidate_all().await;

        let filled = records
            .fill(generation, Arc::new(Vec::new()), |c| &mut c.notes)
            .await;
        assert!(filled.is_empty());
        assert!(matches!(records.lookup(|c| &c.notes).await, Lookup::Miss(_)));
    }

    #[tokio::test]
    async fn test_backup_restore_reset() {
        let records = records();
        records
            .save_beans(vec![Bean::new("1", "Kept", 0)])
            .await
            .unwrap();
        let backup = records.backup().await.unwrap();
        assert!(backup[BEANS_KEY].is_array());

        records.reset().await.unwrap();
        assert!(records.beans().await.is_empty());
        assert!(records.store().keys().await.unwrap().is_empty());

        records.restore(backup).await.unwrap();
        assert_eq!(records.beans().await[0].name, "Kept");
    }

    #[tokio::test]
    async fn test_restore_rejects_unknown_keys() {
        let records = records();
        let mut backup = BTreeMap::new();
        backup.insert("somethingElse".to_string(), serde_json::json!([]));
        assert!(matches!(
            records.restore(backup).await,
            Err(AppError::Validation { .. })
        ));
    }
}
