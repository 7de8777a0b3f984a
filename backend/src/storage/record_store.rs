//! Key/value record store
//!
//! Each key holds one JSON document (the whole bean list, the whole note
//! list, the settings blob). There is no indexed access: readers always get
//! the complete value back.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sqlx::PgPool;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::ChangeFeed;
use crate::error::{AppError, AppResult};

/// Bean inventory key
pub const BEANS_KEY: &str = "coffeeBeans";
/// Brewing note key
pub const NOTES_KEY: &str = "brewingNotes";
/// User settings key
pub const SETTINGS_KEY: &str = "brewGuideSettings";

#[derive(Clone)]
enum Backend {
    Postgres(PgPool),
    Files(PathBuf),
    Memory(Arc<RwLock<BTreeMap<String, String>>>),
}

/// Async key/value store that announces every write on a [`ChangeFeed`]
#[derive(Clone)]
pub struct RecordStore {
    backend: Backend,
    feed: ChangeFeed,
}

impl RecordStore {
    /// Store backed by the `record_store` table
    pub fn postgres(pool: PgPool, feed: ChangeFeed) -> Self {
        Self {
            backend: Backend::Postgres(pool),
            feed,
        }
    }

    /// Store keeping one `<key>.json` file per key in `dir`
    pub async fn files(dir: impl Into<PathBuf>, feed: ChangeFeed) -> AppResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        info!("File record store at {}", dir.display());
        Ok(Self {
            backend: Backend::Files(dir),
            feed,
        })
    }

    /// Ephemeral store, lost on restart
    pub fn memory(feed: ChangeFeed) -> Self {
        Self {
            backend: Backend::Memory(Arc::new(RwLock::new(BTreeMap::new()))),
            feed,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self.backend {
            Backend::Postgres(_) => "postgres",
            Backend::Files(_) => "files",
            Backend::Memory(_) => "memory",
        }
    }

    pub async fn get(&self, key: &str) -> AppResult<Option<String>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let value = sqlx::query_scalar::<_, String>(
                    "SELECT value FROM record_store WHERE key = $1",
                )
                .bind(key)
                .fetch_optional(pool)
                .await?;
                Ok(value)
            }
            Backend::Files(dir) => {
                let path = file_path(dir, key)?;
                match tokio::fs::read_to_string(&path).await {
                    Ok(value) => Ok(Some(value)),
                    Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
            Backend::Memory(map) => Ok(map.read().await.get(key).cloned()),
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> AppResult<()> {
        match &self.backend {
            Backend::Postgres(pool) => {
                sqlx::query(
                    r#"
                    INSERT INTO record_store (key, value, updated_at)
                    VALUES ($1, $2, NOW())
                    ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = NOW()
                    "#,
                )
                .bind(key)
                .bind(value)
                .execute(pool)
                .await?;
            }
            Backend::Files(dir) => {
                let path = file_path(dir, key)?;
                // Write then rename so readers never see a half-written file
                let tmp = path.with_extension("json.tmp");
                tokio::fs::write(&tmp, value).await?;
                tokio::fs::rename(&tmp, &path).await?;
            }
            Backend::Memory(map) => {
                map.write().await.insert(key.to_string(), value.to_string());
            }
        }
        debug!("Stored '{}' ({} bytes)", key, value.len());
        self.feed.publish(key);
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> AppResult<()> {
        match &self.backend {
            Backend::Postgres(pool) => {
                sqlx::query("DELETE FROM record_store WHERE key = $1")
                    .bind(key)
                    .execute(pool)
                    .await?;
            }
            Backend::Files(dir) => {
                let path = file_path(dir, key)?;
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::NotFound => {}
                    Err(e) => return Err(e.into()),
                }
            }
            Backend::Memory(map) => {
                map.write().await.remove(key);
            }
        }
        self.feed.publish(key);
        Ok(())
    }

    /// Remove every key, announcing each one
    pub async fn clear(&self) -> AppResult<()> {
        let keys = self.keys().await?;
        for key in &keys {
            self.remove(key).await?;
        }
        info!("Cleared {} records", keys.len());
        Ok(())
    }

    /// Stored keys in ascending order
    pub async fn keys(&self) -> AppResult<Vec<String>> {
        match &self.backend {
            Backend::Postgres(pool) => {
                let keys = sqlx::query_scalar::<_, String>(
                    "SELECT key FROM record_store ORDER BY key",
                )
                .fetch_all(pool)
                .await?;
                Ok(keys)
            }
            Backend::Files(dir) => {
                let mut keys = Vec::new();
                let mut entries = tokio::fs::read_dir(dir).await?;
                while let Some(entry) = entries.next_entry().await? {
                    let path = entry.path();
                    if path.extension().and_then(|e| e.to_str()) != Some("json") {
                        continue;
                    }
                    if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                        keys.push(stem.to_string());
                    }
                }
                keys.sort();
                Ok(keys)
            }
            Backend::Memory(map) => Ok(map.read().await.keys().cloned().collect()),
        }
    }

    /// Whether the backend answers at all
    pub async fn ping(&self) -> bool {
        match &self.backend {
            Backend::Postgres(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            Backend::Files(dir) => tokio::fs::metadata(dir).await.is_ok(),
            Backend::Memory(_) => true,
        }
    }
}

/// Keys become file names, so only a safe character set is accepted
fn file_path(dir: &Path, key: &str) -> AppResult<PathBuf> {
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        return Err(AppError::Validation {
            field: "key".to_string(),
            message: format!("Invalid record key '{}'", key),
            message_zh: format!("无效的记录键 '{}'", key),
        });
    }
    Ok(dir.join(format!("{key}.json")))
}
