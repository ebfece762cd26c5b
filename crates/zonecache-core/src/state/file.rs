// # File Zone Store
//
// File-based implementation of ZoneStore with crash recovery.
//
// ## Purpose
//
// Keeps the mirror of provider zone documents across restarts so reads do
// not need the provider.
//
// ## Crash Recovery
//
// - Atomic writes: every mutation is written to a temp file, fsynced, then
//   renamed over the cache file
// - Automatic backup: the previous cache file is kept as `.backup`
// - Recovery: a cache file that fails to parse is restored from the backup
//
// ## File Format
//
// ```json
// {
//   "version": "1.0",
//   "zones": {
//     "example.com": {
//       "document": { "id": "52051b2c9f782d58bb4df41b", "zone": "example.com", "records": [] },
//       "synced_at": "2025-01-09T12:00:00Z"
//     }
//   }
// }
// ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{Mutex, RwLock};

use serde_json::Value;

use crate::Error;
use crate::traits::zone_store::{CachedZone, ZoneStore, ZoneStoreFactory};

/// Cache file format version
/// Used for future migration if format changes
const CACHE_FILE_VERSION: &str = "1.0";

/// File-based zone store with crash recovery
///
/// The whole namespace is held in memory and written through to disk on
/// every mutation. Mutations are serialized by a writer lock; the new map is
/// only published to readers after it is safely on disk, so a failed write
/// changes nothing and a reader never sees a half-applied mutation.
///
/// # Example
///
/// ```rust,no_run
/// use serde_json::json;
/// use zonecache_core::state::FileZoneStore;
/// use zonecache_core::traits::ZoneStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = FileZoneStore::new("/var/lib/zonecache/zones.json").await?;
///
///     let document = json!({"zone": "example.com", "ttl": 3600});
///     store.put_zone("example.com", &document).await?;
///
///     assert_eq!(store.get_zone("example.com").await?, Some(document));
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct FileZoneStore {
    path: PathBuf,
    zones: Arc<RwLock<HashMap<String, CachedZone>>>,
    writer: Mutex<()>,
}

/// Serializable cache file format
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct CacheFileFormat {
    version: String,
    zones: HashMap<String, CachedZone>,
}

impl FileZoneStore {
    /// Create or load a file zone store
    ///
    /// This will:
    /// 1. Create parent directories if needed
    /// 2. Try to load the existing cache file
    /// 3. If it is corrupted, try the backup
    /// 4. If both fail, start with an empty cache
    pub async fn new<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            fs::create_dir_all(parent).await.map_err(|e| {
                Error::config(format!(
                    "Failed to create cache directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let zones = Self::load_with_recovery(&path).await?;

        Ok(Self {
            path,
            zones: Arc::new(RwLock::new(zones)),
            writer: Mutex::new(()),
        })
    }

    /// Load the cache with automatic recovery
    ///
    /// Only a parse failure triggers recovery; an unreadable file is an error.
    async fn load_with_recovery(path: &Path) -> Result<HashMap<String, CachedZone>, Error> {
        let err = match Self::load(path).await {
            Ok(zones) => {
                tracing::debug!("Loaded zone cache: {} zones", zones.len());
                return Ok(zones);
            }
            Err(Error::Json(e)) => e,
            Err(e) => return Err(e),
        };

        tracing::warn!(
            "Zone cache {} appears corrupted: {}. Attempting recovery from backup.",
            path.display(),
            err
        );

        let backup_path = Self::backup_path(path);
        if !backup_path.exists() {
            tracing::warn!("No backup file found. Starting with empty cache.");
            return Ok(HashMap::new());
        }

        match Self::load(&backup_path).await {
            Ok(zones) => {
                tracing::info!("Recovered zone cache from backup: {} zones", zones.len());
                if let Err(restore_err) = fs::copy(&backup_path, path).await {
                    tracing::error!(
                        "Failed to restore cache file from backup: {}",
                        restore_err
                    );
                }
                Ok(zones)
            }
            Err(backup_err) => {
                tracing::error!(
                    "Backup also unusable: {}. Starting with empty cache.",
                    backup_err
                );
                Ok(HashMap::new())
            }
        }
    }

    /// Load the cache from a file
    async fn load(path: &Path) -> Result<HashMap<String, CachedZone>, Error> {
        if !path.exists() {
            tracing::debug!("Zone cache file does not exist: {}", path.display());
            return Ok(HashMap::new());
        }

        let content = fs::read_to_string(path).await.map_err(|e| {
            Error::store(format!(
                "Failed to read cache file {}: {}",
                path.display(),
                e
            ))
        })?;

        let cache_file: CacheFileFormat = serde_json::from_str(&content)?;

        if cache_file.version != CACHE_FILE_VERSION {
            tracing::warn!(
                "Zone cache version mismatch: expected {}, got {}. Attempting to load anyway.",
                CACHE_FILE_VERSION,
                cache_file.version
            );
        }

        Ok(cache_file.zones)
    }

    /// Apply a mutation: write the resulting map to disk, then publish it
    async fn apply<F>(&self, mutate: F) -> Result<(), Error>
    where
        F: FnOnce(&mut HashMap<String, CachedZone>),
    {
        let _writer = self.writer.lock().await;

        let mut next = self.zones.read().await.clone();
        mutate(&mut next);

        self.write_file(&next).await?;

        *self.zones.write().await = next;
        Ok(())
    }

    /// Write a snapshot to the cache file atomically
    async fn write_file(&self, zones: &HashMap<String, CachedZone>) -> Result<(), Error> {
        let cache_file = CacheFileFormat {
            version: CACHE_FILE_VERSION.to_string(),
            zones: zones.clone(),
        };

        let json = serde_json::to_string_pretty(&cache_file)
            .map_err(|e| Error::store(format!("Failed to serialize zone cache: {}", e)))?;

        let temp_path = self.temp_path();
        {
            let mut file = fs::File::create(&temp_path).await.map_err(|e| {
                Error::store(format!(
                    "Failed to create temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.write_all(json.as_bytes()).await.map_err(|e| {
                Error::store(format!(
                    "Failed to write to temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;

            file.sync_all().await.map_err(|e| {
                Error::store(format!(
                    "Failed to sync temp file {}: {}",
                    temp_path.display(),
                    e
                ))
            })?;
        }

        if self.path.exists() {
            let backup_path = Self::backup_path(&self.path);
            if let Err(e) = fs::copy(&self.path, &backup_path).await {
                tracing::warn!("Failed to create backup: {}", e);
            }
        }

        fs::rename(&temp_path, &self.path).await.map_err(|e| {
            Error::store(format!(
                "Failed to rename {} to {}: {}",
                temp_path.display(),
                self.path.display(),
                e
            ))
        })?;

        tracing::trace!("Zone cache written: {}", self.path.display());
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut temp = self.path.clone();
        temp.set_extension("tmp");
        temp
    }

    fn backup_path(path: &Path) -> PathBuf {
        let mut backup = path.to_path_buf();
        backup.set_extension("backup");
        backup
    }

    /// Path of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ZoneStore for FileZoneStore {
    async fn put_zone(&self, name: &str, document: &Value) -> Result<(), Error> {
        if name.is_empty() {
            return Err(Error::store("Refusing to cache a zone without a name"));
        }
        let entry = CachedZone::new(document.clone());
        self.apply(|zones| {
            zones.insert(name.to_string(), entry);
        })
        .await
    }

    async fn get_entry(&self, name: &str) -> Result<Option<CachedZone>, Error> {
        let zones = self.zones.read().await;
        Ok(zones.get(name).cloned())
    }

    async fn delete_zone(&self, name: &str) -> Result<(), Error> {
        if !self.zones.read().await.contains_key(name) {
            return Ok(());
        }
        self.apply(|zones| {
            zones.remove(name);
        })
        .await
    }

    async fn list_zones(&self) -> Result<Vec<String>, Error> {
        let zones = self.zones.read().await;
        let mut names: Vec<String> = zones.keys().cloned().collect();
        names.sort();
        Ok(names)
    }

    async fn flush(&self) -> Result<(), Error> {
        let _writer = self.writer.lock().await;
        let snapshot = self.zones.read().await.clone();
        self.write_file(&snapshot).await
    }
}

/// Factory for file-backed zone stores
pub struct FileZoneStoreFactory;

#[async_trait]
impl ZoneStoreFactory for FileZoneStoreFactory {
    async fn create(
        &self,
        config: &crate::config::CacheConfig,
    ) -> Result<Arc<dyn ZoneStore>, Error> {
        match config {
            crate::config::CacheConfig::File { path } => {
                Ok(Arc::new(FileZoneStore::new(path).await?))
            }
            _ => Err(Error::config("Invalid config for file zone store")),
        }
    }
}
