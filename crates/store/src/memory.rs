//! In-memory store, optionally mirrored to a gzip'd JSON file.

use std::{
    collections::HashMap,
    io::{Read, Write},
    path::{Path, PathBuf},
};

use {
    async_trait::async_trait,
    cibot_config::MemoryDbConfig,
    flate2::{Compression, read::GzDecoder, write::GzEncoder},
    serde_json::Value,
    tokio::{fs, sync::Mutex},
    tracing::{debug, info, warn},
};

#[cfg(feature = "metrics")]
use cibot_metrics::{counter, store as store_metrics};

use crate::{
    Error, Result,
    error::Context as _,
    store::KvStore,
};

type Db = HashMap<String, HashMap<String, Value>>;

/// File name used under the data directory when no `db_path` is set.
pub const DEFAULT_DB_FILE: &str = "db.json.gz";

pub struct MemoryStore {
    db: Mutex<Db>,
    /// Snapshot target. `None` keeps everything in memory.
    path: Option<PathBuf>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Volatile store; contents are lost on exit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            db: Mutex::new(HashMap::new()),
            path: None,
        }
    }

    /// Store backed by `path`. An existing snapshot is loaded; a missing
    /// file starts empty and is created on the first write.
    pub async fn persistent(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let db = load_snapshot(&path).await?;
        info!(path = %path.display(), subjects = db.len(), "loaded key-value store");
        Ok(Self {
            db: Mutex::new(db),
            path: Some(path),
        })
    }

    /// Build the store described by `db.memory` in the bot config.
    pub async fn from_config(config: &MemoryDbConfig) -> Result<Self> {
        if !config.persistence {
            debug!("using in-memory key-value store without persistence");
            return Ok(Self::new());
        }
        let path = match &config.db_path {
            Some(path) => path.clone(),
            None => cibot_config::data_dir()
                .context("cannot determine data directory for the store file")?
                .join(DEFAULT_DB_FILE),
        };
        Self::persistent(path).await
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Write the whole map to disk: temp file, then rename over the target.
    async fn flush(&self, db: &Db) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        match write_snapshot(path, db).await {
            Ok(()) => {
                #[cfg(feature = "metrics")]
                counter!(store_metrics::FLUSHES_TOTAL).increment(1);
                Ok(())
            },
            Err(e) => {
                #[cfg(feature = "metrics")]
                counter!(store_metrics::FLUSH_ERRORS_TOTAL).increment(1);
                warn!(path = %path.display(), error = %e, "failed to write store snapshot");
                Err(e)
            },
        }
    }
}

async fn load_snapshot(path: &Path) -> Result<Db> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        return Ok(HashMap::new());
    }
    let compressed = fs::read(path).await?;
    let mut raw = String::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_string(&mut raw)
        .map_err(|e| Error::corrupt(path, e))?;
    serde_json::from_str(&raw).map_err(|e| Error::corrupt(path, e))
}

async fn write_snapshot(path: &Path, db: &Db) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_vec(db)?;
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&json)?;
    let compressed = encoder.finish()?;

    let tmp = path.with_extension("tmp");
    fs::write(&tmp, compressed).await?;
    fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get_value(&self, subject: &str, key: &str) -> Result<Option<Value>> {
        debug!(subject, key, "retrieving value");
        let db = self.db.lock().await;
        Ok(db.get(subject).and_then(|values| values.get(key)).cloned())
    }

    async fn store_value(&self, subject: &str, key: &str, value: Value) -> Result<()> {
        debug!(subject, key, "storing value");
        let mut db = self.db.lock().await;
        db.entry(subject.to_string())
            .or_default()
            .insert(key.to_string(), value);
        // Flushing under the lock keeps snapshots in write order.
        self.flush(&db).await
    }

    async fn delete_value(&self, subject: &str, key: &str) -> Result<Option<Value>> {
        let mut db = self.db.lock().await;
        let Some(values) = db.get_mut(subject) else {
            return Ok(None);
        };
        let removed = values.remove(key);
        if values.is_empty() {
            db.remove(subject);
        }
        if removed.is_some() {
            self.flush(&db).await?;
        }
        Ok(removed)
    }

    async fn keys(&self, subject: &str) -> Result<Vec<String>> {
        let db = self.db.lock().await;
        let mut keys: Vec<String> = db
            .get(subject)
            .map(|values| values.keys().cloned().collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}
