//! JSON-file backed key/value store.
//!
//! The whole store lives in one JSON object keyed by the storage key names.
//! Values are cached in memory. A write is staged on a copy of the cache,
//! persisted atomically on a blocking task, and only then committed.

use crate::atomic_json::AtomicJsonFile;
use crate::memory_store::{apply_remove, apply_set, emit, snapshot_of};
use async_trait::async_trait;
use claire_core::error::{ClaireError, Result};
use claire_core::store::{KvStore, StorageChange, StorageKey, StoreSnapshot};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{Mutex, broadcast};
use tracing::{debug, warn};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A [`KvStore`] persisted to a single JSON document.
///
/// The file is shared with the extension's on-disk format: a flat object of
/// camelCase key names. Unknown keys in the file are ignored and dropped on
/// the next save.
#[derive(Clone)]
pub struct JsonFileKvStore {
    values: Arc<Mutex<HashMap<StorageKey, Value>>>,
    file: Arc<std::sync::Mutex<AtomicJsonFile<Map<String, Value>>>>,
    changes: broadcast::Sender<StorageChange>,
}

impl JsonFileKvStore {
    /// Opens the store at `path`, loading existing values.
    pub fn open(path: PathBuf) -> Result<Self> {
        let file = AtomicJsonFile::<Map<String, Value>>::new(path);
        let document = file.load()?.unwrap_or_default();

        let mut values = HashMap::new();
        for (name, value) in document {
            match StorageKey::parse(&name) {
                Some(key) => {
                    values.insert(key, value);
                }
                None => warn!("[Store] Ignoring unknown key '{}' in {:?}", name, file.path()),
            }
        }
        debug!("[Store] Loaded {} keys from {:?}", values.len(), file.path());

        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Ok(Self {
            values: Arc::new(Mutex::new(values)),
            file: Arc::new(std::sync::Mutex::new(file)),
            changes,
        })
    }

    async fn persist(&self, values: HashMap<StorageKey, Value>) -> Result<()> {
        let document: Map<String, Value> = values
            .into_iter()
            .map(|(key, value)| (key.as_str().to_string(), value))
            .collect();

        let file = self.file.clone();
        tokio::task::spawn_blocking(move || {
            let file = file
                .lock()
                .map_err(|e| ClaireError::internal(format!("Store file lock poisoned: {}", e)))?;
            file.save(&document)
        })
        .await
        .map_err(|e| ClaireError::internal(format!("Failed to join task: {}", e)))??;

        Ok(())
    }
}

#[async_trait]
impl KvStore for JsonFileKvStore {
    async fn get(&self, keys: &[StorageKey]) -> Result<StoreSnapshot> {
        let values = self.values.lock().await;
        Ok(snapshot_of(&values, keys))
    }

    async fn set(&self, entries: Vec<(StorageKey, Value)>) -> Result<()> {
        let mut values = self.values.lock().await;
        let mut staged = values.clone();
        let changes = apply_set(&mut staged, entries);
        if changes.is_empty() {
            return Ok(());
        }
        // Hold the cache lock while saving so snapshots hit the disk in order.
        self.persist(staged.clone()).await?;
        *values = staged;
        drop(values);
        emit(&self.changes, changes);
        Ok(())
    }

    async fn remove(&self, keys: &[StorageKey]) -> Result<()> {
        let mut values = self.values.lock().await;
        let mut staged = values.clone();
        let changes = apply_remove(&mut staged, keys);
        if changes.is_empty() {
            return Ok(());
        }
        self.persist(staged.clone()).await?;
        *values = staged;
        drop(values);
        emit(&self.changes, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
