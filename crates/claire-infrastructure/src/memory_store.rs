//! In-memory key/value store.

use async_trait::async_trait;
use claire_core::error::Result;
use claire_core::store::{KvStore, StorageChange, StorageKey, StoreSnapshot};
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::{RwLock, broadcast};

const CHANGE_CHANNEL_CAPACITY: usize = 64;

/// A process-local [`KvStore`] backed by a map.
///
/// Used by tests and by hosts that do not need values to outlive the process.
pub struct MemoryKvStore {
    values: RwLock<HashMap<StorageKey, Value>>,
    changes: broadcast::Sender<StorageChange>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::with_values(HashMap::new())
    }

    /// Creates a store pre-populated with `values`. No change events are emitted.
    pub fn with_values(values: HashMap<StorageKey, Value>) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            values: RwLock::new(values),
            changes,
        }
    }

    /// Copy of every stored value.
    pub async fn dump(&self) -> HashMap<StorageKey, Value> {
        self.values.read().await.clone()
    }
}

impl Default for MemoryKvStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, keys: &[StorageKey]) -> Result<StoreSnapshot> {
        let values = self.values.read().await;
        Ok(snapshot_of(&values, keys))
    }

    async fn set(&self, entries: Vec<(StorageKey, Value)>) -> Result<()> {
        let changes = {
            let mut values = self.values.write().await;
            apply_set(&mut values, entries)
        };
        emit(&self.changes, changes);
        Ok(())
    }

    async fn remove(&self, keys: &[StorageKey]) -> Result<()> {
        let changes = {
            let mut values = self.values.write().await;
            apply_remove(&mut values, keys)
        };
        emit(&self.changes, changes);
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}

pub(crate) fn snapshot_of(values: &HashMap<StorageKey, Value>, keys: &[StorageKey]) -> StoreSnapshot {
    keys.iter()
        .filter_map(|key| values.get(key).map(|value| (*key, value.clone())))
        .collect()
}

/// Writes entries into `values`, returning one change per key whose value differs.
pub(crate) fn apply_set(
    values: &mut HashMap<StorageKey, Value>,
    entries: Vec<(StorageKey, Value)>,
) -> Vec<StorageChange> {
    let mut changes = Vec::new();
    for (key, new_value) in entries {
        let old_value = values.insert(key, new_value.clone());
        if old_value.as_ref() != Some(&new_value) {
            changes.push(StorageChange {
                key,
                old_value,
                new_value: Some(new_value),
            });
        }
    }
    changes
}

/// Deletes keys from `values`, returning one change per key that existed.
pub(crate) fn apply_remove(
    values: &mut HashMap<StorageKey, Value>,
    keys: &[StorageKey],
) -> Vec<StorageChange> {
    keys.iter()
        .filter_map(|key| {
            values.remove(key).map(|old_value| StorageChange {
                key: *key,
                old_value: Some(old_value),
                new_value: None,
            })
        })
        .collect()
}

pub(crate) fn emit(sender: &broadcast::Sender<StorageChange>, changes: Vec<StorageChange>) {
    for change in changes {
        // No subscribers is fine.
        let _ = sender.send(change);
    }
}
