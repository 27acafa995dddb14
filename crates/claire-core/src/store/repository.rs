//! Store trait.

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::broadcast;

use super::key::StorageKey;
use crate::error::Result;

/// Values returned by a multi-key read. Absent keys are simply missing.
pub type StoreSnapshot = HashMap<StorageKey, Value>;

/// A single key's transition, emitted after a write or removal lands.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub key: StorageKey,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// An abstract, process-wide key/value store shared by all contexts.
///
/// # Implementation Notes
///
/// - Writes are last-writer-wins per key.
/// - A multi-key `set` or `remove` is applied in one call but callers must
///   not rely on cross-key atomicity.
/// - A write must be visible to any read that starts after it returns.
/// - Change events are best-effort: a subscriber that lags loses events.
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Reads the given keys; keys without a value are omitted from the snapshot.
    async fn get(&self, keys: &[StorageKey]) -> Result<StoreSnapshot>;

    /// Writes every entry, overwriting previous values.
    async fn set(&self, entries: Vec<(StorageKey, Value)>) -> Result<()>;

    /// Deletes the given keys. Deleting a missing key is not an error.
    async fn remove(&self, keys: &[StorageKey]) -> Result<()>;

    /// Subscribes to change events for all keys.
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// Typed convenience layer over [`KvStore`].
#[async_trait]
pub trait KvStoreExt {
    /// Reads and deserializes one key.
    async fn get_value<T>(&self, key: StorageKey) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send;

    /// Serializes and writes one key.
    async fn set_value<T>(&self, key: StorageKey, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized;
}

#[async_trait]
impl<S> KvStoreExt for S
where
    S: KvStore + ?Sized,
{
    async fn get_value<T>(&self, key: StorageKey) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        let mut snapshot = self.get(&[key]).await?;
        match snapshot.remove(&key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
        }
    }

    async fn set_value<T>(&self, key: StorageKey, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        let value = serde_json::to_value(value)?;
        self.set(vec![(key, value)]).await
    }
}
