//! Persisted key/value store interface.
//!
//! The store is the single source of truth for cross-context state. Every
//! component depends on [`KvStore`], never on a concrete backend.
//!
//! # Module Structure
//!
//! - `key`: the closed set of logical keys (`StorageKey`)
//! - `repository`: the async store trait, change events, and typed helpers

mod key;
mod repository;

pub use key::{SELECTION_KEYS, StorageKey};
pub use repository::{KvStore, KvStoreExt, StorageChange, StoreSnapshot};
