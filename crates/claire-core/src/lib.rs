//! Domain layer for Claire.
//!
//! Holds the data model shared by every execution context (content script,
//! background coordinator, side panel), the message protocol between them,
//! and the interfaces through which they reach the outside world: the
//! persisted key/value store, the browser platform, the page surface, and the
//! remote backend.

pub mod backend;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod platform;
pub mod protocol;
pub mod store;

// Re-export common error type
pub use error::{ClaireError, Result};
