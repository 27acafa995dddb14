//! Infrastructure layer for Claire.
//!
//! Concrete implementations of the interfaces declared in `claire-core`:
//! key/value stores, the HTTP backend client, configuration loading and a
//! headless browser platform.

pub mod atomic_json;
pub mod config_service;
pub mod file_store;
pub mod headless_platform;
pub mod http_backend;
pub mod memory_store;
pub mod paths;

pub use config_service::ConfigService;
pub use file_store::JsonFileKvStore;
pub use headless_platform::{HeadlessPlatform, PlatformCall};
pub use http_backend::HttpBackend;
pub use memory_store::MemoryKvStore;
pub use paths::ClairePaths;
