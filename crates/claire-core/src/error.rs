//! Error types for Claire.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for every Claire context.
///
/// No variant is fatal: callers log it, surface a fallback, and keep running.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ClaireError {
    /// Identity check failed or an authenticated call returned 401.
    #[error("Authentication required")]
    AuthRequired,

    /// Request could not be sent, timed out, or returned a non-success status.
    #[error("Network failure{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    NetworkFailure {
        status: Option<u16>,
        message: String,
    },

    /// Detector injection skipped for a restricted or already-instrumented page.
    #[error("Injection skipped for tab {tab_id}: {reason}")]
    InjectionSkipped { tab_id: i64, reason: String },

    /// A selection-triggered open arrived without a resolvable window.
    #[error("No window ID found")]
    NoWindowContext,

    /// Key/value store access failed
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization { format: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Browser platform call failed (panel, badge, notification, scripting)
    #[error("Platform error: {0}")]
    Platform(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClaireError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NetworkFailure error without an HTTP status.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            status: None,
            message: message.into(),
        }
    }

    /// Creates a NetworkFailure error carrying the HTTP status.
    pub fn http_status(status: u16, message: impl Into<String>) -> Self {
        Self::NetworkFailure {
            status: Some(status),
            message: message.into(),
        }
    }

    /// Creates an InjectionSkipped error
    pub fn injection_skipped(tab_id: i64, reason: impl Into<String>) -> Self {
        Self::InjectionSkipped {
            tab_id,
            reason: reason.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a Platform error
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::NetworkFailure { .. })
    }

    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ClaireError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for ClaireError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ClaireError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// A type alias for `Result<T, ClaireError>`.
pub type Result<T> = std::result::Result<T, ClaireError>;
