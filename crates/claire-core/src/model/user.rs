//! Authenticated user and outgoing attachment metadata.

use serde::{Deserialize, Serialize};

/// Profile returned by the identity endpoint. Its shape belongs to the backend,
/// so it is kept as opaque JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserProfile(pub serde_json::Value);

impl UserProfile {
    /// Best-effort display name: `name`, then `email`, then `username`.
    pub fn display_name(&self) -> Option<&str> {
        ["name", "email", "username"]
            .iter()
            .find_map(|key| self.0.get(key).and_then(|v| v.as_str()))
    }
}

/// Metadata of a file attached to an outgoing message. Content encoding is the
/// caller's concern; only these fields are forwarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentMeta {
    pub name: String,
    pub size: u64,
    #[serde(rename = "type")]
    pub mime_type: String,
}
