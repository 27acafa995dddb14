//! Project scope.

use serde::{Deserialize, Serialize};

/// Project assumed when none has been chosen yet.
pub const DEFAULT_PROJECT_ID: i64 = 1;

/// A project as listed by the backend. Never authored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRef {
    pub id: i64,
    #[serde(default)]
    pub name: String,
}
