use serde::{Deserialize, Serialize};
use std::fmt;

/// Logical keys of the persisted store.
///
/// Wire names are the camelCase strings the extension has always used, so an
/// existing store file stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageKey {
    Enabled,
    FirstRun,
    LastActivityTime,
    SelectedText,
    SelectedTextUrl,
    SelectedTextPageTitle,
    Context,
    Timestamp,
    ChatHistory,
    ClaireSession,
    CurrentSessionId,
    CurrentProjectId,
    ForceNewConversation,
    User,
    IsAuthenticated,
    ChatSessions,
}

/// Keys that together make up the live selection payload.
pub const SELECTION_KEYS: [StorageKey; 5] = [
    StorageKey::SelectedText,
    StorageKey::SelectedTextUrl,
    StorageKey::SelectedTextPageTitle,
    StorageKey::Context,
    StorageKey::Timestamp,
];

impl StorageKey {
    pub const ALL: [StorageKey; 16] = [
        StorageKey::Enabled,
        StorageKey::FirstRun,
        StorageKey::LastActivityTime,
        StorageKey::SelectedText,
        StorageKey::SelectedTextUrl,
        StorageKey::SelectedTextPageTitle,
        StorageKey::Context,
        StorageKey::Timestamp,
        StorageKey::ChatHistory,
        StorageKey::ClaireSession,
        StorageKey::CurrentSessionId,
        StorageKey::CurrentProjectId,
        StorageKey::ForceNewConversation,
        StorageKey::User,
        StorageKey::IsAuthenticated,
        StorageKey::ChatSessions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKey::Enabled => "enabled",
            StorageKey::FirstRun => "firstRun",
            StorageKey::LastActivityTime => "lastActivityTime",
            StorageKey::SelectedText => "selectedText",
            StorageKey::SelectedTextUrl => "selectedTextUrl",
            StorageKey::SelectedTextPageTitle => "selectedTextPageTitle",
            StorageKey::Context => "context",
            StorageKey::Timestamp => "timestamp",
            StorageKey::ChatHistory => "chatHistory",
            StorageKey::ClaireSession => "claireSession",
            StorageKey::CurrentSessionId => "currentSessionId",
            StorageKey::CurrentProjectId => "currentProjectId",
            StorageKey::ForceNewConversation => "forceNewConversation",
            StorageKey::User => "user",
            StorageKey::IsAuthenticated => "isAuthenticated",
            StorageKey::ChatSessions => "chatSessions",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
