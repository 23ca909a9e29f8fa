use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a passed challenge stays valid (3 days)
pub const VERIFIED_TTL: Duration = Duration::from_secs(259_200);

/// How long a relayed message can be traced back to its origin (30 days)
pub const MAPPING_TTL: Duration = Duration::from_secs(2_592_000);

/// Default lifetime of an unanswered challenge (3 days)
pub const DEFAULT_CHALLENGE_TTL: Duration = Duration::from_secs(259_200);

/// Stable identifier of a one-to-one conversation on the messaging platform.
///
/// Kept as a string because the platform's numeric ids are compared textually
/// against the configured operator id and embedded in store keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ConversationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ConversationId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier the platform assigns to a message inside a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub i64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}
