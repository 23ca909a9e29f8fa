//! Outbound ports
//!
//! The coordinator talks to the messaging platform and to the abuse list
//! only through these traits. Implementations must bound every network call
//! with a timeout and report failure instead of hanging.

use std::collections::HashSet;

use async_trait::async_trait;
use thiserror::Error;

use relaygate_core::{ChoiceKeyboard, ConversationId, MessageId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MessengerError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Platform rejected {method}: {description}")]
    Rejected { method: String, description: String },

    #[error("Malformed platform response: {0}")]
    MalformedResponse(String),
}

/// Outbound messaging API of the chat platform
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send a text, optionally with a choice keyboard attached
    async fn send_text(
        &self,
        to: &ConversationId,
        text: &str,
        keyboard: Option<&ChoiceKeyboard>,
    ) -> Result<(), MessengerError>;

    /// Copy a message without attribution
    async fn copy_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> Result<(), MessengerError>;

    /// Relay a message with attribution, returning the id of the delivered copy
    async fn relay_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> Result<MessageId, MessengerError>;

    /// Replace the text of a message the bot sent
    async fn edit_text(
        &self,
        conversation: &ConversationId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError>;

    /// Answer a selection event; `emphasize` shows the text as an alert
    async fn acknowledge_selection(
        &self,
        selection_id: &str,
        text: &str,
        emphasize: bool,
    ) -> Result<(), MessengerError>;
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AbuseListError {
    #[error("Abuse list unreachable: {0}")]
    Unreachable(String),

    #[error("Abuse list returned status {0}")]
    Status(u16),
}

/// Source of known-abusive conversation ids
#[async_trait]
pub trait AbuseList: Send + Sync {
    async fn is_flagged(&self, id: &ConversationId) -> Result<bool, AbuseListError>;
}

/// A fixed, in-process abuse list
///
/// Used when no remote list is configured, and by tests.
#[derive(Debug, Clone, Default)]
pub struct StaticAbuseList {
    flagged: HashSet<String>,
    unreachable: bool,
}

impl StaticAbuseList {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_flagged<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            flagged: ids.into_iter().map(Into::into).collect(),
            unreachable: false,
        }
    }

    /// A list that always fails, for exercising the fail-open path
    pub fn unreachable() -> Self {
        Self {
            flagged: HashSet::new(),
            unreachable: true,
        }
    }
}

#[async_trait]
impl AbuseList for StaticAbuseList {
    async fn is_flagged(&self, id: &ConversationId) -> Result<bool, AbuseListError> {
        if self.unreachable {
            return Err(AbuseListError::Unreachable("static list marked unreachable".to_string()));
        }
        Ok(self.flagged.contains(id.as_str()))
    }
}
