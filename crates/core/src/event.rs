//! Inbound event model
//!
//! Platform updates are decoded into [`InboundEvent`]s before they reach the
//! relay coordinator. Everything here is transport-agnostic.

use crate::{ConversationId, MessageId, PayloadError};

/// Text that asks for the greeting instead of starting a conversation
pub const START_COMMAND: &str = "/start";

/// Prefix of every challenge selection payload
pub const SELECTION_PREFIX: &str = "verify";

/// An event delivered by the platform webhook
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(MessageEvent),
    Selection(SelectionEvent),
}

/// A text (or media) message posted in a conversation with the bot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    /// Conversation the message was posted in
    pub conversation_id: ConversationId,
    /// Author of the message
    pub sender_id: ConversationId,
    /// Message text, empty for media without caption
    pub text: String,
    /// Platform id of this message
    pub message_id: MessageId,
    /// Message this one replies to, if any
    pub replied_to: Option<MessageId>,
}

/// A user pressed one of the choices attached to a challenge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEvent {
    /// Who pressed the choice
    pub sender_id: ConversationId,
    /// Raw payload attached to the choice
    pub payload: String,
    /// Id used to acknowledge the selection
    pub selection_id: String,
    /// The challenge message carrying the choices
    pub message_id: Option<MessageId>,
}

/// Decoded `verify_<submitted>_<expected>` payload
///
/// The expected answer travels with the choice so the round trip needs no
/// server-side lookup. It is visible to the client and must not be trusted
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionPayload {
    pub submitted: String,
    pub expected: String,
}

impl SelectionPayload {
    pub fn new(submitted: impl Into<String>, expected: impl Into<String>) -> Self {
        Self {
            submitted: submitted.into(),
            expected: expected.into(),
        }
    }

    /// Decode a raw payload, rejecting anything that is not exactly three
    /// underscore-separated fields behind the verification prefix.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        let parts: Vec<&str> = raw.split('_').collect();
        if parts.first() != Some(&SELECTION_PREFIX) {
            return Err(PayloadError::MissingPrefix);
        }
        if parts.len() != 3 {
            return Err(PayloadError::WrongFieldCount(parts.len()));
        }
        if parts[1].is_empty() || parts[2].is_empty() {
            return Err(PayloadError::EmptyField);
        }
        Ok(Self::new(parts[1], parts[2]))
    }

    /// Encode for attaching to a choice
    pub fn encode(&self) -> String {
        format!("{}_{}_{}", SELECTION_PREFIX, self.submitted, self.expected)
    }

    /// Literal comparison; "07" does not match "7"
    pub fn is_match(&self) -> bool {
        self.submitted == self.expected
    }
}

/// Commands the operator sends as a reply to a relayed message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdminCommand {
    Block,
    Unblock,
    CheckBlock,
}

impl AdminCommand {
    pub fn parse(text: &str) -> Option<Self> {
        match text {
            "/block" => Some(Self::Block),
            "/unblock" => Some(Self::Unblock),
            "/checkblock" => Some(Self::CheckBlock),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Block => "/block",
            Self::Unblock => "/unblock",
            Self::CheckBlock => "/checkblock",
        }
    }
}

/// Who a message event comes from, resolved once per event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Operator replying to a message the bot relayed
    OperatorReply { replied_to: MessageId },
    /// Operator writing without a reply reference
    OperatorBare,
    /// Anyone else
    Guest,
}

impl MessageEvent {
    pub fn route(&self, operator: &ConversationId) -> Route {
        if &self.conversation_id != operator {
            return Route::Guest;
        }
        match self.replied_to {
            Some(replied_to) => Route::OperatorReply { replied_to },
            None => Route::OperatorBare,
        }
    }

    pub fn is_start(&self) -> bool {
        self.text == START_COMMAND
    }
}
