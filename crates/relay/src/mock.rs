//! In-memory messenger for development and tests
//!
//! Records every outbound call instead of talking to a platform. Relayed
//! copies get increasing message ids, and failures can be switched on to
//! exercise the error paths.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use relaygate_core::{ChoiceKeyboard, ConversationId, MessageId};

use crate::{Messenger, MessengerError};

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Text {
        to: ConversationId,
        text: String,
        keyboard: Option<ChoiceKeyboard>,
    },
    Copy {
        to: ConversationId,
        from: ConversationId,
        message_id: MessageId,
    },
    Relay {
        to: ConversationId,
        from: ConversationId,
        message_id: MessageId,
        relayed_as: MessageId,
    },
    Edit {
        conversation: ConversationId,
        message_id: MessageId,
        text: String,
    },
    Acknowledge {
        selection_id: String,
        text: String,
        emphasize: bool,
    },
}

#[derive(Debug)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<Sent>>,
    next_relay_id: AtomicI64,
    failing: AtomicBool,
}

impl RecordingMessenger {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Relayed copies are numbered from `first_relay_id`
    pub fn starting_at(first_relay_id: i64) -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            next_relay_id: AtomicI64::new(first_relay_id),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a transport error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().clone()
    }

    /// Drain the recorded calls
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Texts sent to one conversation, in order
    pub fn texts_to(&self, to: &ConversationId) -> Vec<String> {
        self.sent
            .lock()
            .iter()
            .filter_map(|s| match s {
                Sent::Text { to: t, text, .. } if t == to => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn record(&self, sent: Sent) -> Result<(), MessengerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessengerError::Transport("mock messenger is failing".to_string()));
        }
        self.sent.lock().push(sent);
        Ok(())
    }
}

impl Default for RecordingMessenger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send_text(
        &self,
        to: &ConversationId,
        text: &str,
        keyboard: Option<&ChoiceKeyboard>,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Text {
            to: to.clone(),
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        })
    }

    async fn copy_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Copy {
            to: to.clone(),
            from: from.clone(),
            message_id,
        })
    }

    async fn relay_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> Result<MessageId, MessengerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MessengerError::Transport("mock messenger is failing".to_string()));
        }
        let relayed_as = MessageId(self.next_relay_id.fetch_add(1, Ordering::SeqCst));
        self.record(Sent::Relay {
            to: to.clone(),
            from: from.clone(),
            message_id,
            relayed_as,
        })?;
        Ok(relayed_as)
    }

    async fn edit_text(
        &self,
        conversation: &ConversationId,
        message_id: MessageId,
        text: &str,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Edit {
            conversation: conversation.clone(),
            message_id,
            text: text.to_string(),
        })
    }

    async fn acknowledge_selection(
        &self,
        selection_id: &str,
        text: &str,
        emphasize: bool,
    ) -> Result<(), MessengerError> {
        self.record(Sent::Acknowledge {
            selection_id: selection_id.to_string(),
            text: text.to_string(),
            emphasize,
        })
    }
}
