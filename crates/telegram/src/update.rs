//! Webhook update model
//!
//! Only the fields the relay needs are modelled, all optional, so an
//! incomplete update degrades to fewer events instead of a parse failure.

use serde::Deserialize;

use relaygate_core::{ConversationId, InboundEvent, MessageEvent, MessageId, SelectionEvent};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<Message>,
    #[serde(default)]
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Message {
    #[serde(default)]
    pub message_id: Option<i64>,
    #[serde(default)]
    pub chat: Option<Chat>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Chat {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: Option<i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub from: Option<User>,
    #[serde(default)]
    pub data: Option<String>,
    #[serde(default)]
    pub message: Option<Box<Message>>,
}

impl Update {
    /// Events carried by this update, message first
    pub fn into_events(self) -> Vec<InboundEvent> {
        let mut events = Vec::with_capacity(2);
        if let Some(event) = self.message.and_then(Message::into_event) {
            events.push(InboundEvent::Message(event));
        }
        if let Some(event) = self.callback_query.and_then(CallbackQuery::into_event) {
            events.push(InboundEvent::Selection(event));
        }
        events
    }
}

impl Message {
    fn into_event(self) -> Option<MessageEvent> {
        let message_id = self.message_id?;
        let chat_id = self.chat.and_then(|c| c.id)?;
        let sender = self.from.and_then(|u| u.id).unwrap_or(chat_id);
        Some(MessageEvent {
            conversation_id: ConversationId::from(chat_id),
            sender_id: ConversationId::from(sender),
            text: self.text.unwrap_or_default(),
            message_id: MessageId(message_id),
            replied_to: self.reply_to_message.and_then(|m| m.message_id).map(MessageId),
        })
    }
}

impl CallbackQuery {
    fn into_event(self) -> Option<SelectionEvent> {
        Some(SelectionEvent {
            selection_id: self.id?,
            sender_id: ConversationId::from(self.from.and_then(|u| u.id)?),
            payload: self.data?,
            message_id: self.message.and_then(|m| m.message_id).map(MessageId),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> Vec<InboundEvent> {
        serde_json::from_value::<Update>(value).unwrap().into_events()
    }

    #[test]
    fn test_plain_message() {
        let events = parse(json!({
            "update_id": 1,
            "message": {
                "message_id": 5,
                "chat": { "id": 42, "type": "private" },
                "from": { "id": 42, "is_bot": false, "first_name": "A" },
                "text": "hello"
            }
        }));
        assert_eq!(
            events,
            vec![InboundEvent::Message(MessageEvent {
                conversation_id: ConversationId::from("42"),
                sender_id: ConversationId::from("42"),
                text: "hello".to_string(),
                message_id: MessageId(5),
                replied_to: None,
            })]
        );
    }

    #[test]
    fn test_reply_message() {
        let events = parse(json!({
            "message": {
                "message_id": 900,
                "chat": { "id": 1000 },
                "text": "/block",
                "reply_to_message": { "message_id": 555, "chat": { "id": 1000 } }
            }
        }));
        let InboundEvent::Message(message) = &events[0] else {
            panic!("expected a message event");
        };
        assert_eq!(message.replied_to, Some(MessageId(555)));
        assert_eq!(message.sender_id, ConversationId::from("1000"));
    }

    #[test]
    fn test_media_message_has_empty_text() {
        let events = parse(json!({
            "message": { "message_id": 6, "chat": { "id": 42 }, "photo": [] }
        }));
        let InboundEvent::Message(message) = &events[0] else {
            panic!("expected a message event");
        };
        assert!(message.text.is_empty());
    }

    #[test]
    fn test_callback_query() {
        let events = parse(json!({
            "callback_query": {
                "id": "cb-1",
                "from": { "id": 42 },
                "data": "verify_7_7",
                "message": { "message_id": 77, "chat": { "id": 42 } }
            }
        }));
        assert_eq!(
            events,
            vec![InboundEvent::Selection(SelectionEvent {
                sender_id: ConversationId::from("42"),
                payload: "verify_7_7".to_string(),
                selection_id: "cb-1".to_string(),
                message_id: Some(MessageId(77)),
            })]
        );
    }

    #[test]
    fn test_message_then_selection_order() {
        let events = parse(json!({
            "message": { "message_id": 5, "chat": { "id": 42 }, "text": "hi" },
            "callback_query": { "id": "cb-1", "from": { "id": 42 }, "data": "verify_7_7" }
        }));
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], InboundEvent::Message(_)));
        assert!(matches!(events[1], InboundEvent::Selection(_)));
    }

    // ==================== NEGATIVE TESTS ====================

    #[test]
    fn test_empty_update() {
        assert!(parse(json!({ "update_id": 9 })).is_empty());
    }

    #[test]
    fn test_message_without_chat_is_dropped() {
        assert!(parse(json!({ "message": { "message_id": 5, "text": "hi" } })).is_empty());
    }

    #[test]
    fn test_callback_without_data_is_dropped() {
        let events = parse(json!({
            "message": { "message_id": 5, "chat": { "id": 42 } },
            "callback_query": { "id": "cb-1", "from": { "id": 42 } }
        }));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], InboundEvent::Message(_)));
    }

    #[test]
    fn test_callback_without_sender_is_dropped() {
        assert!(parse(json!({ "callback_query": { "id": "cb-1", "data": "verify_7_7" } })).is_empty());
    }
}
