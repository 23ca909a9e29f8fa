//! Bot API client
//!
//! Every method is a `POST {base}/bot{token}/{method}` with a JSON body.
//! The platform answers `{"ok": bool, "result": ..., "description": ...}`
//! whatever the HTTP status, so the envelope decides success.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::debug;

use relaygate_core::{ChoiceKeyboard, ConversationId, MessageId};
use relaygate_relay::{Messenger, MessengerError};

use crate::{Result, TelegramError};

pub const DEFAULT_API_BASE_URL: &str = "https://api.telegram.org";

/// Bot API client configuration
#[derive(Debug, Clone)]
pub struct BotApiConfig {
    /// API root, without the `/bot<token>` part
    pub base_url: String,
    pub token: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for BotApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            token: String::new(),
            timeout: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    ok: bool,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    description: Option<String>,
}

pub struct BotApiClient {
    config: BotApiConfig,
    http: reqwest::Client,
}

impl BotApiClient {
    pub fn new(config: BotApiConfig) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { config, http })
    }

    fn method_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.token,
            method
        )
    }

    /// Call a Bot API method and return its `result`
    pub async fn call(&self, method: &str, params: &Value) -> Result<Value> {
        debug!("Bot API call: {}", method);
        // The URL carries the token; keep it out of errors and logs
        let response = self
            .http
            .post(self.method_url(method))
            .json(params)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;
        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let envelope: Envelope = serde_json::from_slice(&body).map_err(|e| {
            TelegramError::MalformedResponse(format!("{} (HTTP {}): {}", method, status.as_u16(), e))
        })?;

        if !envelope.ok {
            return Err(TelegramError::Api {
                method: method.to_string(),
                description: envelope
                    .description
                    .unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
            });
        }
        Ok(envelope.result.unwrap_or(Value::Null))
    }
}

/// Bot API `reply_markup` for a choice keyboard
fn inline_keyboard(keyboard: &ChoiceKeyboard) -> Value {
    let rows: Vec<Value> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|choice| json!({ "text": choice.label, "callback_data": choice.payload }))
                .collect()
        })
        .collect();
    json!({ "inline_keyboard": rows })
}

#[async_trait]
impl Messenger for BotApiClient {
    async fn send_text(
        &self,
        to: &ConversationId,
        text: &str,
        keyboard: Option<&ChoiceKeyboard>,
    ) -> std::result::Result<(), MessengerError> {
        let mut params = json!({ "chat_id": to.as_str(), "text": text });
        if let Some(keyboard) = keyboard {
            params["reply_markup"] = inline_keyboard(keyboard);
        }
        self.call("sendMessage", &params).await?;
        Ok(())
    }

    async fn copy_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> std::result::Result<(), MessengerError> {
        let params = json!({
            "chat_id": to.as_str(),
            "from_chat_id": from.as_str(),
            "message_id": message_id.0,
        });
        self.call("copyMessage", &params).await?;
        Ok(())
    }

    async fn relay_message(
        &self,
        to: &ConversationId,
        from: &ConversationId,
        message_id: MessageId,
    ) -> std::result::Result<MessageId, MessengerError> {
        let params = json!({
            "chat_id": to.as_str(),
            "from_chat_id": from.as_str(),
            "message_id": message_id.0,
        });
        let result = self.call("forwardMessage", &params).await?;
        result
            .get("message_id")
            .and_then(Value::as_i64)
            .map(MessageId)
            .ok_or_else(|| MessengerError::MalformedResponse("forwardMessage result has no message_id".to_string()))
    }

    async fn edit_text(
        &self,
        conversation: &ConversationId,
        message_id: MessageId,
        text: &str,
    ) -> std::result::Result<(), MessengerError> {
        let params = json!({
            "chat_id": conversation.as_str(),
            "message_id": message_id.0,
            "text": text,
        });
        self.call("editMessageText", &params).await?;
        Ok(())
    }

    async fn acknowledge_selection(
        &self,
        selection_id: &str,
        text: &str,
        emphasize: bool,
    ) -> std::result::Result<(), MessengerError> {
        let params = json!({
            "callback_query_id": selection_id,
            "text": text,
            "show_alert": emphasize,
        });
        self.call("answerCallbackQuery", &params).await?;
        Ok(())
    }
}
