//! RelayGate Telegram
//!
//! Telegram Bot API adapter.
//!
//! ## Components
//!
//! - **BotApiClient**: implements [`relaygate_relay::Messenger`] over the Bot API
//! - **Update**: webhook payload, decoded into [`relaygate_core::InboundEvent`]s
//! - **HttpAbuseList**: newline-separated id list fetched over HTTP

mod abuse;
mod api;
mod update;

pub use abuse::HttpAbuseList;
pub use api::{BotApiClient, BotApiConfig, DEFAULT_API_BASE_URL};
pub use update::{CallbackQuery, Chat, Message, Update, User};

use relaygate_relay::MessengerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TelegramError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Bot API rejected {method}: {description}")]
    Api { method: String, description: String },

    #[error("Malformed Bot API response: {0}")]
    MalformedResponse(String),
}

pub type Result<T> = std::result::Result<T, TelegramError>;

impl From<TelegramError> for MessengerError {
    fn from(e: TelegramError) -> Self {
        match e {
            TelegramError::Http(e) => MessengerError::Transport(e.to_string()),
            TelegramError::Api { method, description } => MessengerError::Rejected { method, description },
            TelegramError::MalformedResponse(msg) => MessengerError::MalformedResponse(msg),
        }
    }
}
