//! RelayGate Daemon
//!
//! Webhook listener that feeds platform updates into the relay coordinator.
//!
//! ## Components
//!
//! - **DaemonService**: wires settings, store, Bot API client and abuse list
//!   into a [`relaygate_relay::RelayCoordinator`]
//! - **Webhook router**: `GET /` liveness, `POST /webhook` update intake
//!
//! ## Routes
//!
//! - `GET /` - "Bot is running"
//! - `POST /webhook` - requires the `X-Telegram-Bot-Api-Secret-Token` header

mod server;
mod service;

pub use server::{build_router, WebhookState, SECRET_HEADER};
pub use service::{shutdown_signal, DaemonService};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("Settings error: {0}")]
    Settings(#[from] relaygate_settings::SettingsError),

    #[error("Telegram client error: {0}")]
    Telegram(#[from] relaygate_telegram::TelegramError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DaemonError>;
