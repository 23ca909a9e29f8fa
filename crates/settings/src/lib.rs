//! RelayGate Settings
//!
//! Configuration for the relay daemon.
//!
//! ## Sources
//!
//! 1. Built-in defaults
//! 2. An optional JSON file (missing file means defaults)
//! 3. Environment overrides (`BOT_TOKEN`, `ADMIN_UID`, `BOT_API_URL`,
//!    `PORT`, `WEBHOOK_SECRET`, `DB_PATH`, `FRAUD_DB_URL`)
//!
//! ## Usage
//!
//! ```no_run
//! use relaygate_settings::Settings;
//!
//! let mut settings = Settings::load_or_default()?;
//! settings.apply_env();
//! settings.validate()?;
//! # Ok::<(), relaygate_settings::SettingsError>(())
//! ```

mod config;

pub use config::{
    AbuseSettings, BotSettings, MessageSettings, ServerSettings, Settings, StoreSettings,
};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to read settings: {0}")]
    ReadError(std::io::Error),

    #[error("Failed to write settings: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to parse settings: {0}")]
    ParseError(serde_json::Error),

    #[error("Failed to create config directory: {0}")]
    CreateDirError(std::io::Error),

    #[error("Invalid settings: {0}")]
    Invalid(String),
}

pub type Result<T> = std::result::Result<T, SettingsError>;

/// Get the default settings file path
pub fn default_settings_path() -> PathBuf {
    PathBuf::from("relaygate.json")
}
