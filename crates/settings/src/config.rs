//! Configuration types

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{default_settings_path, Result, SettingsError};

/// Main settings structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Bot API access
    #[serde(default)]
    pub bot: BotSettings,

    /// Webhook listener
    #[serde(default)]
    pub server: ServerSettings,

    /// Persistent state
    #[serde(default)]
    pub store: StoreSettings,

    /// Abuse list gate
    #[serde(default)]
    pub abuse: AbuseSettings,

    /// User-facing texts
    #[serde(default)]
    pub messages: MessageSettings,

    /// Custom settings file path (not serialized)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the default path, or create defaults
    pub fn load_or_default() -> Result<Self> {
        Self::load_from(&default_settings_path())
    }

    /// Load settings from a specific path, or create defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path).map_err(SettingsError::ReadError)?;
            let mut settings: Settings =
                serde_json::from_str(&content).map_err(SettingsError::ParseError)?;
            settings.config_path = Some(path.to_path_buf());
            info!("Loaded settings from {:?}", path);
            Ok(settings)
        } else {
            let mut settings = Self::default();
            settings.config_path = Some(path.to_path_buf());
            Ok(settings)
        }
    }

    /// Save settings to the configured path
    pub fn save(&self) -> Result<()> {
        let path = self.config_path.clone().unwrap_or_else(default_settings_path);
        self.save_to(&path)
    }

    /// Save settings to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(SettingsError::CreateDirError)?;
            }
        }

        let content = serde_json::to_string_pretty(self).map_err(SettingsError::ParseError)?;
        std::fs::write(path, content).map_err(SettingsError::WriteError)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }

    /// Apply overrides from the process environment
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from any variable lookup; empty values are ignored
    pub fn apply_env_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(token) = var("BOT_TOKEN") {
            self.bot.token = token;
        }
        if let Some(operator) = var("ADMIN_UID") {
            self.bot.operator_id = operator;
        }
        if let Some(url) = var("BOT_API_URL") {
            self.bot.api_base_url = url;
        }
        if let Some(port) = var("PORT") {
            self.server.listen_addr = with_port(&self.server.listen_addr, &port);
        }
        if let Some(secret) = var("WEBHOOK_SECRET") {
            self.server.webhook_secret = secret;
        }
        if let Some(path) = var("DB_PATH") {
            self.store.path = PathBuf::from(path);
        }
        if let Some(url) = var("FRAUD_DB_URL") {
            self.abuse.list_url = url;
        }
    }

    /// Check that the daemon can start with these settings
    pub fn validate(&self) -> Result<()> {
        if self.bot.token.is_empty() {
            return Err(SettingsError::Invalid("bot token is not set (BOT_TOKEN)".to_string()));
        }
        if self.bot.operator_id.is_empty() {
            return Err(SettingsError::Invalid("operator id is not set (ADMIN_UID)".to_string()));
        }
        if self.server.webhook_secret.is_empty() {
            return Err(SettingsError::Invalid("webhook secret is not set (WEBHOOK_SECRET)".to_string()));
        }
        self.server.socket_addr()?;
        if self.bot.request_timeout_secs == 0 {
            return Err(SettingsError::Invalid("bot.request_timeout_secs must be positive".to_string()));
        }
        if self.abuse.timeout_secs == 0 {
            return Err(SettingsError::Invalid("abuse.timeout_secs must be positive".to_string()));
        }
        Ok(())
    }
}

/// Replace the port of `addr`, keeping its host
fn with_port(addr: &str, port: &str) -> String {
    let host = addr.rsplit_once(':').map(|(host, _)| host).unwrap_or("0.0.0.0");
    format!("{}:{}", host, port)
}

/// Bot API access
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotSettings {
    #[serde(default)]
    pub token: String,

    /// Conversation id of the operator
    #[serde(default)]
    pub operator_id: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            operator_id: String::new(),
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_timeout(),
        }
    }
}

impl BotSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Webhook listener
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Expected `X-Telegram-Bot-Api-Secret-Token` header value
    #[serde(default)]
    pub webhook_secret: String,
}

fn default_listen_addr() -> String {
    "0.0.0.0:25591".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            webhook_secret: String::new(),
        }
    }
}

impl ServerSettings {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .map_err(|e| SettingsError::Invalid(format!("listen address {:?}: {}", self.listen_addr, e)))
    }
}

/// Persistent state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,

    /// Lifetime of an unanswered challenge; 0 keeps it until answered
    #[serde(default = "default_challenge_ttl")]
    pub challenge_ttl_secs: u64,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("bot_data.json")
}

fn default_challenge_ttl() -> u64 {
    259_200
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
            challenge_ttl_secs: default_challenge_ttl(),
        }
    }
}

impl StoreSettings {
    pub fn challenge_ttl(&self) -> Option<Duration> {
        match self.challenge_ttl_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

/// Abuse list gate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbuseSettings {
    /// Plain-text id list; empty disables the check
    #[serde(default = "default_list_url")]
    pub list_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_list_url() -> String {
    "https://raw.githubusercontent.com/Squarelan/telegram-verify-bot/main/data/fraud.db".to_string()
}

impl Default for AbuseSettings {
    fn default() -> Self {
        Self {
            list_url: default_list_url(),
            timeout_secs: default_timeout(),
        }
    }
}

impl AbuseSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// User-facing texts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageSettings {
    /// Reply to `/start`; the built-in greeting when unset
    #[serde(default)]
    pub greeting: Option<String>,
}
