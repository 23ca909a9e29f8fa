//! Daemon service wiring

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use relaygate_core::ConversationId;
use relaygate_relay::{AbuseList, RelayConfig, RelayCoordinator, StaticAbuseList};
use relaygate_settings::Settings;
use relaygate_store::TtlStore;
use relaygate_telegram::{BotApiClient, BotApiConfig, HttpAbuseList};

use crate::{build_router, Result, WebhookState};

/// A fully wired relay behind its webhook listener
pub struct DaemonService {
    settings: Settings,
    store: Arc<TtlStore>,
    coordinator: Arc<RelayCoordinator>,
}

impl DaemonService {
    /// Validate `settings` and build every component they describe
    pub fn new(settings: Settings) -> Result<Self> {
        settings.validate()?;

        let store = Arc::new(TtlStore::open(&settings.store.path));

        let messenger = Arc::new(BotApiClient::new(BotApiConfig {
            base_url: settings.bot.api_base_url.clone(),
            token: settings.bot.token.clone(),
            timeout: settings.bot.request_timeout(),
        })?);

        let abuse: Arc<dyn AbuseList> = if settings.abuse.list_url.is_empty() {
            warn!("No abuse list configured, every verified user is relayed");
            Arc::new(StaticAbuseList::empty())
        } else {
            Arc::new(HttpAbuseList::new(
                settings.abuse.list_url.clone(),
                settings.abuse.timeout(),
            )?)
        };

        let mut config = RelayConfig::new(ConversationId::new(settings.bot.operator_id.clone()));
        config.challenge_ttl = settings.store.challenge_ttl();
        if let Some(greeting) = &settings.messages.greeting {
            config.greeting = greeting.clone();
        }

        let coordinator = Arc::new(RelayCoordinator::new(config, store.clone(), messenger, abuse));

        Ok(Self {
            settings,
            store,
            coordinator,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Arc<TtlStore> {
        &self.store
    }

    pub fn coordinator(&self) -> &Arc<RelayCoordinator> {
        &self.coordinator
    }

    pub fn router(&self) -> Router {
        build_router(WebhookState::new(
            self.coordinator.clone(),
            self.settings.server.webhook_secret.as_str(),
        ))
    }

    /// Listen on the configured address until Ctrl-C
    pub async fn run(self) -> Result<()> {
        let addr = self.settings.server.socket_addr()?;
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        info!("Webhook listener on {}", listener.local_addr()?);
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await?;
        info!("Webhook listener stopped");
        Ok(())
    }
}

/// Resolves on Ctrl-C
pub async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received shutdown signal"),
        Err(e) => warn!("Cannot listen for shutdown signal: {}", e),
    }
}
