//! Webhook HTTP listener

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::Router;
use tracing::{debug, error, warn};

use relaygate_relay::RelayCoordinator;
use relaygate_telegram::Update;

/// Header the platform uses to prove it sent the update
pub const SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

#[derive(Clone)]
pub struct WebhookState {
    pub coordinator: Arc<RelayCoordinator>,
    pub secret: Arc<str>,
}

impl WebhookState {
    pub fn new(coordinator: Arc<RelayCoordinator>, secret: impl Into<Arc<str>>) -> Self {
        Self {
            coordinator,
            secret: secret.into(),
        }
    }
}

pub fn build_router(state: WebhookState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/webhook", post(webhook_handler))
        .fallback(not_found_handler)
        .with_state(state)
}

async fn health_handler() -> &'static str {
    "Bot is running"
}

async fn not_found_handler() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

async fn webhook_handler(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    body: Bytes,
) -> (StatusCode, String) {
    let authorized = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == &*state.secret);
    if !authorized {
        warn!("Rejected webhook call with missing or wrong secret");
        return (StatusCode::FORBIDDEN, "Unauthorized".to_string());
    }

    let update: Update = match serde_json::from_slice(&body) {
        Ok(update) => update,
        Err(e) => {
            debug!("Ignoring unparseable update: {}", e);
            return (StatusCode::OK, "Ok".to_string());
        }
    };
    let update_id = update.update_id;
    debug!("Update {:?} received", update_id);

    for event in update.into_events() {
        if let Err(e) = state.coordinator.handle(event).await {
            error!("Failed to handle update {:?}: {}", update_id, e);
            return (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string());
        }
    }
    (StatusCode::OK, "Ok".to_string())
}
