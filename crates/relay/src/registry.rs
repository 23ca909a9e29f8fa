//! Identity mapping and block registry

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use relaygate_core::{ConversationId, MessageId, MAPPING_TTL};
use relaygate_store::TtlStore;

use crate::keys::{blocked_key, mapping_key};
use crate::{RelayError, Result};

/// Remembers which conversation each relayed message came from
pub struct IdentityMap {
    store: Arc<TtlStore>,
}

impl IdentityMap {
    pub fn new(store: Arc<TtlStore>) -> Self {
        Self { store }
    }

    /// Record the origin of a freshly relayed message
    ///
    /// Mappings are write-once: if a live mapping already exists for
    /// `relayed` it is kept and `false` is returned.
    pub fn record_relay(&self, relayed: MessageId, origin: &ConversationId) -> Result<bool> {
        let key = mapping_key(relayed);
        if let Some(existing) = self.resolve_origin(relayed) {
            warn!(
                "Relayed message {} already maps to {}, not remapping to {}",
                relayed, existing, origin
            );
            return Ok(false);
        }
        self.store.put(&key, origin.as_str(), Some(MAPPING_TTL))?;
        Ok(true)
    }

    /// Conversation a relayed message came from, if still known
    pub fn resolve_origin(&self, relayed: MessageId) -> Option<ConversationId> {
        match self.store.get(&mapping_key(relayed))? {
            Value::String(s) if !s.is_empty() => Some(ConversationId::new(s)),
            Value::Number(n) => Some(ConversationId::new(n.to_string())),
            _ => None,
        }
    }
}

/// Per-user block flags, independent of verification
pub struct BlockRegistry {
    store: Arc<TtlStore>,
    operator: ConversationId,
}

impl BlockRegistry {
    pub fn new(store: Arc<TtlStore>, operator: ConversationId) -> Self {
        Self { store, operator }
    }

    /// Set or clear the block flag; blocking the operator is refused
    pub fn set_blocked(&self, id: &ConversationId, blocked: bool) -> Result<()> {
        if blocked && id == &self.operator {
            return Err(RelayError::SelfBlock);
        }
        self.store.put(&blocked_key(id), &blocked, None)?;
        info!("{} {}", id, if blocked { "blocked" } else { "unblocked" });
        Ok(())
    }

    pub fn is_blocked(&self, id: &ConversationId) -> bool {
        self.store.get_as::<bool>(&blocked_key(id)).unwrap_or(false)
    }
}
