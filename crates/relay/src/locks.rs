//! Per-conversation serialization
//!
//! Handlers take the lock of the conversation whose keys they read and
//! write, so two events from the same user never interleave a
//! get-decide-put sequence. Different users proceed in parallel.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use relaygate_core::ConversationId;

#[derive(Default)]
pub struct ConversationLocks {
    slots: Mutex<HashMap<ConversationId, Arc<AsyncMutex<()>>>>,
}

/// Held while a conversation's state is being decided
pub struct ConversationGuard<'a> {
    locks: &'a ConversationLocks,
    id: ConversationId,
    guard: Option<OwnedMutexGuard<()>>,
}

impl ConversationLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, id: &ConversationId) -> ConversationGuard<'_> {
        let slot = self.slots.lock().entry(id.clone()).or_default().clone();
        let guard = slot.lock_owned().await;
        ConversationGuard {
            locks: self,
            id: id.clone(),
            guard: Some(guard),
        }
    }

    /// Conversations currently locked or waited on
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for ConversationGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.locks.slots.lock();
        // Only the map's own handle left: nobody holds or waits
        if slots.get(&self.id).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(&self.id);
        }
    }
}
