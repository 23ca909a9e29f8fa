//! Store key namespaces
//!
//! Each logical table owns one prefix. The prefixes are chosen so that no
//! key of one table can be produced by another table's builder.

use relaygate_core::{ConversationId, MessageId};

/// Pending challenge answer for a user
pub fn pending_key(id: &ConversationId) -> String {
    format!("verify-{}", id)
}

/// Verified flag for a user
pub fn verified_key(id: &ConversationId) -> String {
    format!("verified-{}", id)
}

/// Origin of a message relayed to the operator
pub fn mapping_key(relayed: MessageId) -> String {
    format!("msg-map-{}", relayed)
}

/// Block flag for a user
pub fn blocked_key(id: &ConversationId) -> String {
    format!("isblocked-{}", id)
}
