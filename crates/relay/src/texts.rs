//! User-facing texts

use relaygate_core::ConversationId;

pub const GREETING: &str = "Hello! This is my chat bot. Please pass verification to chat with me. \
Your messages will be forwarded to me.";

pub const OPERATOR_USAGE: &str = "Usage: Reply to a forwarded message and send your reply, \
or use `/block`, `/unblock`, `/checkblock` commands";

pub const CANNOT_RESOLVE: &str = "Cannot find corresponding user";
pub const CANNOT_BLOCK_SELF: &str = "Cannot block yourself";

pub const BLOCKED: &str = "You are blocked";
pub const CHALLENGE_REMINDER: &str = "Please click the button above to select your answer";
pub const VERIFIED: &str = "Verification successful! You can now use the bot.";
pub const WRONG_ANSWER: &str = "Wrong answer, please try again";
pub const ALREADY_VERIFIED: &str = "You are already verified";
pub const CHALLENGE_EXPIRED: &str = "This challenge has expired, please send a new message";

pub fn challenge_prompt(question: &str) -> String {
    format!(
        "Please answer the following question to verify you are not a bot:\n\n{} = ?",
        question
    )
}

pub fn blocked_confirmation(id: &ConversationId) -> String {
    format!("UID:{} blocked successfully", id)
}

pub fn unblocked_confirmation(id: &ConversationId) -> String {
    format!("UID:{} unblocked successfully", id)
}

pub fn block_status(id: &ConversationId, blocked: bool) -> String {
    let status = if blocked { "is blocked" } else { "is not blocked" };
    format!("UID:{} {}", id, status)
}

pub fn abuse_warning(id: &ConversationId) -> String {
    format!("Warning: Fraud detected\nUID: {}", id)
}
