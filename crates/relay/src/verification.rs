//! Verification state machine
//!
//! ```text
//!  Unverified ──first message──▶ Challenged(answer) ──right answer──▶ Verified
//!       ▲                          │  ▲                                 │
//!       │                          └──┘ wrong answer / reminder         │
//!       └──────────────── verified flag expires (3 days) ◀──────────────┘
//! ```
//!
//! State is derived from two store keys on every read. The verified flag
//! wins over a pending answer, so a user is never observed as both.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::info;

use relaygate_core::{ConversationId, SelectionPayload, VERIFIED_TTL};
use relaygate_store::TtlStore;

use crate::keys::{pending_key, verified_key};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationState {
    Unverified,
    Challenged { expected: String },
    Verified,
}

/// Result of submitting an answer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    /// Correct answer to the live challenge; the user is now verified
    Accepted,
    /// Wrong answer, or an answer to a challenge that is not the live one
    Rejected,
    /// Nothing to do, the user already passed
    AlreadyVerified,
    /// No live challenge to answer
    Expired,
}

pub struct Verifier {
    store: Arc<TtlStore>,
    /// Lifetime of an unanswered challenge, `None` to keep it forever
    challenge_ttl: Option<Duration>,
}

impl Verifier {
    pub fn new(store: Arc<TtlStore>, challenge_ttl: Option<Duration>) -> Self {
        Self { store, challenge_ttl }
    }

    pub fn state(&self, id: &ConversationId) -> VerificationState {
        if self.store.get_as::<bool>(&verified_key(id)).unwrap_or(false) {
            return VerificationState::Verified;
        }
        match self.store.get(&pending_key(id)).and_then(answer_text) {
            Some(expected) => VerificationState::Challenged { expected },
            None => VerificationState::Unverified,
        }
    }

    /// Store the expected answer of a freshly issued challenge
    pub fn issue(&self, id: &ConversationId, expected: &str) -> Result<()> {
        self.store.put(&pending_key(id), expected, self.challenge_ttl)?;
        info!("Challenge issued to {}", id);
        Ok(())
    }

    /// Check a submitted answer against the live challenge
    ///
    /// The payload's expected value must also match the stored one, so an
    /// answer to an old or forged challenge is rejected.
    pub fn resolve(&self, id: &ConversationId, payload: &SelectionPayload) -> Result<AnswerOutcome> {
        let expected = match self.state(id) {
            VerificationState::Verified => return Ok(AnswerOutcome::AlreadyVerified),
            VerificationState::Unverified => return Ok(AnswerOutcome::Expired),
            VerificationState::Challenged { expected } => expected,
        };

        if !payload.is_match() || payload.expected != expected {
            return Ok(AnswerOutcome::Rejected);
        }

        self.store.put(&verified_key(id), &true, Some(VERIFIED_TTL))?;
        self.store.delete(&pending_key(id))?;
        info!("{} passed verification", id);
        Ok(AnswerOutcome::Accepted)
    }
}

/// Pending answers are strings, but accept bare numbers from older snapshots
fn answer_text(value: Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relaygate_store::ManualClock;

    fn setup(challenge_ttl: Option<Duration>) -> (Verifier, Arc<TtlStore>, ManualClock) {
        let clock = ManualClock::new(0);
        let store = Arc::new(TtlStore::ephemeral(Arc::new(clock.clone())));
        (Verifier::new(store.clone(), challenge_ttl), store, clock)
    }

    fn user() -> ConversationId {
        ConversationId::from("42")
    }

    #[test]
    fn test_fresh_user_is_unverified() {
        let (verifier, _, _) = setup(None);
        assert_eq!(verifier.state(&user()), VerificationState::Unverified);
    }

    #[test]
    fn test_issue_moves_to_challenged() {
        let (verifier, _, _) = setup(None);
        verifier.issue(&user(), "7").unwrap();
        assert_eq!(
            verifier.state(&user()),
            VerificationState::Challenged { expected: "7".to_string() }
        );
    }

    #[test]
    fn test_correct_answer_verifies_and_clears_pending() {
        let (verifier, store, _) = setup(None);
        verifier.issue(&user(), "7").unwrap();

        let outcome = verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();

        assert_eq!(outcome, AnswerOutcome::Accepted);
        assert_eq!(verifier.state(&user()), VerificationState::Verified);
        assert!(!store.contains("verify-42"));
        assert_eq!(store.get_as::<bool>("verified-42"), Some(true));
    }

    #[test]
    fn test_second_submission_has_no_effect() {
        let (verifier, store, clock) = setup(None);
        verifier.issue(&user(), "7").unwrap();
        verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();
        let snapshot = store.snapshot();

        clock.advance(Duration::from_secs(60));
        let outcome = verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();

        assert_eq!(outcome, AnswerOutcome::AlreadyVerified);
        // Expiry not refreshed
        assert_eq!(store.snapshot(), snapshot);
    }

    #[test]
    fn test_repeated_wrong_answers_stay_challenged() {
        let (verifier, _, _) = setup(None);
        verifier.issue(&user(), "7").unwrap();

        for wrong in ["3", "8", "12", "6"] {
            let outcome = verifier.resolve(&user(), &SelectionPayload::new(wrong, "7")).unwrap();
            assert_eq!(outcome, AnswerOutcome::Rejected);
            assert_eq!(
                verifier.state(&user()),
                VerificationState::Challenged { expected: "7".to_string() }
            );
        }

        let outcome = verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Accepted);
    }

    #[test]
    fn test_verified_expires_after_three_days() {
        let (verifier, _, clock) = setup(None);
        verifier.issue(&user(), "7").unwrap();
        verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();

        clock.advance(VERIFIED_TTL);
        assert_eq!(verifier.state(&user()), VerificationState::Verified);

        clock.advance(Duration::from_millis(1));
        assert_eq!(verifier.state(&user()), VerificationState::Unverified);
    }

    #[test]
    fn test_verified_wins_over_pending() {
        let (verifier, store, _) = setup(None);
        store.put("verify-42", "7", None).unwrap();
        store.put("verified-42", &true, None).unwrap();
        assert_eq!(verifier.state(&user()), VerificationState::Verified);
    }

    #[test]
    fn test_numeric_pending_answer_is_accepted() {
        let (verifier, store, _) = setup(None);
        store.put("verify-42", &7, None).unwrap();
        assert_eq!(
            verifier.state(&user()),
            VerificationState::Challenged { expected: "7".to_string() }
        );
    }

    #[test]
    fn test_bounded_challenge_expires() {
        let (verifier, _, clock) = setup(Some(Duration::from_secs(600)));
        verifier.issue(&user(), "7").unwrap();

        clock.advance(Duration::from_secs(601));
        assert_eq!(verifier.state(&user()), VerificationState::Unverified);

        let outcome = verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Expired);
        assert_eq!(verifier.state(&user()), VerificationState::Unverified);
    }

    #[test]
    fn test_unbounded_challenge_persists() {
        let (verifier, _, clock) = setup(None);
        verifier.issue(&user(), "7").unwrap();
        clock.advance(Duration::from_secs(365 * 24 * 3600));
        assert!(matches!(verifier.state(&user()), VerificationState::Challenged { .. }));
    }

    // ==================== NEGATIVE TESTS ====================

    #[test]
    fn test_stale_payload_is_rejected() {
        let (verifier, _, _) = setup(None);
        verifier.issue(&user(), "7").unwrap();

        // Matches itself, but not the live challenge
        let outcome = verifier.resolve(&user(), &SelectionPayload::new("12", "12")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Rejected);
        assert!(matches!(verifier.state(&user()), VerificationState::Challenged { .. }));
    }

    #[test]
    fn test_answer_without_challenge() {
        let (verifier, _, _) = setup(None);
        let outcome = verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Expired);
        assert_eq!(verifier.state(&user()), VerificationState::Unverified);
    }

    #[test]
    fn test_literal_answer_comparison() {
        let (verifier, _, _) = setup(None);
        verifier.issue(&user(), "7").unwrap();
        let outcome = verifier.resolve(&user(), &SelectionPayload::new("07", "07")).unwrap();
        assert_eq!(outcome, AnswerOutcome::Rejected);
    }

    #[test]
    fn test_users_are_independent() {
        let (verifier, _, _) = setup(None);
        let other = ConversationId::from("43");
        verifier.issue(&user(), "7").unwrap();
        verifier.resolve(&user(), &SelectionPayload::new("7", "7")).unwrap();
        assert_eq!(verifier.state(&other), VerificationState::Unverified);
    }
}
