//! RelayGate Relay
//!
//! The relay engine between anonymous users and a single operator.
//!
//! ## Components
//!
//! - **Verifier**: per-user challenge state (Unverified, Challenged, Verified)
//! - **IdentityMap**: relayed message id → originating conversation
//! - **BlockRegistry**: per-user block flag with a self-block guard
//! - **RelayCoordinator**: routes each inbound event through the above and
//!   the outbound [`Messenger`] / [`AbuseList`] ports
//!
//! All state lives in a [`relaygate_store::TtlStore`] passed in at
//! construction; nothing here is global.

mod challenge;
mod coordinator;
mod keys;
mod locks;
mod ports;
mod registry;
mod verification;

pub mod mock;
pub mod texts;

pub use challenge::{Challenge, ChallengeSource, FixedChallenge, MathChallenges};
pub use coordinator::{RelayConfig, RelayCoordinator};
pub use keys::{blocked_key, mapping_key, pending_key, verified_key};
pub use locks::{ConversationGuard, ConversationLocks};
pub use ports::{AbuseList, AbuseListError, Messenger, MessengerError, StaticAbuseList};
pub use registry::{BlockRegistry, IdentityMap};
pub use verification::{AnswerOutcome, VerificationState, Verifier};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Store error: {0}")]
    Store(#[from] relaygate_store::StoreError),

    #[error("The operator cannot block their own conversation")]
    SelfBlock,
}

pub type Result<T> = std::result::Result<T, RelayError>;
