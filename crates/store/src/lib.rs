//! RelayGate Store
//!
//! A small persistent key-value store with per-entry time-to-live.
//!
//! ## Semantics
//!
//! - Expiry is evaluated lazily: an entry whose deadline has passed reads as
//!   absent and is purged on that read. There is no background sweeper.
//! - Every mutation rewrites the full snapshot before it returns, so the
//!   file on disk always reflects the last acknowledged write.
//! - An unreadable or malformed snapshot is set aside and the store starts
//!   empty; startup never fails because of it.
//!
//! ## Blocking
//!
//! All calls are synchronous. A mutation holds the table lock through the
//! file rewrite and fsync, so readers of any key wait for it, and an async
//! caller stalls its runtime worker for that long. Callers that cannot
//! afford this should move store work onto `tokio::task::spawn_blocking`.
//!
//! ## Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use relaygate_store::TtlStore;
//!
//! let store = TtlStore::open("bot_data.json");
//! store.put("verified-42", &true, Some(Duration::from_secs(259_200)))?;
//! assert_eq!(store.get_as::<bool>("verified-42"), Some(true));
//! # Ok::<(), relaygate_store::StoreError>(())
//! ```

mod clock;
mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use store::{StoredEntry, TtlStore};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to write store snapshot: {0}")]
    WriteError(std::io::Error),

    #[error("Failed to serialize store value: {0}")]
    SerializeError(serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StoreError>;
