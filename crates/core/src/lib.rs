//! RelayGate Core Types
//!
//! This crate defines the data structures shared by every RelayGate crate:
//! conversation and message identifiers, the inbound event model, the
//! selection payload wire format and the choice keyboard sent with a
//! challenge.

mod error;
mod event;
mod keyboard;
mod types;

pub use error::*;
pub use event::*;
pub use keyboard::*;
pub use types::*;
