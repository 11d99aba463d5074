//! Prelude module - commonly used types for convenient import.
//!
//! Use `use tollgate_core::prelude::*;` to import all essential types.

// Common types
pub use crate::{ChainId, OwnerId, ProposalId, SessionId, Timestamp, TokenAddress, format_usd};
