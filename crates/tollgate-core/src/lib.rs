//! Tollgate Core - Shared types for the payment authorization runtime.
//!
//! This crate holds the value types every other Tollgate crate speaks in:
//! principal and session identifiers, timestamps, chain and token
//! identifiers, and USD amount formatting.
//!
//! # Example
//!
//! ```
//! use tollgate_core::types::{ChainId, TokenAddress};
//!
//! let base = ChainId(8453);
//! let usdc = TokenAddress::new("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
//!
//! // Token addresses compare case-insensitively.
//! let lower = TokenAddress::new("0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
//! assert_eq!(usdc, lower);
//! assert_eq!(base.to_string(), "chain:8453");
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;
pub mod types;

pub use types::{ChainId, OwnerId, ProposalId, SessionId, Timestamp, TokenAddress, format_usd};
