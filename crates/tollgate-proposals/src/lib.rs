//! Tollgate Proposals - durable, time-boxed action proposals.
//!
//! An [`ActionProposal`] is the record of a candidate financial action
//! awaiting a single execution attempt. The registry owns the
//! `pending -> executed | expired | cancelled` state machine; transitions
//! are one-way and nothing ever re-enters `pending`. Proposals are never
//! deleted — resolved rows stay behind as the audit trail.
//!
//! The one mutating operation, [`ProposalRegistry::commit`], is an atomic
//! compare-and-transition: "move to `executed` only if currently `pending`
//! and not yet expired" performed indivisibly, so two concurrent execute
//! calls can never both spend.
//!
//! # Example
//!
//! ```
//! # async fn demo() {
//! use tollgate_core::OwnerId;
//! use tollgate_proposals::{MemoryProposalRegistry, ProposalKind, ProposalRegistry};
//!
//! let registry = MemoryProposalRegistry::new();
//! let owner = OwnerId::new();
//! let proposal = registry
//!     .create(&owner, ProposalKind::X402Payment, serde_json::json!({"url": "https://api.example.com"}), None)
//!     .await
//!     .unwrap();
//!
//! // First commit wins...
//! registry.commit(&proposal.id, &owner).await.unwrap();
//! // ...a second returns AlreadyResolved.
//! assert!(registry.commit(&proposal.id, &owner).await.is_err());
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod proposal;
pub mod registry;

pub use error::{ProposalError, ProposalResult};
pub use proposal::{ActionProposal, ProposalKind, ProposalStatus};
pub use registry::{MemoryProposalRegistry, ProposalRegistry};
