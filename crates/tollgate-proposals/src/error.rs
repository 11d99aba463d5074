//! Error types and results for proposal operations.

use crate::proposal::ProposalStatus;

/// Errors that can occur in proposal operations.
///
/// `NotFound` deliberately covers both "no such proposal" and "proposal
/// owned by someone else" — cross-owner lookups must not leak existence.
#[derive(Debug, thiserror::Error)]
pub enum ProposalError {
    /// No proposal with this ID is visible to the caller.
    #[error("proposal not found: {id}")]
    NotFound {
        /// The proposal identifier.
        id: String,
    },

    /// The proposal's TTL elapsed before it was committed.
    #[error("proposal expired: {id}")]
    Expired {
        /// The proposal identifier.
        id: String,
    },

    /// The proposal already left `pending`; terminal states are idempotent.
    #[error("proposal already resolved: {id} is {status}")]
    AlreadyResolved {
        /// The proposal identifier.
        id: String,
        /// The terminal status the proposal is in.
        status: ProposalStatus,
    },

    /// Storage backend error (lock poisoned, persistence failed, etc.).
    #[error("proposal storage error: {0}")]
    Storage(String),
}

/// Result type for proposal operations.
pub type ProposalResult<T> = Result<T, ProposalError>;
