//! Error types and results for the ledger.

/// Errors that can occur in ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// A payment record was not found.
    #[error("payment record not found: {id}")]
    RecordNotFound {
        /// The record identifier that was not found.
        id: String,
    },

    /// Storage backend error (lock poisoned, persistence failed, etc.).
    #[error("ledger storage error: {0}")]
    Storage(String),
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
