//! Error types and results for the confirmation gate.

/// Errors that can occur in confirmation gate operations.
#[derive(Debug, thiserror::Error)]
pub enum GateError {
    /// A pending action is already awaiting confirmation in this session.
    #[error("an action is already awaiting confirmation: {description}")]
    AlreadyAwaiting {
        /// Description of the action currently held.
        description: String,
    },
}

/// Result type for gate operations.
pub type GateResult<T> = Result<T, GateError>;
