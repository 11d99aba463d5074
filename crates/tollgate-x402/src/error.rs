//! Error types and results for x402 negotiation.

use tollgate_ledger::LedgerError;
use tollgate_proposals::ProposalError;

/// Errors that can occur while negotiating an x402 payment.
///
/// A malformed payment requirement is a `PaymentParse` error and never
/// reaches the authorization engine; a policy refusal is
/// `AuthorizationBlocked` and never reaches the signer.
#[derive(Debug, thiserror::Error)]
pub enum X402Error {
    /// The resource answered without demanding payment.
    ///
    /// Only surfaced by the proposal service, where a proposal for a free
    /// resource is a caller mistake; the client flow passes the response
    /// through instead.
    #[error("no payment required")]
    NoPaymentRequired,

    /// The resource URL could not be parsed.
    #[error("invalid resource url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The 402 response carried a missing or malformed payment requirement.
    #[error("malformed payment requirement: {0}")]
    PaymentParse(String),

    /// Policy evaluation refused the payment.
    #[error("payment blocked by policy: {}", blockers.join("; "))]
    AuthorizationBlocked {
        /// One reason per failed check.
        blockers: Vec<String>,
    },

    /// The HTTP request itself failed.
    #[error("http request failed: {0}")]
    Http(String),

    /// The external signer refused or failed the transfer.
    #[error("signer failed: {0}")]
    Signer(String),

    /// Spend ledger failure.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Proposal registry failure.
    #[error(transparent)]
    Proposal(#[from] ProposalError),
}

impl From<reqwest::Error> for X402Error {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(err.to_string())
    }
}

/// Result type for x402 operations.
pub type X402Result<T> = Result<T, X402Error>;
