//! Payment record types.

use serde::{Deserialize, Serialize};
use std::fmt;
use tollgate_core::{Timestamp, TokenAddress};
use uuid::Uuid;

/// Unique identifier for a payment record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentRecordId(pub Uuid);

impl PaymentRecordId {
    /// Create a new random record ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaymentRecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentRecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pay:{}", self.0)
    }
}

/// Lifecycle status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Quoted to the user but not yet committed to execution.
    Proposed,
    /// Committed to execution; funds may be in flight.
    Pending,
    /// Settled on-chain.
    Confirmed,
    /// Execution attempted and failed.
    Failed,
    /// The proposal expired before execution.
    Expired,
}

impl PaymentStatus {
    /// Statuses that count against spending caps.
    ///
    /// Pending payments count so concurrent in-flight requests cannot
    /// collectively exceed the cap.
    #[must_use]
    pub fn counts_against_caps() -> &'static [PaymentStatus] {
        &[PaymentStatus::Pending, PaymentStatus::Confirmed]
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposed => write!(f, "proposed"),
            Self::Pending => write!(f, "pending"),
            Self::Confirmed => write!(f, "confirmed"),
            Self::Failed => write!(f, "failed"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

/// A single payment in the append-only history.
///
/// Created when a payment is committed to execution; updated exactly once
/// on settlement (confirmed with a tx hash, or failed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    /// Record identifier.
    pub id: PaymentRecordId,
    /// When the payment was committed.
    pub timestamp: Timestamp,
    /// Merchant domain being paid.
    pub merchant: String,
    /// Resource path the payment unlocks.
    pub resource: String,
    /// Amount in USD.
    pub amount_usd: f64,
    /// Token used for the payment.
    pub token: TokenAddress,
    /// Current status.
    pub status: PaymentStatus,
    /// On-chain transaction hash, set on confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Settlement receipt payload, if the signer returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

impl PaymentRecord {
    /// Create a new record in the given status, stamped now.
    #[must_use]
    pub fn new(
        merchant: impl Into<String>,
        resource: impl Into<String>,
        amount_usd: f64,
        token: TokenAddress,
        status: PaymentStatus,
    ) -> Self {
        Self {
            id: PaymentRecordId::new(),
            timestamp: Timestamp::now(),
            merchant: merchant.into(),
            resource: resource.into(),
            amount_usd,
            token,
            status,
            tx_hash: None,
            receipt: None,
        }
    }
}
