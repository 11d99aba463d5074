//! Proposal types and the status state machine.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use tollgate_core::{OwnerId, ProposalId, Timestamp};

/// Default proposal time-to-live: 5 minutes.
pub(crate) const DEFAULT_TTL_SECS: i64 = 5 * 60;

/// What kind of financial action a proposal represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalKind {
    /// An x402 pay-per-request payment.
    X402Payment,
    /// A direct token transfer.
    TokenTransfer,
    /// An ERC-20 approval.
    TokenApproval,
}

impl fmt::Display for ProposalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X402Payment => write!(f, "x402_payment"),
            Self::TokenTransfer => write!(f, "token_transfer"),
            Self::TokenApproval => write!(f, "token_approval"),
        }
    }
}

/// Proposal lifecycle status.
///
/// Transitions are one-way out of `Pending`; the three other states are
/// terminal and idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProposalStatus {
    /// Awaiting its single execution attempt.
    Pending,
    /// Committed and executed exactly once.
    Executed,
    /// TTL elapsed before commit.
    Expired,
    /// Explicitly cancelled before commit.
    Cancelled,
}

impl ProposalStatus {
    /// Whether this status is terminal.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Executed => write!(f, "executed"),
            Self::Expired => write!(f, "expired"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// A durable, time-boxed record of a candidate action.
///
/// The payload is opaque to the registry — it carries whatever the
/// payment flow needs to execute the action once committed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionProposal {
    /// Proposal identifier.
    pub id: ProposalId,
    /// The principal that created (and may commit) this proposal.
    pub owner_id: OwnerId,
    /// What kind of action this proposes.
    pub kind: ProposalKind,
    /// Action parameters, opaque to the registry.
    pub payload: serde_json::Value,
    /// Current lifecycle status.
    pub status: ProposalStatus,
    /// When the proposal was created.
    pub created_at: Timestamp,
    /// When the proposal stops being committable.
    pub expires_at: Timestamp,
}

impl ActionProposal {
    /// Create a pending proposal with the given TTL (default 5 minutes).
    #[must_use]
    pub fn new(
        owner_id: OwnerId,
        kind: ProposalKind,
        payload: serde_json::Value,
        ttl: Option<Duration>,
    ) -> Self {
        let created_at = Timestamp::now();
        let ttl = ttl.unwrap_or_else(|| Duration::seconds(DEFAULT_TTL_SECS));
        Self {
            id: ProposalId::new(),
            owner_id,
            kind,
            payload,
            status: ProposalStatus::Pending,
            created_at,
            expires_at: created_at.plus(ttl),
        }
    }

    /// Whether the TTL has elapsed (status may still read `Pending` until
    /// a commit or sweep observes the expiry).
    #[must_use]
    pub fn is_overdue(&self, now: Timestamp) -> bool {
        now >= self.expires_at
    }
}
