//! Authorization verdict types.

use serde::{Deserialize, Serialize};

/// The full list of pass/fail checks for one candidate action.
///
/// A value type: computed fresh on every evaluation, never persisted.
/// `can_proceed` is the logical AND of every check; `blockers` holds one
/// human-readable reason per failed check so callers can show the user
/// everything that must change, not just the first obstacle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorizationResult {
    /// The candidate's chain is allowlisted.
    pub chain_allowed: bool,
    /// The candidate's token is allowlisted.
    pub token_allowed: bool,
    /// The merchant is allowlisted (true when no merchant is in play).
    pub merchant_allowed: bool,
    /// The recipient is allowlisted (true when no recipient is in play).
    pub recipient_allowed: bool,
    /// Both spending caps pass.
    pub caps_allowed: bool,
    /// Which cap blocked, when `caps_allowed` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_block_reason: Option<String>,
    /// Logical AND of every check.
    pub can_proceed: bool,
    /// One human-readable reason per failed check.
    pub blockers: Vec<String>,
}
