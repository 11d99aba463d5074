//! Common types used throughout Tollgate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for the principal that owns proposals and records.
///
/// In the server deployment this is the authenticated account id; in the
/// CLI deployment it identifies the local wallet session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OwnerId(pub Uuid);

impl OwnerId {
    /// Create a new random owner ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create an owner ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for OwnerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "owner:{}", self.0)
    }
}

/// Unique identifier for a conversational session.
///
/// Confirmation state is scoped to a session; two concurrent sessions
/// never share a pending action slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub Uuid);

impl SessionId {
    /// Create a new random session ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a session ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session:{}", self.0)
    }
}

/// Unique identifier for an action proposal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProposalId(pub Uuid);

impl ProposalId {
    /// Create a new random proposal ID.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a proposal ID from a UUID.
    #[must_use]
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl Default for ProposalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ProposalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "prop:{}", self.0)
    }
}

/// Timestamp wrapper for consistent handling throughout Tollgate.
///
/// All expiry and spend-window logic is a wall-clock comparison against
/// values of this type at call time; nothing schedules timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub DateTime<Utc>);

impl Timestamp {
    /// Get the current timestamp.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Create a timestamp from a `DateTime<Utc>`.
    #[must_use]
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Check if this timestamp is in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        self.0 < Utc::now()
    }

    /// Check if this timestamp is in the future.
    #[must_use]
    pub fn is_future(&self) -> bool {
        self.0 > Utc::now()
    }

    /// Offset this timestamp by a duration, saturating on overflow.
    #[must_use]
    pub fn plus(&self, duration: chrono::Duration) -> Self {
        Self(
            self.0
                .checked_add_signed(duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        )
    }

    /// Offset this timestamp backwards by a duration, saturating on underflow.
    #[must_use]
    pub fn minus(&self, duration: chrono::Duration) -> Self {
        Self(
            self.0
                .checked_sub_signed(duration)
                .unwrap_or(DateTime::<Utc>::MIN_UTC),
        )
    }

    /// Get the inner `DateTime<Utc>`.
    #[must_use]
    pub fn into_inner(self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%dT%H:%M:%SZ"))
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl From<Timestamp> for DateTime<Utc> {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}

/// EVM chain identifier (e.g. 8453 for Base, 1 for Ethereum mainnet).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChainId(pub u64);

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chain:{}", self.0)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// A token contract address.
///
/// EVM addresses are hex and case is only a checksum convention, so
/// equality, hashing, and allowlist membership are all case-insensitive.
/// The original casing is preserved for display.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenAddress(String);

impl TokenAddress {
    /// Create a token address, preserving the given casing for display.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Self {
        Self(address.into())
    }

    /// The address as originally written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lowercase form used for comparisons.
    #[must_use]
    pub fn normalized(&self) -> String {
        self.0.to_ascii_lowercase()
    }
}

impl PartialEq for TokenAddress {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for TokenAddress {}

impl std::hash::Hash for TokenAddress {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.normalized().hash(state);
    }
}

impl fmt::Display for TokenAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for TokenAddress {
    fn from(address: &str) -> Self {
        Self::new(address)
    }
}

/// Format a USD amount with two decimal places and a dollar sign.
///
/// Used everywhere a cap or spend total appears in a user-facing message,
/// so `4500.0` renders as `$4500.00`.
#[must_use]
pub fn format_usd(amount: f64) -> String {
    format!("${amount:.2}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_display() {
        let id = OwnerId::new();
        assert!(id.to_string().starts_with("owner:"));
    }

    #[test]
    fn test_proposal_id_roundtrip() {
        let id = ProposalId::new();
        let json = serde_json::to_string(&id).unwrap();
        let back: ProposalId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    #[test]
    fn test_timestamp_ordering() {
        let early = Timestamp::from_datetime(Utc::now());
        let late = early.plus(chrono::Duration::seconds(10));
        assert!(early < late);
        assert_eq!(late.minus(chrono::Duration::seconds(10)), early);
    }

    #[test]
    fn test_token_address_case_insensitive() {
        let mixed = TokenAddress::new("0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913");
        let upper = TokenAddress::new("0X833589FCD6EDB6E08F4C7C32D4F71B54BDA02913");
        let lower = TokenAddress::new("0x833589fcd6edb6e08f4c7c32d4f71b54bda02913");
        assert_eq!(mixed, upper);
        assert_eq!(mixed, lower);

        use std::collections::HashSet;
        let mut set = HashSet::new();
        set.insert(mixed);
        assert!(set.contains(&upper));
    }

    #[test]
    fn test_token_address_preserves_display_casing() {
        let addr = TokenAddress::new("0xAbCd");
        assert_eq!(addr.to_string(), "0xAbCd");
        assert_eq!(addr.normalized(), "0xabcd");
    }

    #[test]
    fn test_format_usd() {
        assert_eq!(format_usd(4500.0), "$4500.00");
        assert_eq!(format_usd(0.1), "$0.10");
        assert_eq!(format_usd(1234.567), "$1234.57");
    }
}
