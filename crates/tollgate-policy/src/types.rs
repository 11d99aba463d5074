//! Policy configuration data model.
//!
//! [`PolicyConfig`] is an immutable snapshot: once built by the loader it
//! is only ever read. Reload produces a fresh snapshot and swaps it in.

use serde::{Deserialize, Serialize};
use tollgate_core::{ChainId, TokenAddress};

/// A token the agent is permitted to spend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenEntry {
    /// Ticker symbol (e.g. `USDC`).
    pub symbol: String,
    /// Token contract address.
    pub address: TokenAddress,
    /// Token decimals (6 for USDC, 18 for most ERC-20s).
    pub decimals: u8,
}

/// A single spending cap rule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapRule {
    /// Whether this cap is enforced.
    pub enabled: bool,
    /// Maximum permitted amount in USD.
    #[serde(rename = "maxUsd")]
    pub max_usd: f64,
}

impl CapRule {
    /// A disabled cap (no limit enforced).
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            max_usd: 0.0,
        }
    }
}

/// Spending caps: per single payment and aggregated over a trailing day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Caps {
    /// Cap applied to each individual payment.
    #[serde(rename = "perPayment")]
    pub per_payment: CapRule,
    /// Cap applied to the trailing 24-hour spend total.
    pub daily: CapRule,
}

/// The authorization policy: allowlists, caps, and risk thresholds.
///
/// Built and validated by the loader; queried by the authorization engine.
/// An empty merchant or recipient allowlist means "allow all" when
/// [`allow_all_when_empty`](Self::allow_all_when_empty) is set (the
/// default) — a deliberate fail-open escape hatch for bootstrap use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Policy schema version.
    pub version: u32,
    /// Chains the agent may transact on.
    #[serde(rename = "chainAllowlist")]
    pub chain_allowlist: Vec<ChainId>,
    /// Tokens the agent may spend.
    #[serde(rename = "tokenAllowlist")]
    pub token_allowlist: Vec<TokenEntry>,
    /// Merchant domains that may be paid. Empty = allow all (if enabled).
    #[serde(rename = "merchantAllowlistDomains")]
    pub merchant_allowlist_domains: Vec<String>,
    /// Recipient addresses that may be paid. Empty = allow all (if enabled).
    #[serde(rename = "recipientAllowlist")]
    pub recipient_allowlist: Vec<String>,
    /// Spending caps.
    pub caps: Caps,
    /// Maximum tolerated slippage in basis points.
    #[serde(rename = "slippageCapBps")]
    pub slippage_cap_bps: u32,
    /// Target ratio of stable assets in the portfolio, in `[0, 1]`.
    #[serde(rename = "targetStableRatio")]
    pub target_stable_ratio: f64,
    /// Maximum exposure to any single asset, in `[0, 1]`.
    #[serde(rename = "maxExposurePerAsset")]
    pub max_exposure_per_asset: f64,
    /// Whether an empty merchant/recipient allowlist means "allow all".
    ///
    /// Defaults to `true` (the historical behavior). Set to `false` to
    /// make an empty list deny everything instead.
    #[serde(rename = "allowAllWhenEmpty", default = "default_allow_all")]
    pub allow_all_when_empty: bool,
}

fn default_allow_all() -> bool {
    true
}

impl PolicyConfig {
    /// Check whether a chain is allowlisted.
    #[must_use]
    pub fn is_chain_allowed(&self, chain: ChainId) -> bool {
        self.chain_allowlist.contains(&chain)
    }

    /// Check whether a token address is allowlisted (case-insensitive).
    #[must_use]
    pub fn is_token_allowed(&self, address: &TokenAddress) -> bool {
        self.token_allowlist.iter().any(|t| t.address == *address)
    }

    /// Look up the allowlisted token entry for an address, if any.
    #[must_use]
    pub fn token_entry(&self, address: &TokenAddress) -> Option<&TokenEntry> {
        self.token_allowlist.iter().find(|t| t.address == *address)
    }

    /// Check whether a merchant domain may be paid.
    ///
    /// Case-insensitive exact match. An empty configured list allows every
    /// merchant when `allow_all_when_empty` is set.
    #[must_use]
    pub fn is_merchant_allowed(&self, domain: &str) -> bool {
        if self.merchant_allowlist_domains.is_empty() {
            return self.allow_all_when_empty;
        }
        self.merchant_allowlist_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }

    /// Check whether a recipient address may be paid.
    ///
    /// Same empty-list rule as merchants.
    #[must_use]
    pub fn is_recipient_allowed(&self, recipient: &str) -> bool {
        if self.recipient_allowlist.is_empty() {
            return self.allow_all_when_empty;
        }
        self.recipient_allowlist
            .iter()
            .any(|r| r.eq_ignore_ascii_case(recipient))
    }
}
