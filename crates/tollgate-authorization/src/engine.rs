//! The authorization engine.
//!
//! # Check order
//!
//! 1. Chain in the chain allowlist
//! 2. Token address in the token allowlist (case-insensitive)
//! 3. Merchant domain allowlisted (skipped when no merchant is in play)
//! 4. Recipient allowlisted (same skip rule)
//! 5. Per-payment cap, when enabled
//! 6. Daily cap over the trailing 24 hours, when enabled
//!
//! Every check runs even after earlier ones fail. The engine only reads:
//! it never mutates the policy or the ledger.

use chrono::Duration;
use std::sync::Arc;
use tollgate_core::{ChainId, Timestamp, TokenAddress, format_usd};
use tollgate_ledger::{LedgerResult, PaymentStatus, SpendLedger};
use tollgate_policy::PolicyStore;
use tracing::debug;

use crate::result::AuthorizationResult;

/// Length of the trailing daily-cap window.
const DAILY_WINDOW_HOURS: i64 = 24;

/// A candidate financial action awaiting authorization.
#[derive(Debug, Clone)]
pub struct PaymentCandidate {
    /// Chain the payment would settle on.
    pub chain_id: ChainId,
    /// Token the payment would spend.
    pub token_address: TokenAddress,
    /// Merchant domain being paid, if this is an x402 payment.
    pub merchant_domain: Option<String>,
    /// Recipient address, if known.
    pub recipient: Option<String>,
    /// Payment amount in USD.
    pub amount_usd: f64,
}

impl PaymentCandidate {
    /// Create a candidate with no merchant or recipient attached.
    #[must_use]
    pub fn new(chain_id: ChainId, token_address: TokenAddress, amount_usd: f64) -> Self {
        Self {
            chain_id,
            token_address,
            merchant_domain: None,
            recipient: None,
            amount_usd,
        }
    }

    /// Attach a merchant domain.
    #[must_use]
    pub fn with_merchant(mut self, domain: impl Into<String>) -> Self {
        self.merchant_domain = Some(domain.into());
        self
    }

    /// Attach a recipient address.
    #[must_use]
    pub fn with_recipient(mut self, recipient: impl Into<String>) -> Self {
        self.recipient = Some(recipient.into());
        self
    }
}

/// Evaluates candidates against the policy store and spend ledger.
///
/// Side-effect-free and safely concurrent: each call reads one policy
/// snapshot and performs one ledger query.
pub struct AuthorizationEngine {
    policy: Arc<PolicyStore>,
    ledger: Arc<dyn SpendLedger>,
}

impl AuthorizationEngine {
    /// Create an engine over the given policy store and ledger.
    #[must_use]
    pub fn new(policy: Arc<PolicyStore>, ledger: Arc<dyn SpendLedger>) -> Self {
        Self { policy, ledger }
    }

    /// Evaluate a candidate, running every applicable check.
    ///
    /// # Errors
    ///
    /// Returns a [`tollgate_ledger::LedgerError`] only if the spend query
    /// itself fails; a blocked candidate is a normal `Ok` verdict.
    pub async fn authorize(&self, candidate: &PaymentCandidate) -> LedgerResult<AuthorizationResult> {
        let policy = self.policy.current();
        let mut blockers = Vec::new();

        let chain_allowed = policy.is_chain_allowed(candidate.chain_id);
        if !chain_allowed {
            blockers.push(format!(
                "Chain {} is not allowlisted",
                candidate.chain_id.0
            ));
        }

        let token_allowed = policy.is_token_allowed(&candidate.token_address);
        if !token_allowed {
            blockers.push(format!(
                "Token {} is not allowlisted",
                candidate.token_address
            ));
        }

        // No merchant in play means the check passes vacuously.
        let merchant_allowed = candidate
            .merchant_domain
            .as_deref()
            .is_none_or(|d| policy.is_merchant_allowed(d));
        if !merchant_allowed {
            if let Some(domain) = candidate.merchant_domain.as_deref() {
                blockers.push(format!("Merchant {domain} is not allowlisted"));
            }
        }

        let recipient_allowed = candidate
            .recipient
            .as_deref()
            .is_none_or(|r| policy.is_recipient_allowed(r));
        if !recipient_allowed {
            if let Some(recipient) = candidate.recipient.as_deref() {
                blockers.push(format!("Recipient {recipient} is not allowlisted"));
            }
        }

        let mut cap_block_reason = None;

        let per_payment_ok = if policy.caps.per_payment.enabled {
            candidate.amount_usd <= policy.caps.per_payment.max_usd
        } else {
            true
        };
        if !per_payment_ok {
            let reason = format!(
                "Per-payment cap exceeded. Limit: {}, Requested: {}",
                format_usd(policy.caps.per_payment.max_usd),
                format_usd(candidate.amount_usd)
            );
            cap_block_reason = Some(reason.clone());
            blockers.push(reason);
        }

        let daily_ok = if policy.caps.daily.enabled {
            let now = Timestamp::now();
            let window_start = now.minus(Duration::hours(DAILY_WINDOW_HOURS));
            let spent = self
                .ledger
                .total_spent_usd(
                    &candidate.token_address,
                    window_start,
                    now,
                    PaymentStatus::counts_against_caps(),
                )
                .await?;
            let within = spent + candidate.amount_usd <= policy.caps.daily.max_usd;
            if !within {
                let reason = format!(
                    "Daily cap exceeded. Spent: {}, Limit: {}, Requested: {}",
                    format_usd(spent),
                    format_usd(policy.caps.daily.max_usd),
                    format_usd(candidate.amount_usd)
                );
                // Per-payment reason wins the summary slot if both fire.
                if cap_block_reason.is_none() {
                    cap_block_reason = Some(reason.clone());
                }
                blockers.push(reason);
            }
            within
        } else {
            true
        };

        let caps_allowed = per_payment_ok && daily_ok;
        let can_proceed =
            chain_allowed && token_allowed && merchant_allowed && recipient_allowed && caps_allowed;

        debug!(
            chain = candidate.chain_id.0,
            amount_usd = candidate.amount_usd,
            can_proceed,
            blockers = blockers.len(),
            "authorization evaluated"
        );

        Ok(AuthorizationResult {
            chain_allowed,
            token_allowed,
            merchant_allowed,
            recipient_allowed,
            caps_allowed,
            cap_block_reason,
            can_proceed,
            blockers,
        })
    }
}

impl std::fmt::Debug for AuthorizationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationEngine")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tollgate_ledger::{MemorySpendLedger, PaymentRecord, SpendRecorder};

    const USDC: &str = "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913";

    fn policy_json() -> &'static str {
        r#"{
            "version": 1,
            "chainAllowlist": [8453],
            "tokenAllowlist": [
                {"symbol": "USDC", "address": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", "decimals": 6}
            ],
            "merchantAllowlistDomains": ["api.trusted.com"],
            "recipientAllowlist": [],
            "caps": {
                "perPayment": {"enabled": true, "maxUsd": 100.0},
                "daily": {"enabled": true, "maxUsd": 5000.0}
            },
            "slippageCapBps": 50,
            "targetStableRatio": 0.8,
            "maxExposurePerAsset": 0.5
        }"#
    }

    fn engine_with_ledger(ledger: Arc<MemorySpendLedger>) -> AuthorizationEngine {
        let store = Arc::new(PolicyStore::load_from_str(policy_json()).unwrap());
        AuthorizationEngine::new(store, ledger)
    }

    fn engine() -> AuthorizationEngine {
        engine_with_ledger(Arc::new(MemorySpendLedger::new()))
    }

    async fn spend(ledger: &MemorySpendLedger, amount: f64, status: PaymentStatus) {
        ledger
            .record(PaymentRecord::new(
                "api.trusted.com",
                "/data",
                amount,
                TokenAddress::new(USDC),
                status,
            ))
            .await
            .unwrap();
    }

    // -----------------------------------------------------------------------
    // Happy path
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_trusted_payment_proceeds() {
        let result = engine()
            .authorize(
                &PaymentCandidate::new(ChainId(8453), TokenAddress::new(USDC), 10.0)
                    .with_merchant("api.trusted.com"),
            )
            .await
            .unwrap();
        assert!(result.can_proceed);
        assert!(result.blockers.is_empty());
    }

    #[tokio::test]
    async fn test_no_merchant_skips_merchant_check() {
        let result = engine()
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(USDC),
                10.0,
            ))
            .await
            .unwrap();
        assert!(result.merchant_allowed);
        assert!(result.can_proceed);
    }

    #[tokio::test]
    async fn test_token_check_is_case_insensitive() {
        let upper = USDC.to_ascii_uppercase().replace("0X", "0x");
        let result = engine()
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(upper),
                10.0,
            ))
            .await
            .unwrap();
        assert!(result.token_allowed);
    }

    // -----------------------------------------------------------------------
    // Compound failures — every check reports
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_three_violations_yield_three_blockers() {
        let result = engine()
            .authorize(
                &PaymentCandidate::new(
                    ChainId(137),
                    TokenAddress::new("0x000000000000000000000000000000000000dead"),
                    10.0,
                )
                .with_merchant("untrusted.com"),
            )
            .await
            .unwrap();

        assert!(!result.can_proceed);
        assert_eq!(result.blockers.len(), 3);
        assert!(!result.chain_allowed);
        assert!(!result.token_allowed);
        assert!(!result.merchant_allowed);
        assert!(result.blockers.iter().any(|b| b.contains("Chain 137")));
        assert!(result.blockers.iter().any(|b| b.contains("Token")));
        assert!(result.blockers.iter().any(|b| b.contains("untrusted.com")));
    }

    #[tokio::test]
    async fn test_cap_failure_still_reports_other_passes() {
        let result = engine()
            .authorize(
                &PaymentCandidate::new(ChainId(8453), TokenAddress::new(USDC), 250.0)
                    .with_merchant("api.trusted.com"),
            )
            .await
            .unwrap();
        assert!(!result.can_proceed);
        assert!(result.chain_allowed);
        assert!(result.token_allowed);
        assert!(!result.caps_allowed);
        assert_eq!(result.blockers.len(), 1);
        assert!(result.blockers[0].contains("Per-payment cap"));
    }

    // -----------------------------------------------------------------------
    // Caps
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_amount_at_cap_passes() {
        let result = engine()
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(USDC),
                100.0,
            ))
            .await
            .unwrap();
        assert!(result.caps_allowed);
    }

    #[tokio::test]
    async fn test_daily_cap_counts_pending_spend() {
        let ledger = Arc::new(MemorySpendLedger::new());
        spend(&ledger, 3000.0, PaymentStatus::Confirmed).await;
        spend(&ledger, 1500.0, PaymentStatus::Pending).await;

        // $4500 already counts (pending included); $600 more breaches the
        // $5000 daily cap. The per-payment cap fires too — both report.
        let result = engine_with_ledger(Arc::clone(&ledger))
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(USDC),
                600.0,
            ))
            .await
            .unwrap();

        assert!(!result.can_proceed);
        let daily = result
            .blockers
            .iter()
            .find(|b| b.contains("Daily cap"))
            .expect("daily cap blocker");
        assert!(daily.contains("$4500.00"));
        assert!(daily.contains("$5000.00"));
        assert!(daily.contains("$600.00"));
    }

    #[tokio::test]
    async fn test_daily_cap_headroom_allows() {
        let ledger = Arc::new(MemorySpendLedger::new());
        spend(&ledger, 3000.0, PaymentStatus::Confirmed).await;

        let result = engine_with_ledger(ledger)
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(USDC),
                50.0,
            ))
            .await
            .unwrap();
        assert!(result.can_proceed);
    }

    #[tokio::test]
    async fn test_failed_spend_does_not_count() {
        let ledger = Arc::new(MemorySpendLedger::new());
        spend(&ledger, 4990.0, PaymentStatus::Failed).await;

        let result = engine_with_ledger(ledger)
            .authorize(&PaymentCandidate::new(
                ChainId(8453),
                TokenAddress::new(USDC),
                50.0,
            ))
            .await
            .unwrap();
        assert!(result.caps_allowed);
    }
}
