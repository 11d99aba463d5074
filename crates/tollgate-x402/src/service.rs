//! The server-side proposal flow.
//!
//! In the non-custodial deployment a remote approver sits between quote
//! and execution, so the quote is persisted as a durable proposal and
//! execution happens in a second round-trip. The registry's conditional
//! commit makes that second call safe to race: of N concurrent executes
//! for one proposal, exactly one receives the unsigned transaction.

use serde::Serialize;
use std::sync::Arc;
use tollgate_authorization::{AuthorizationEngine, AuthorizationResult, PaymentCandidate};
use tollgate_core::{OwnerId, ProposalId, Timestamp, TokenAddress};
use tollgate_proposals::{ProposalKind, ProposalRegistry};
use tracing::info;
use url::Url;

use crate::error::{X402Error, X402Result};
use crate::fetch::PaymentFetcher;
use crate::requirement::PaymentRequirement;
use crate::signer::UnsignedTransaction;

/// Instructions returned with every unsigned transaction.
const SIGNING_INSTRUCTIONS: &str =
    "Sign and broadcast this transaction with your own wallet, then retry \
     the resource with the transaction hash as payment proof.";

/// A persisted payment quote awaiting approval.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalQuote {
    /// Registry ID to execute or cancel against.
    pub proposal_id: ProposalId,
    /// Merchant domain, from the resource URL's host.
    pub merchant: String,
    /// Amount due, in USD.
    pub amount_usd: f64,
    /// Token the merchant accepts.
    pub token: TokenAddress,
    /// Address the funds must reach.
    pub recipient: String,
    /// Resource path, query string discarded.
    pub resource: String,
    /// When the proposal stops being executable.
    pub expires_at: Timestamp,
    /// Policy verdict at proposal time, for display.
    pub authorization: AuthorizationResult,
}

/// The authorized transfer, ready for client-side signing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteResponse {
    /// Transfer for the caller's wallet to sign and broadcast.
    pub unsigned_tx: UnsignedTransaction,
    /// Human-readable next steps.
    pub instructions: String,
}

/// Quote-then-execute service over the proposal registry.
pub struct ProposalService {
    engine: Arc<AuthorizationEngine>,
    fetcher: Arc<dyn PaymentFetcher>,
    registry: Arc<dyn ProposalRegistry>,
}

impl ProposalService {
    /// Create a service over its collaborators.
    #[must_use]
    pub fn new(
        engine: Arc<AuthorizationEngine>,
        fetcher: Arc<dyn PaymentFetcher>,
        registry: Arc<dyn ProposalRegistry>,
    ) -> Self {
        Self {
            engine,
            fetcher,
            registry,
        }
    }

    /// Probe a resource and persist its payment terms as a proposal.
    ///
    /// # Errors
    ///
    /// [`X402Error::NoPaymentRequired`] if the resource does not demand
    /// payment; [`X402Error::PaymentParse`] on malformed terms; plus URL,
    /// HTTP, and registry errors.
    pub async fn propose(&self, owner: &OwnerId, url: &str) -> X402Result<ProposalQuote> {
        let url = Url::parse(url)?;
        let merchant = url
            .host_str()
            .ok_or_else(|| X402Error::PaymentParse("resource url has no host".to_string()))?
            .to_string();
        let resource = url.path().to_string();

        let response = self.fetcher.fetch(&url, None).await?;
        if !response.requires_payment() {
            return Err(X402Error::NoPaymentRequired);
        }
        let requirement = PaymentRequirement::from_response(&response)?;

        let authorization = self.authorize(&requirement, &merchant).await?;

        let payload = serde_json::json!({
            "requirement": requirement,
            "merchant": merchant,
            "resource": resource,
        });
        let proposal = self
            .registry
            .create(owner, ProposalKind::X402Payment, payload, None)
            .await?;
        info!(
            id = %proposal.id,
            merchant = %merchant,
            amount_usd = requirement.amount_usd,
            "payment proposal created"
        );

        Ok(ProposalQuote {
            proposal_id: proposal.id,
            merchant,
            amount_usd: requirement.amount_usd,
            token: requirement.token_address,
            recipient: requirement.recipient,
            resource,
            expires_at: proposal.expires_at,
            authorization,
        })
    }

    /// Execute a proposal, returning the transfer for the caller to sign.
    ///
    /// Authorization is re-evaluated against the current policy and
    /// ledger; approval of a stale quote does not bypass a policy that
    /// has since tightened. The registry commit is the execute-once
    /// barrier.
    ///
    /// # Errors
    ///
    /// [`X402Error::Proposal`] for not-found, expired, or
    /// already-resolved proposals; [`X402Error::AuthorizationBlocked`]
    /// if the payment no longer passes policy (the proposal stays
    /// pending); [`X402Error::PaymentParse`] on a corrupt payload.
    pub async fn execute(&self, id: &ProposalId, owner: &OwnerId) -> X402Result<ExecuteResponse> {
        let proposal = self.registry.get(id, owner).await?;
        let requirement: PaymentRequirement =
            serde_json::from_value(proposal.payload["requirement"].clone()).map_err(|e| {
                X402Error::PaymentParse(format!("proposal payload is not a requirement: {e}"))
            })?;
        let merchant = proposal.payload["merchant"]
            .as_str()
            .ok_or_else(|| {
                X402Error::PaymentParse("proposal payload is missing merchant".to_string())
            })?
            .to_string();

        let authorization = self.authorize(&requirement, &merchant).await?;
        if !authorization.can_proceed {
            return Err(X402Error::AuthorizationBlocked {
                blockers: authorization.blockers,
            });
        }

        // Exactly one concurrent caller gets past this line.
        let committed = self.registry.commit(id, owner).await?;
        info!(id = %committed.id, merchant = %merchant, "payment proposal executed");

        Ok(ExecuteResponse {
            unsigned_tx: UnsignedTransaction::from(&requirement),
            instructions: SIGNING_INSTRUCTIONS.to_string(),
        })
    }

    async fn authorize(
        &self,
        requirement: &PaymentRequirement,
        merchant: &str,
    ) -> X402Result<AuthorizationResult> {
        let candidate = PaymentCandidate::new(
            requirement.chain_id,
            requirement.token_address.clone(),
            requirement.amount_usd,
        )
        .with_merchant(merchant)
        .with_recipient(&requirement.recipient);
        Ok(self.engine.authorize(&candidate).await?)
    }
}

impl std::fmt::Debug for ProposalService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProposalService").finish_non_exhaustive()
    }
}
