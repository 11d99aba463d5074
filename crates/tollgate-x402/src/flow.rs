//! The client-side negotiation flow.
//!
//! `negotiate` drives one pass of fetch, detect 402, parse terms,
//! authorize, and (when execution was asked for) pay and retry with
//! proof. Each invocation attempts delivery at most once: a failed
//! on-chain transfer is recorded and surfaced, never retried.

use serde::Serialize;
use std::sync::Arc;
use tollgate_authorization::{AuthorizationEngine, AuthorizationResult, PaymentCandidate};
use tollgate_ledger::{PaymentRecord, PaymentRecordId, PaymentStatus, SpendRecorder};
use tracing::{info, warn};
use url::Url;

use crate::error::{X402Error, X402Result};
use crate::fetch::{FetchResponse, PaymentFetcher};
use crate::requirement::PaymentRequirement;
use crate::signer::{Signer, TransferRequest};

/// Payment terms plus the policy verdict, for display and approval.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentQuote {
    /// Parsed payment terms.
    pub requirement: PaymentRequirement,
    /// Merchant domain, from the resource URL's host.
    pub merchant: String,
    /// Resource path, query string discarded.
    pub resource: String,
    /// Full check-by-check policy verdict.
    pub authorization: AuthorizationResult,
}

/// A settled payment and the re-fetched resource.
#[derive(Debug)]
pub struct SettledPayment {
    /// The terms that were satisfied.
    pub requirement: PaymentRequirement,
    /// Merchant domain paid.
    pub merchant: String,
    /// Resource path paid for.
    pub resource: String,
    /// Ledger record for this payment.
    pub record_id: PaymentRecordId,
    /// Transaction hash relayed as payment proof.
    pub tx_hash: String,
    /// The merchant's response to the proven retry.
    pub response: FetchResponse,
}

/// Outcome of one negotiation pass.
#[derive(Debug)]
pub enum NegotiationOutcome {
    /// The resource answered without demanding payment.
    NoPaymentRequired(FetchResponse),
    /// Payment is required; terms and verdict returned for approval.
    Quote(Box<PaymentQuote>),
    /// Payment executed and the resource re-fetched with proof.
    Settled(Box<SettledPayment>),
}

/// Orchestrates x402 negotiation against a merchant resource.
pub struct PaymentFlow {
    engine: Arc<AuthorizationEngine>,
    recorder: Arc<dyn SpendRecorder>,
    fetcher: Arc<dyn PaymentFetcher>,
    signer: Arc<dyn Signer>,
}

impl PaymentFlow {
    /// Create a flow over its four collaborators.
    #[must_use]
    pub fn new(
        engine: Arc<AuthorizationEngine>,
        recorder: Arc<dyn SpendRecorder>,
        fetcher: Arc<dyn PaymentFetcher>,
        signer: Arc<dyn Signer>,
    ) -> Self {
        Self {
            engine,
            recorder,
            fetcher,
            signer,
        }
    }

    /// Negotiate one resource fetch.
    ///
    /// With `session_confirmed = false` a 402 resolves to a
    /// [`NegotiationOutcome::Quote`] and nothing is persisted. With
    /// `session_confirmed = true` an authorized payment is recorded,
    /// delegated to the signer, and the request retried once with the
    /// transaction hash as proof. A blocked payment fails with
    /// [`X402Error::AuthorizationBlocked`] rather than silently
    /// downgrading to a quote.
    ///
    /// # Errors
    ///
    /// [`X402Error::InvalidUrl`], [`X402Error::Http`],
    /// [`X402Error::PaymentParse`], [`X402Error::AuthorizationBlocked`],
    /// [`X402Error::Signer`], or [`X402Error::Ledger`].
    pub async fn negotiate(
        &self,
        url: &str,
        session_confirmed: bool,
    ) -> X402Result<NegotiationOutcome> {
        let url = Url::parse(url)?;
        let merchant = url
            .host_str()
            .ok_or_else(|| X402Error::PaymentParse("resource url has no host".to_string()))?
            .to_string();
        let resource = url.path().to_string();

        let response = self.fetcher.fetch(&url, None).await?;
        if !response.requires_payment() {
            return Ok(NegotiationOutcome::NoPaymentRequired(response));
        }

        let requirement = PaymentRequirement::from_response(&response)?;
        let candidate = PaymentCandidate::new(
            requirement.chain_id,
            requirement.token_address.clone(),
            requirement.amount_usd,
        )
        .with_merchant(&merchant)
        .with_recipient(&requirement.recipient);
        let authorization = self.engine.authorize(&candidate).await?;

        if !session_confirmed {
            return Ok(NegotiationOutcome::Quote(Box::new(PaymentQuote {
                requirement,
                merchant,
                resource,
                authorization,
            })));
        }

        if !authorization.can_proceed {
            warn!(
                merchant = %merchant,
                blockers = authorization.blockers.len(),
                "payment blocked by policy"
            );
            return Err(X402Error::AuthorizationBlocked {
                blockers: authorization.blockers,
            });
        }

        // Record before signing so the in-flight amount counts against
        // the daily cap for any concurrent authorization.
        let record_id = self
            .recorder
            .record(PaymentRecord::new(
                &merchant,
                &resource,
                requirement.amount_usd,
                requirement.token_address.clone(),
                PaymentStatus::Pending,
            ))
            .await?;

        let transfer = TransferRequest {
            chain_id: requirement.chain_id,
            token: requirement.token_address.clone(),
            recipient: requirement.recipient.clone(),
            amount_usd: requirement.amount_usd,
            confirmed: true,
        };
        let receipt = match self.signer.transfer(&transfer).await {
            Ok(receipt) => receipt,
            Err(err) => {
                self.recorder
                    .update_status(&record_id, PaymentStatus::Failed, None, None)
                    .await?;
                return Err(X402Error::Signer(err.to_string()));
            },
        };
        self.recorder
            .update_status(
                &record_id,
                PaymentStatus::Confirmed,
                Some(receipt.tx_hash.clone()),
                receipt.receipt.clone(),
            )
            .await?;
        info!(
            merchant = %merchant,
            resource = %resource,
            amount_usd = requirement.amount_usd,
            tx_hash = %receipt.tx_hash,
            "payment settled"
        );

        // One proven retry; the transfer itself is never re-attempted.
        let response = self.fetcher.fetch(&url, Some(&receipt.tx_hash)).await?;
        Ok(NegotiationOutcome::Settled(Box::new(SettledPayment {
            requirement,
            merchant,
            resource,
            record_id,
            tx_hash: receipt.tx_hash,
            response,
        })))
    }
}

impl std::fmt::Debug for PaymentFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentFlow").finish_non_exhaustive()
    }
}
