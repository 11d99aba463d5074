//! The signer boundary.
//!
//! The flow never touches key material. It produces "this transfer is
//! authorized; here is what to execute" and hands off at one of two
//! boundaries: a session-scoped [`Signer`] that broadcasts directly, or
//! an [`UnsignedTransaction`] returned to the caller's own wallet in the
//! non-custodial model.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tollgate_core::{ChainId, TokenAddress};

use crate::requirement::PaymentRequirement;

/// A transfer order handed to the external signer.
///
/// `confirmed` is set by the flow once the human gate has passed; a
/// signer must refuse an unconfirmed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferRequest {
    /// Chain to settle on.
    pub chain_id: ChainId,
    /// Token to spend.
    pub token: TokenAddress,
    /// Destination address.
    pub recipient: String,
    /// Amount in USD.
    pub amount_usd: f64,
    /// The human confirmation gate has passed.
    pub confirmed: bool,
}

/// Settlement evidence returned by the signer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransferReceipt {
    /// On-chain transaction hash.
    pub tx_hash: String,
    /// Optional receipt blob from the merchant or chain.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub receipt: Option<String>,
}

/// Signer-side failure, opaque to the flow.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct SignerError(pub String);

/// External collaborator that signs and broadcasts transfers.
#[async_trait]
pub trait Signer: Send + Sync {
    /// Execute one transfer and return its settlement evidence.
    ///
    /// # Errors
    ///
    /// Returns a [`SignerError`] if signing or broadcast fails. The flow
    /// never retries a failed transfer.
    async fn transfer(&self, request: &TransferRequest) -> Result<TransferReceipt, SignerError>;
}

/// An authorized transfer for the caller's own wallet to sign.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTransaction {
    /// Chain to settle on.
    pub chain_id: ChainId,
    /// Token contract to call.
    pub token: TokenAddress,
    /// Destination address.
    pub recipient: String,
    /// Amount in USD.
    pub amount_usd: f64,
}

impl From<&PaymentRequirement> for UnsignedTransaction {
    fn from(requirement: &PaymentRequirement) -> Self {
        Self {
            chain_id: requirement.chain_id,
            token: requirement.token_address.clone(),
            recipient: requirement.recipient.clone(),
            amount_usd: requirement.amount_usd,
        }
    }
}
