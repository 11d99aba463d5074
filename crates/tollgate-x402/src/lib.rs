//! Tollgate x402 - payment negotiation against 402-gated resources.
//!
//! x402 is an HTTP convention: a `402 Payment Required` response carries
//! machine-readable payment terms (chain, token, amount, recipient) that
//! a client can satisfy on-chain and then retry with proof. This crate
//! drives that negotiation end to end:
//!
//! 1. Fetch the resource; a non-402 answer passes through untouched.
//! 2. Parse the [`PaymentRequirement`] from the response headers.
//! 3. Evaluate it with the authorization engine.
//! 4. Either return a quote for approval, or (once confirmed) record the
//!    spend, delegate the transfer to the external signer, and retry the
//!    request once with the transaction hash as proof.
//!
//! Two deployment shapes share the same core. [`PaymentFlow`] is the
//! client model: a session-scoped [`Signer`] broadcasts directly.
//! [`ProposalService`] is the non-custodial server model: quotes persist
//! as proposals and execution returns an [`UnsignedTransaction`] for the
//! caller's own wallet. Neither shape ever sees key material.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod fetch;
pub mod flow;
pub mod requirement;
pub mod service;
pub mod signer;

pub use error::{X402Error, X402Result};
pub use fetch::{FetchResponse, PaymentFetcher, ReqwestFetcher, PAYMENT_REQUIRED_STATUS};
pub use flow::{NegotiationOutcome, PaymentFlow, PaymentQuote, SettledPayment};
pub use requirement::{
    PaymentRequirement, PAYMENT_PROOF_HEADER, PAYMENT_REQUIRED_HEADER, WWW_AUTHENTICATE_HEADER,
};
pub use service::{ExecuteResponse, ProposalQuote, ProposalService};
pub use signer::{Signer, SignerError, TransferReceipt, TransferRequest, UnsignedTransaction};
