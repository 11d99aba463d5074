//! Parsing the payment requirement off a 402 response.
//!
//! Merchants advertise terms in one of two header shapes:
//!
//! - `x-payment-required: {"chainId":8453,"tokenAddress":"0x...","amount":"1.0","recipient":"0x..."}`
//! - `WWW-Authenticate: x402 chain=8453 token=0x... amount=1.0 recipient=0x...`
//!
//! `chainId`/`chain` and `tokenAddress`/`token` are accepted as synonyms
//! in both shapes. A requirement missing any of the four fields is a
//! parse error, not an authorization failure.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tollgate_core::{ChainId, TokenAddress};

use crate::error::{X402Error, X402Result};
use crate::fetch::FetchResponse;

/// Header carrying the structured JSON requirement.
pub const PAYMENT_REQUIRED_HEADER: &str = "x-payment-required";

/// Header carrying the `x402` challenge form.
pub const WWW_AUTHENTICATE_HEADER: &str = "www-authenticate";

/// Header relaying the transaction hash on the paid retry.
pub const PAYMENT_PROOF_HEADER: &str = "x-payment-proof";

/// Challenge scheme name in the `WWW-Authenticate` form.
const X402_SCHEME: &str = "x402";

/// Machine-readable payment terms from a 402 response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequirement {
    /// Chain the payment must settle on.
    pub chain_id: ChainId,
    /// Token the merchant accepts.
    pub token_address: TokenAddress,
    /// Amount due, in USD.
    pub amount_usd: f64,
    /// Address the funds must reach.
    pub recipient: String,
}

impl PaymentRequirement {
    /// Parse the requirement from a 402 response's headers.
    ///
    /// Tries the JSON header first, then the `WWW-Authenticate` form.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::PaymentParse`] if neither header is present
    /// or the one found is malformed.
    pub fn from_response(response: &FetchResponse) -> X402Result<Self> {
        if let Some(raw) = response.header(PAYMENT_REQUIRED_HEADER) {
            return Self::from_json_header(raw);
        }
        if let Some(raw) = response.header(WWW_AUTHENTICATE_HEADER) {
            if let Some(rest) = strip_scheme(raw) {
                return Self::from_challenge(rest);
            }
        }
        Err(X402Error::PaymentParse(
            "402 response carries no payment requirement header".to_string(),
        ))
    }

    /// Parse the structured JSON header value.
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::PaymentParse`] on invalid JSON or a missing
    /// `chainId`, `tokenAddress`, `amount`, or `recipient` field.
    pub fn from_json_header(raw: &str) -> X402Result<Self> {
        let value: Value = serde_json::from_str(raw)
            .map_err(|e| X402Error::PaymentParse(format!("invalid JSON requirement: {e}")))?;

        let chain_id = field(&value, "chainId", "chain")
            .and_then(as_chain_id)
            .ok_or_else(|| missing("chainId"))?;
        let token_address = field(&value, "tokenAddress", "token")
            .and_then(Value::as_str)
            .map(TokenAddress::new)
            .ok_or_else(|| missing("tokenAddress"))?;
        let amount_usd = value
            .get("amount")
            .and_then(as_amount)
            .ok_or_else(|| missing("amount"))?;
        let recipient = value
            .get("recipient")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| missing("recipient"))?;

        Self::build(chain_id, token_address, amount_usd, recipient)
    }

    /// Parse the `key=value` challenge form (scheme already stripped).
    ///
    /// # Errors
    ///
    /// Returns [`X402Error::PaymentParse`] on a missing field or an
    /// unparseable value.
    pub fn from_challenge(raw: &str) -> X402Result<Self> {
        let mut chain_id = None;
        let mut token_address = None;
        let mut amount_usd = None;
        let mut recipient = None;

        for pair in raw.split([' ', ',']).filter(|p| !p.is_empty()) {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            match key {
                "chain" | "chainId" => chain_id = value.parse::<u64>().ok().map(ChainId),
                "token" | "tokenAddress" => token_address = Some(TokenAddress::new(value)),
                "amount" => amount_usd = value.parse::<f64>().ok(),
                "recipient" => recipient = Some(value.to_string()),
                _ => {},
            }
        }

        Self::build(
            chain_id.ok_or_else(|| missing("chainId"))?,
            token_address.ok_or_else(|| missing("tokenAddress"))?,
            amount_usd.ok_or_else(|| missing("amount"))?,
            recipient.ok_or_else(|| missing("recipient"))?,
        )
    }

    fn build(
        chain_id: ChainId,
        token_address: TokenAddress,
        amount_usd: f64,
        recipient: String,
    ) -> X402Result<Self> {
        if !amount_usd.is_finite() || amount_usd <= 0.0 {
            return Err(X402Error::PaymentParse(format!(
                "amount must be a positive number, got {amount_usd}"
            )));
        }
        Ok(Self {
            chain_id,
            token_address,
            amount_usd,
            recipient,
        })
    }
}

fn strip_scheme(raw: &str) -> Option<&str> {
    let trimmed = raw.trim_start();
    let rest = trimmed.strip_prefix(X402_SCHEME)?;
    // The scheme must be a whole token, not a prefix of another word.
    if rest.starts_with(char::is_whitespace) {
        Some(rest)
    } else {
        None
    }
}

fn field<'a>(value: &'a Value, primary: &str, alias: &str) -> Option<&'a Value> {
    value.get(primary).or_else(|| value.get(alias))
}

fn as_chain_id(value: &Value) -> Option<ChainId> {
    value
        .as_u64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
        .map(ChainId)
}

fn as_amount(value: &Value) -> Option<f64> {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}

fn missing(name: &str) -> X402Error {
    X402Error::PaymentParse(format!("missing field: {name}"))
}
