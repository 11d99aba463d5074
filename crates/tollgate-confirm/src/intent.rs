//! Pure intent classification for natural-language requests.
//!
//! [`classify`] is a side-effect-free function from sanitized text to a
//! tagged [`Intent`], so it composes cleanly with the confirmation gate:
//! the gate decides what the input *does*, the classifier decides what
//! the input *asks for*. Callers must sanitize first (see
//! [`crate::sanitize`]); the classifier never talks to the network or an
//! LLM itself.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// What the user appears to be asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntentKind {
    /// Pay for / fetch a paid resource (x402).
    PayForResource,
    /// Send tokens to a recipient.
    TransferTokens,
    /// Ask about balances or holdings.
    CheckBalance,
    /// Ask about a past or in-flight payment.
    PaymentStatus,
    /// Anything else; routed to the general conversational path.
    Other,
}

impl fmt::Display for IntentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayForResource => write!(f, "pay_for_resource"),
            Self::TransferTokens => write!(f, "transfer_tokens"),
            Self::CheckBalance => write!(f, "check_balance"),
            Self::PaymentStatus => write!(f, "payment_status"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Entities extracted from the text, when present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntentEntities {
    /// Dollar amount, if one was written (e.g. `$5`, `$1.50`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount_usd: Option<f64>,
    /// Token symbol, if one was named (e.g. `USDC`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_symbol: Option<String>,
    /// Recipient address, if one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,
    /// URL, if one was written.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// A classified request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    /// The recognized request kind.
    pub kind: IntentKind,
    /// Rough confidence in `[0, 1]`; keyword hits only go so far.
    pub confidence: f64,
    /// Entities pulled from the text.
    pub entities: IntentEntities,
}

static AMOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\s*([0-9]+(?:\.[0-9]+)?)").expect("amount pattern is valid"));

static ADDRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"0[xX][0-9a-fA-F]{40}").expect("address pattern is valid"));

static URL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://[^\s]+").expect("url pattern is valid"));

static TOKEN_SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(USDC|USDT|DAI|WETH|ETH)\b").expect("symbol pattern is valid"));

/// Classify one sanitized input.
#[must_use]
pub fn classify(text: &str) -> Intent {
    let lower = text.to_ascii_lowercase();
    let entities = extract_entities(text);

    let (kind, confidence) = if contains_any(&lower, &["balance", "holdings", "how much do i have"])
    {
        (IntentKind::CheckBalance, 0.8)
    } else if contains_any(&lower, &["payment status", "did the payment", "receipt", "tx hash"]) {
        (IntentKind::PaymentStatus, 0.7)
    } else if contains_any(&lower, &["send", "transfer"]) && entities.recipient.is_some() {
        (IntentKind::TransferTokens, 0.9)
    } else if contains_any(&lower, &["send", "transfer"]) {
        (IntentKind::TransferTokens, 0.6)
    } else if entities.url.is_some() && contains_any(&lower, &["pay", "buy", "fetch", "access"]) {
        (IntentKind::PayForResource, 0.9)
    } else if contains_any(&lower, &["pay for", "unlock", "x402"]) {
        (IntentKind::PayForResource, 0.7)
    } else {
        (IntentKind::Other, 0.5)
    };

    Intent {
        kind,
        confidence,
        entities,
    }
}

fn contains_any(text: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| text.contains(n))
}

fn extract_entities(text: &str) -> IntentEntities {
    IntentEntities {
        amount_usd: AMOUNT
            .captures(text)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse().ok()),
        token_symbol: TOKEN_SYMBOL
            .find(&text.to_ascii_uppercase())
            .map(|m| m.as_str().to_string()),
        recipient: ADDRESS.find(text).map(|m| m.as_str().to_string()),
        url: URL.find(text).map(|m| m.as_str().to_string()),
    }
}
