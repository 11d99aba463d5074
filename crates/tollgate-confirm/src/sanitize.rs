//! Free-text input sanitization.
//!
//! Runs unconditionally on every input **before** intent classification,
//! so raw secrets can never reach an external text interface. Two rules:
//!
//! - A 32-byte hex string (64 hex characters, with or without a `0x`
//!   prefix) — the shape of a raw private key or transaction secret — is
//!   redacted in place to `first4...last4`.
//! - An input of 12 or more whitespace-separated words has the shape of a
//!   BIP-39 seed phrase and is replaced wholesale; no fragment of it
//!   survives.

use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Replacement marker for seed-phrase-length inputs.
pub const SEED_PHRASE_MARKER: &str = "[REDACTED SEED PHRASE]";

/// Minimum word count treated as a possible seed phrase.
const SEED_PHRASE_MIN_WORDS: usize = 12;

static HEX_SECRET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:0[xX])?[0-9a-fA-F]{64}").expect("hex secret pattern is valid")
});

/// Sanitize one piece of free-text input.
///
/// Returns the redacted text; the original must not be forwarded.
#[must_use]
pub fn sanitize_input(input: &str) -> String {
    let word_count = input.split_whitespace().count();
    if word_count >= SEED_PHRASE_MIN_WORDS {
        warn!(word_count, "input redacted as possible seed phrase");
        return SEED_PHRASE_MARKER.to_string();
    }

    let redacted = HEX_SECRET.replace_all(input, |caps: &regex::Captures<'_>| {
        let m = caps
            .get(0)
            .map(|m| m.as_str())
            .unwrap_or_default();
        redact(m)
    });
    if redacted != input {
        warn!("input contained a 64-hex-character secret; redacted");
    }
    redacted.into_owned()
}

fn redact(secret: &str) -> String {
    // Matches are at least 64 chars, so the slices are in bounds.
    let head = &secret[..4];
    let tail = &secret[secret.len().saturating_sub(4)..];
    format!("{head}...{tail}")
}
