//! Tollgate Confirm - the human-in-the-loop confirmation layer.
//!
//! Nothing financial executes without an explicit human go-ahead. The
//! [`ConfirmationGate`] holds at most one [`PendingAction`] per
//! conversational session and interprets the next user input: a
//! confirmation token executes the action, a cancellation token discards
//! it, anything else passes through to the normal request path with the
//! action still held. A held action expires after its TTL — expiry is
//! checked on every evaluation, not by an external sweep.
//!
//! Free-text input is sanitized **before** it can reach any external text
//! interface (such as an LLM): 64-hex-character secrets are redacted to
//! `first4...last4` and seed-phrase-length inputs are replaced wholesale.
//!
//! # Example
//!
//! ```
//! use tollgate_confirm::{ActionKind, ConfirmationGate, GateDisposition, PendingAction};
//!
//! let mut gate = ConfirmationGate::new();
//! let action = PendingAction::new(
//!     ActionKind::X402Payment,
//!     "Pay $1.00 USDC to api.example.com",
//!     "x402_pay",
//!     serde_json::json!({"url": "https://api.example.com", "confirmed": false}),
//! );
//! gate.propose(action).unwrap();
//!
//! let eval = gate.evaluate("yes");
//! let GateDisposition::Execute(ready) = eval.disposition else {
//!     panic!("expected execution");
//! };
//! assert_eq!(ready.parameters["confirmed"], serde_json::json!(true));
//! assert!(gate.is_idle());
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod gate;
pub mod intent;
pub mod sanitize;

pub use error::{GateError, GateResult};
pub use gate::{
    ActionKind, ConfirmationGate, GateDisposition, GateEvaluation, GateRegistry, PendingAction,
};
pub use intent::{Intent, IntentEntities, IntentKind, classify};
pub use sanitize::sanitize_input;
