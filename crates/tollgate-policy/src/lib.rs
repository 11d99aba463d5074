//! Tollgate Policy - authorization policy loading, validation, and queries.
//!
//! The policy file is the admin-configured boundary for what an agent may
//! spend: which chains and tokens are usable, which merchants and
//! recipients may be paid, and how much may move per payment and per day.
//!
//! # Loading
//!
//! [`PolicyStore::load_from_path`] parses and validates the JSON policy
//! file. Validation collects **every** violation before failing, so a
//! misconfigured file reports all offending fields at once rather than one
//! per restart. A policy that fails validation never becomes the active
//! snapshot — a corrupt policy must prevent the system from authorizing
//! anything.
//!
//! # Reloading
//!
//! [`PolicyStore::reload_from_path`] re-validates and atomically swaps the
//! cached snapshot. Readers hold an `Arc` to an immutable [`PolicyConfig`],
//! so a reload never exposes a half-updated policy.
//!
//! # Example
//!
//! ```
//! use tollgate_policy::PolicyStore;
//!
//! let json = r#"{
//!     "version": 1,
//!     "chainAllowlist": [8453],
//!     "tokenAllowlist": [
//!         {"symbol": "USDC", "address": "0x833589fCD6eDb6E08f4c7C32D4f71b54bdA02913", "decimals": 6}
//!     ],
//!     "merchantAllowlistDomains": ["api.trusted.com"],
//!     "recipientAllowlist": [],
//!     "caps": {
//!         "perPayment": {"enabled": true, "maxUsd": 100.0},
//!         "daily": {"enabled": true, "maxUsd": 5000.0}
//!     },
//!     "slippageCapBps": 50,
//!     "targetStableRatio": 0.8,
//!     "maxExposurePerAsset": 0.5
//! }"#;
//!
//! let store = PolicyStore::load_from_str(json).unwrap();
//! let policy = store.current();
//! assert!(policy.is_chain_allowed(8453.into()));
//! assert!(policy.is_merchant_allowed("API.TRUSTED.COM"));
//! // Empty recipient allowlist is a deliberate allow-all escape hatch.
//! assert!(policy.is_recipient_allowed("0x1234"));
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod loader;
pub mod store;
pub mod types;
pub mod validate;

pub use error::{FieldError, PolicyError, PolicyResult};
pub use store::PolicyStore;
pub use types::{CapRule, Caps, PolicyConfig, TokenEntry};
