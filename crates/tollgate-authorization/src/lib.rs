//! Tollgate Authorization - evaluate candidate payments against policy.
//!
//! The [`AuthorizationEngine`] takes a candidate financial action and
//! checks it against the active policy snapshot and the spend ledger.
//! Every applicable check runs regardless of earlier failures — a caller
//! denied for three reasons sees all three, not just the first. The
//! verdict is a value, not an error: "blocked" is a normal business
//! outcome carried in [`AuthorizationResult`].
//!
//! # Example
//!
//! ```no_run
//! # async fn demo() {
//! use std::sync::Arc;
//! use tollgate_authorization::{AuthorizationEngine, PaymentCandidate};
//! use tollgate_ledger::MemorySpendLedger;
//! use tollgate_policy::PolicyStore;
//!
//! let store = Arc::new(PolicyStore::load_from_path("policy.json").unwrap());
//! let ledger = Arc::new(MemorySpendLedger::new());
//! let engine = AuthorizationEngine::new(store, ledger);
//!
//! let candidate = PaymentCandidate::new(8453.into(), "0x8335...2913".into(), 10.0)
//!     .with_merchant("api.trusted.com");
//! let result = engine.authorize(&candidate).await.unwrap();
//! if !result.can_proceed {
//!     for blocker in &result.blockers {
//!         eprintln!("blocked: {blocker}");
//!     }
//! }
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod engine;
pub mod result;

pub use engine::{AuthorizationEngine, PaymentCandidate};
pub use result::AuthorizationResult;
