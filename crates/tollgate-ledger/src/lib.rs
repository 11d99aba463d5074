//! Tollgate Ledger - payment history and trailing-window spend totals.
//!
//! The ledger is the read surface the authorization engine uses to answer
//! "how much has already been spent in the last 24 hours?". Payment
//! records are created when a payment is committed to execution and
//! updated on settlement; they are never deleted.
//!
//! Callers computing cap headroom query with the `{pending, confirmed}`
//! status set so in-flight payments count against the cap — a burst of
//! concurrent requests cannot exceed the daily cap before any one of them
//! completes.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod error;
pub mod ledger;
pub mod record;

pub use error::{LedgerError, LedgerResult};
pub use ledger::{MemorySpendLedger, SpendLedger, SpendRecorder};
pub use record::{PaymentRecord, PaymentRecordId, PaymentStatus};
