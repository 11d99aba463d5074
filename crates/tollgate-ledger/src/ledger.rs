//! The spend ledger: append, settle, and window queries.

use async_trait::async_trait;
use std::sync::RwLock;
use tollgate_core::{Timestamp, TokenAddress};
use tracing::{debug, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::record::{PaymentRecord, PaymentRecordId, PaymentStatus};

/// Read interface over historical payment records.
///
/// The authorization engine depends on this trait, not a concrete store,
/// so deployments can back it with their own persistence while tests use
/// [`MemorySpendLedger`].
#[async_trait]
pub trait SpendLedger: Send + Sync {
    /// Sum the USD amounts of payments for `token` whose timestamp falls
    /// in `[window_start, window_end)` and whose status is in `statuses`.
    ///
    /// A pure read: no writes, no long-held locks.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the underlying store fails.
    async fn total_spent_usd(
        &self,
        token: &TokenAddress,
        window_start: Timestamp,
        window_end: Timestamp,
        statuses: &[PaymentStatus],
    ) -> LedgerResult<f64>;
}

/// Write interface for the payment flow.
///
/// Separate from [`SpendLedger`] so read-only consumers (the
/// authorization engine) cannot mutate history by construction.
#[async_trait]
pub trait SpendRecorder: Send + Sync {
    /// Append a payment record, returning its ID.
    ///
    /// # Errors
    ///
    /// Returns a [`LedgerError`] if the underlying store fails.
    async fn record(&self, record: PaymentRecord) -> LedgerResult<PaymentRecordId>;

    /// Update a record's status on settlement, attaching the transaction
    /// hash and receipt when present.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::RecordNotFound`] if no record has the given
    /// ID.
    async fn update_status(
        &self,
        id: &PaymentRecordId,
        status: PaymentStatus,
        tx_hash: Option<String>,
        receipt: Option<String>,
    ) -> LedgerResult<()>;
}

/// In-memory spend ledger.
///
/// Append-only: records are pushed when a payment commits to execution
/// and updated in place on settlement; nothing is ever removed.
#[derive(Debug, Default)]
pub struct MemorySpendLedger {
    records: RwLock<Vec<PaymentRecord>>,
}

impl MemorySpendLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a snapshot of all records (most recent last).
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::Storage`] on lock poisoning.
    pub fn all(&self) -> LedgerResult<Vec<PaymentRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        Ok(records.clone())
    }

    /// Number of records in the ledger.
    #[must_use]
    pub fn count(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(|e| {
                warn!("MemorySpendLedger read lock poisoned, recovering");
                e.into_inner()
            })
            .len()
    }
}

#[async_trait]
impl SpendLedger for MemorySpendLedger {
    async fn total_spent_usd(
        &self,
        token: &TokenAddress,
        window_start: Timestamp,
        window_end: Timestamp,
        statuses: &[PaymentStatus],
    ) -> LedgerResult<f64> {
        let records = self
            .records
            .read()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let total = records
            .iter()
            .filter(|r| r.token == *token)
            .filter(|r| r.timestamp >= window_start && r.timestamp < window_end)
            .filter(|r| statuses.contains(&r.status))
            .map(|r| r.amount_usd)
            .sum();
        Ok(total)
    }
}

#[async_trait]
impl SpendRecorder for MemorySpendLedger {
    async fn record(&self, record: PaymentRecord) -> LedgerResult<PaymentRecordId> {
        let id = record.id.clone();
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        debug!(id = %id, merchant = %record.merchant, amount_usd = record.amount_usd, "recorded payment");
        records.push(record);
        Ok(id)
    }

    async fn update_status(
        &self,
        id: &PaymentRecordId,
        status: PaymentStatus,
        tx_hash: Option<String>,
        receipt: Option<String>,
    ) -> LedgerResult<()> {
        let mut records = self
            .records
            .write()
            .map_err(|e| LedgerError::Storage(e.to_string()))?;
        let record = records
            .iter_mut()
            .find(|r| r.id == *id)
            .ok_or_else(|| LedgerError::RecordNotFound { id: id.to_string() })?;
        debug!(id = %id, from = %record.status, to = %status, "payment status updated");
        record.status = status;
        if tx_hash.is_some() {
            record.tx_hash = tx_hash;
        }
        if receipt.is_some() {
            record.receipt = receipt;
        }
        Ok(())
    }
}
