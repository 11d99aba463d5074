//! Proposal registry: the single source of truth for "has this run".
//!
//! `commit` is the hot spot. A read-then-write update would let two
//! concurrent execute calls both observe `pending` and both proceed to
//! spend; the registry therefore performs the status check and the
//! transition under one write lock, as a single conditional update.

use async_trait::async_trait;
use chrono::Duration;
use std::collections::HashMap;
use std::sync::RwLock;
use tollgate_core::{OwnerId, ProposalId, Timestamp};
use tracing::{debug, info};

use crate::error::{ProposalError, ProposalResult};
use crate::proposal::{ActionProposal, ProposalKind, ProposalStatus};

/// Durable store for action proposals.
///
/// Implementations must make [`commit`](Self::commit) an atomic
/// conditional transition against the proposal's current recorded status.
#[async_trait]
pub trait ProposalRegistry: Send + Sync {
    /// Create a pending proposal owned by `owner`.
    ///
    /// `ttl` defaults to 5 minutes.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::Storage`] if persistence fails.
    async fn create(
        &self,
        owner: &OwnerId,
        kind: ProposalKind,
        payload: serde_json::Value,
        ttl: Option<Duration>,
    ) -> ProposalResult<ActionProposal>;

    /// Fetch a proposal, scoped to its owner.
    ///
    /// Cross-owner lookups return [`ProposalError::NotFound`], never a
    /// "forbidden" variant, to avoid leaking that the ID exists.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::NotFound`] or [`ProposalError::Storage`].
    async fn get(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal>;

    /// Atomically transition `pending` -> `executed`.
    ///
    /// Succeeds only if the proposal is currently `pending` and its TTL
    /// has not elapsed; exactly one concurrent caller can win. An overdue
    /// pending proposal is lazily marked `expired` here — the sweep is not
    /// required for correctness.
    ///
    /// # Errors
    ///
    /// [`ProposalError::NotFound`], [`ProposalError::Expired`], or
    /// [`ProposalError::AlreadyResolved`] with the terminal status.
    async fn commit(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal>;

    /// Atomically transition `pending` -> `cancelled`.
    ///
    /// Same conditional rules as [`commit`](Self::commit).
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`commit`](Self::commit).
    async fn cancel(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal>;

    /// Bulk-transition every overdue `pending` proposal to `expired`.
    ///
    /// Advisory cleanup only; `commit` does not depend on it. Returns the
    /// number of proposals expired.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::Storage`] if persistence fails.
    async fn sweep_expired(&self) -> ProposalResult<usize>;
}

/// In-memory proposal registry.
///
/// Rows are append-only: resolved proposals are kept as the audit trail.
#[derive(Debug, Default)]
pub struct MemoryProposalRegistry {
    proposals: RwLock<HashMap<ProposalId, ActionProposal>>,
}

impl MemoryProposalRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of proposals (all statuses) in the registry.
    ///
    /// # Errors
    ///
    /// Returns [`ProposalError::Storage`] on lock poisoning.
    pub fn count(&self) -> ProposalResult<usize> {
        let proposals = self
            .proposals
            .read()
            .map_err(|e| ProposalError::Storage(e.to_string()))?;
        Ok(proposals.len())
    }

    /// One conditional transition out of `pending`, under the write lock.
    fn transition(
        &self,
        id: &ProposalId,
        owner: &OwnerId,
        target: ProposalStatus,
    ) -> ProposalResult<ActionProposal> {
        let mut proposals = self
            .proposals
            .write()
            .map_err(|e| ProposalError::Storage(e.to_string()))?;

        let proposal = proposals
            .get_mut(id)
            .filter(|p| p.owner_id == *owner)
            .ok_or_else(|| ProposalError::NotFound { id: id.to_string() })?;

        match proposal.status {
            ProposalStatus::Pending => {
                // Lazy expiry: an overdue pending row resolves to expired
                // here, regardless of whether a sweep ever ran.
                if proposal.is_overdue(Timestamp::now()) {
                    proposal.status = ProposalStatus::Expired;
                    debug!(id = %id, "proposal lazily expired at commit");
                    return Err(ProposalError::Expired { id: id.to_string() });
                }
                proposal.status = target;
                info!(id = %id, kind = %proposal.kind, status = %target, "proposal transitioned");
                Ok(proposal.clone())
            },
            status => Err(ProposalError::AlreadyResolved {
                id: id.to_string(),
                status,
            }),
        }
    }
}

#[async_trait]
impl ProposalRegistry for MemoryProposalRegistry {
    async fn create(
        &self,
        owner: &OwnerId,
        kind: ProposalKind,
        payload: serde_json::Value,
        ttl: Option<Duration>,
    ) -> ProposalResult<ActionProposal> {
        let proposal = ActionProposal::new(owner.clone(), kind, payload, ttl);
        let mut proposals = self
            .proposals
            .write()
            .map_err(|e| ProposalError::Storage(e.to_string()))?;
        proposals.insert(proposal.id.clone(), proposal.clone());
        debug!(id = %proposal.id, kind = %kind, expires_at = %proposal.expires_at, "proposal created");
        Ok(proposal)
    }

    async fn get(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal> {
        let proposals = self
            .proposals
            .read()
            .map_err(|e| ProposalError::Storage(e.to_string()))?;
        proposals
            .get(id)
            .filter(|p| p.owner_id == *owner)
            .cloned()
            .ok_or_else(|| ProposalError::NotFound { id: id.to_string() })
    }

    async fn commit(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal> {
        self.transition(id, owner, ProposalStatus::Executed)
    }

    async fn cancel(&self, id: &ProposalId, owner: &OwnerId) -> ProposalResult<ActionProposal> {
        self.transition(id, owner, ProposalStatus::Cancelled)
    }

    async fn sweep_expired(&self) -> ProposalResult<usize> {
        let now = Timestamp::now();
        let mut proposals = self
            .proposals
            .write()
            .map_err(|e| ProposalError::Storage(e.to_string()))?;
        let mut swept = 0usize;
        for proposal in proposals.values_mut() {
            if proposal.status == ProposalStatus::Pending && proposal.is_overdue(now) {
                proposal.status = ProposalStatus::Expired;
                swept = swept.saturating_add(1);
            }
        }
        if swept > 0 {
            info!(swept, "expired overdue proposals");
        }
        Ok(swept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn payload() -> serde_json::Value {
        serde_json::json!({"url": "https://api.example.com/data"})
    }

    async fn pending(registry: &MemoryProposalRegistry, owner: &OwnerId) -> ActionProposal {
        registry
            .create(owner, ProposalKind::X402Payment, payload(), None)
            .await
            .unwrap()
    }

    // -----------------------------------------------------------------------
    // Create / get
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_sets_pending_and_ttl() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;
        assert_eq!(p.status, ProposalStatus::Pending);
        assert!(p.expires_at > p.created_at);
    }

    #[tokio::test]
    async fn test_cross_owner_get_is_not_found() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;

        let stranger = OwnerId::new();
        let err = registry.get(&p.id, &stranger).await.unwrap_err();
        assert!(matches!(err, ProposalError::NotFound { .. }));

        // The rightful owner still sees it.
        assert!(registry.get(&p.id, &owner).await.is_ok());
    }

    // -----------------------------------------------------------------------
    // Commit semantics
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_commit_executes_once() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;

        let committed = registry.commit(&p.id, &owner).await.unwrap();
        assert_eq!(committed.status, ProposalStatus::Executed);

        let err = registry.commit(&p.id, &owner).await.unwrap_err();
        assert!(matches!(
            err,
            ProposalError::AlreadyResolved {
                status: ProposalStatus::Executed,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancel_then_commit_reports_cancelled() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;

        registry.cancel(&p.id, &owner).await.unwrap();
        let err = registry.commit(&p.id, &owner).await.unwrap_err();
        assert!(matches!(
            err,
            ProposalError::AlreadyResolved {
                status: ProposalStatus::Cancelled,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_commit_after_ttl_expires_lazily() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        // TTL already elapsed; no sweep has run.
        let p = registry
            .create(
                &owner,
                ProposalKind::X402Payment,
                payload(),
                Some(Duration::seconds(-1)),
            )
            .await
            .unwrap();

        let err = registry.commit(&p.id, &owner).await.unwrap_err();
        assert!(matches!(err, ProposalError::Expired { .. }));

        // The row now records expired — and stays idempotent.
        let stored = registry.get(&p.id, &owner).await.unwrap();
        assert_eq!(stored.status, ProposalStatus::Expired);
        let err = registry.commit(&p.id, &owner).await.unwrap_err();
        assert!(matches!(err, ProposalError::AlreadyResolved { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_commits_one_winner() {
        let registry = Arc::new(MemoryProposalRegistry::new());
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;

        let mut handles = Vec::new();
        for _ in 0..16 {
            let registry = Arc::clone(&registry);
            let owner = owner.clone();
            let id = p.id.clone();
            handles.push(tokio::spawn(async move {
                registry.commit(&id, &owner).await.is_ok()
            }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_cross_owner_commit_is_not_found() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;

        let err = registry.commit(&p.id, &OwnerId::new()).await.unwrap_err();
        assert!(matches!(err, ProposalError::NotFound { .. }));

        // Unaffected: the rightful owner can still commit.
        assert!(registry.commit(&p.id, &owner).await.is_ok());
    }

    // -----------------------------------------------------------------------
    // Sweep
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn test_sweep_expires_only_overdue_pending() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();

        let fresh = pending(&registry, &owner).await;
        let overdue = registry
            .create(
                &owner,
                ProposalKind::TokenTransfer,
                payload(),
                Some(Duration::seconds(-1)),
            )
            .await
            .unwrap();
        let executed = pending(&registry, &owner).await;
        registry.commit(&executed.id, &owner).await.unwrap();

        let swept = registry.sweep_expired().await.unwrap();
        assert_eq!(swept, 1);

        assert_eq!(
            registry.get(&fresh.id, &owner).await.unwrap().status,
            ProposalStatus::Pending
        );
        assert_eq!(
            registry.get(&overdue.id, &owner).await.unwrap().status,
            ProposalStatus::Expired
        );
        assert_eq!(
            registry.get(&executed.id, &owner).await.unwrap().status,
            ProposalStatus::Executed
        );
    }

    #[tokio::test]
    async fn test_rows_survive_resolution() {
        let registry = MemoryProposalRegistry::new();
        let owner = OwnerId::new();
        let p = pending(&registry, &owner).await;
        registry.commit(&p.id, &owner).await.unwrap();
        // Audit trail: resolved rows are never deleted.
        assert_eq!(registry.count().unwrap(), 1);
        assert!(registry.get(&p.id, &owner).await.is_ok());
    }
}
