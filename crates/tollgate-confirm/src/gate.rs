//! The confirmation gate state machine.
//!
//! Two states per session: `Idle` and `AwaitingConfirmation(action)`.
//! The gate never executes anything itself — it returns a
//! [`GateDisposition`] telling the caller what to do with the input, and
//! for a confirmed action it re-issues the action's parameters with
//! `confirmed = true` so the downstream operation can tell an approved
//! call from a raw one.

use chrono::Duration;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use tollgate_core::{SessionId, Timestamp};
use tracing::{debug, info};

use crate::error::{GateError, GateResult};
use crate::sanitize::sanitize_input;

/// Default time a pending action stays confirmable: 5 minutes.
const DEFAULT_PENDING_TTL_SECS: i64 = 5 * 60;

/// Inputs that confirm the held action (matched case-insensitively).
const CONFIRM_TOKENS: &[&str] = &["yes", "y", "confirm"];

/// Inputs that cancel the held action (matched case-insensitively).
const CANCEL_TOKENS: &[&str] = &["no", "n", "cancel"];

/// The kind of operation held behind the gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// An x402 pay-per-request payment.
    X402Payment,
    /// A direct token transfer.
    TokenTransfer,
    /// An ERC-20 approval.
    TokenApproval,
}

impl ActionKind {
    /// Financial kinds always require confirmation, regardless of flags.
    #[must_use]
    pub fn is_financial(&self) -> bool {
        matches!(
            self,
            Self::X402Payment | Self::TokenTransfer | Self::TokenApproval
        )
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X402Payment => write!(f, "x402_payment"),
            Self::TokenTransfer => write!(f, "token_transfer"),
            Self::TokenApproval => write!(f, "token_approval"),
        }
    }
}

/// An action held until the human confirms or cancels it.
///
/// Ephemeral and session-scoped: never persisted, never shared across
/// sessions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingAction {
    /// What kind of operation this is.
    pub kind: ActionKind,
    /// Human-readable description shown when asking for confirmation.
    pub description: String,
    /// The downstream operation to re-issue on confirmation.
    pub target_operation: String,
    /// Operation parameters; `confirmed` is forced to `true` on approval.
    pub parameters: serde_json::Value,
    /// When the action was proposed.
    pub created_at: Timestamp,
}

impl PendingAction {
    /// Create a pending action stamped now.
    #[must_use]
    pub fn new(
        kind: ActionKind,
        description: impl Into<String>,
        target_operation: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            kind,
            description: description.into(),
            target_operation: target_operation.into(),
            parameters,
            created_at: Timestamp::now(),
        }
    }

    /// Whether an operation must pass through the gate before executing.
    ///
    /// True when the parameters carry a `confirmed` flag that is currently
    /// false, or when the flag is absent and the kind is inherently
    /// financial. A call re-issued with `confirmed = true` has already
    /// been through the gate and is not gated again.
    #[must_use]
    pub fn requires_confirmation(kind: ActionKind, parameters: &serde_json::Value) -> bool {
        match parameters
            .get("confirmed")
            .and_then(serde_json::Value::as_bool)
        {
            Some(true) => false,
            Some(false) => true,
            None => kind.is_financial(),
        }
    }

    fn into_confirmed(mut self) -> Self {
        if let serde_json::Value::Object(map) = &mut self.parameters {
            map.insert("confirmed".to_string(), serde_json::Value::Bool(true));
        }
        self
    }
}

/// What the caller should do with the input it just handed the gate.
#[derive(Debug)]
pub enum GateDisposition {
    /// The human confirmed: execute this action (parameters carry
    /// `confirmed = true`). The gate is back to idle.
    Execute(PendingAction),
    /// The human cancelled: discard this action, execute nothing.
    Cancel(PendingAction),
    /// Unrelated input: route the sanitized text through the normal
    /// request path. A still-held action, if any, remains confirmable.
    PassThrough {
        /// The input after unconditional sanitization.
        sanitized: String,
    },
}

/// Result of one gate evaluation.
#[derive(Debug)]
pub struct GateEvaluation {
    /// An action that aged out before this input arrived, if any.
    pub expired: Option<PendingAction>,
    /// What to do with the input.
    pub disposition: GateDisposition,
}

/// Per-session confirmation state machine.
#[derive(Debug, Default)]
pub struct ConfirmationGate {
    pending: Option<PendingAction>,
    ttl: Option<Duration>,
}

impl ConfirmationGate {
    /// Create an idle gate with the default pending-action TTL.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a gate with a custom pending-action TTL.
    #[must_use]
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            pending: None,
            ttl: Some(ttl),
        }
    }

    /// Whether the gate is idle (no action awaiting confirmation).
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// The currently held action, if any.
    #[must_use]
    pub fn pending(&self) -> Option<&PendingAction> {
        self.pending.as_ref()
    }

    /// Hold an action until the human confirms or cancels it.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::AlreadyAwaiting`] if a live (non-expired)
    /// action is already held — at most one pending action per session.
    pub fn propose(&mut self, action: PendingAction) -> GateResult<()> {
        self.expire_if_stale(Timestamp::now());
        if let Some(held) = &self.pending {
            return Err(GateError::AlreadyAwaiting {
                description: held.description.clone(),
            });
        }
        info!(kind = %action.kind, description = %action.description, "action awaiting confirmation");
        self.pending = Some(action);
        Ok(())
    }

    /// Interpret one user input against the current state.
    ///
    /// Sanitization of pass-through text is unconditional and happens
    /// here, before the input can reach intent classification or any
    /// external text interface.
    pub fn evaluate(&mut self, raw_input: &str) -> GateEvaluation {
        let expired = self.expire_if_stale(Timestamp::now());
        let token = raw_input.trim().to_ascii_lowercase();

        let disposition = match self.pending.take() {
            Some(action) if CONFIRM_TOKENS.contains(&token.as_str()) => {
                info!(kind = %action.kind, "action confirmed by user");
                GateDisposition::Execute(action.into_confirmed())
            },
            Some(action) if CANCEL_TOKENS.contains(&token.as_str()) => {
                info!(kind = %action.kind, "action cancelled by user");
                GateDisposition::Cancel(action)
            },
            held => {
                // Unrelated input: the held action stays confirmable.
                self.pending = held;
                GateDisposition::PassThrough {
                    sanitized: sanitize_input(raw_input),
                }
            },
        };

        GateEvaluation {
            expired,
            disposition,
        }
    }

    /// Discard the held action without input, if any.
    pub fn clear(&mut self) -> Option<PendingAction> {
        self.pending.take()
    }

    fn expire_if_stale(&mut self, now: Timestamp) -> Option<PendingAction> {
        let ttl = self
            .ttl
            .unwrap_or_else(|| Duration::seconds(DEFAULT_PENDING_TTL_SECS));
        let stale = self
            .pending
            .as_ref()
            .is_some_and(|a| now >= a.created_at.plus(ttl));
        if stale {
            let action = self.pending.take();
            if let Some(a) = &action {
                debug!(kind = %a.kind, "pending action expired unconfirmed");
            }
            action
        } else {
            None
        }
    }
}

/// Per-session gate registry.
///
/// Each conversational session gets its own isolated gate; a pending
/// action in one session is invisible to every other.
#[derive(Debug, Default)]
pub struct GateRegistry {
    gates: DashMap<SessionId, ConfirmationGate>,
}

impl GateRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Propose an action in a session, creating the gate if needed.
    ///
    /// # Errors
    ///
    /// Returns [`GateError::AlreadyAwaiting`] if the session already holds
    /// a live pending action.
    pub fn propose(&self, session: &SessionId, action: PendingAction) -> GateResult<()> {
        self.gates
            .entry(session.clone())
            .or_default()
            .propose(action)
    }

    /// Evaluate input for a session, creating the gate if needed.
    pub fn evaluate(&self, session: &SessionId, raw_input: &str) -> GateEvaluation {
        self.gates
            .entry(session.clone())
            .or_default()
            .evaluate(raw_input)
    }

    /// Drop a session's gate entirely (session ended).
    pub fn remove(&self, session: &SessionId) {
        self.gates.remove(session);
    }

    /// Number of sessions with a gate.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.gates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment_action() -> PendingAction {
        PendingAction::new(
            ActionKind::X402Payment,
            "Pay $1.00 USDC to api.example.com",
            "x402_pay",
            serde_json::json!({"url": "https://api.example.com/data", "confirmed": false}),
        )
    }

    // -----------------------------------------------------------------------
    // Confirmation and cancellation
    // -----------------------------------------------------------------------

    #[test]
    fn test_yes_executes_with_confirmed_true() {
        let mut gate = ConfirmationGate::new();
        gate.propose(payment_action()).unwrap();

        let eval = gate.evaluate("yes");
        let GateDisposition::Execute(action) = eval.disposition else {
            panic!("expected execute");
        };
        assert_eq!(action.parameters["confirmed"], serde_json::json!(true));
        assert!(gate.is_idle());
    }

    #[test]
    fn test_confirmation_tokens_case_insensitive() {
        for token in ["YES", "Y", "Confirm", "  yes  "] {
            let mut gate = ConfirmationGate::new();
            gate.propose(payment_action()).unwrap();
            let eval = gate.evaluate(token);
            assert!(
                matches!(eval.disposition, GateDisposition::Execute(_)),
                "token {token:?} should confirm"
            );
        }
    }

    #[test]
    fn test_cancel_discards_without_executing() {
        let mut gate = ConfirmationGate::new();
        gate.propose(payment_action()).unwrap();

        let eval = gate.evaluate("cancel");
        let GateDisposition::Cancel(action) = eval.disposition else {
            panic!("expected cancel");
        };
        // Parameters untouched: nothing was approved.
        assert_eq!(action.parameters["confirmed"], serde_json::json!(false));
        assert!(gate.is_idle());
    }

    #[test]
    fn test_cancellation_tokens() {
        for token in ["no", "N", "CANCEL"] {
            let mut gate = ConfirmationGate::new();
            gate.propose(payment_action()).unwrap();
            assert!(matches!(
                gate.evaluate(token).disposition,
                GateDisposition::Cancel(_)
            ));
        }
    }

    // -----------------------------------------------------------------------
    // Unrelated input
    // -----------------------------------------------------------------------

    #[test]
    fn test_unrelated_input_keeps_action_pending() {
        let mut gate = ConfirmationGate::new();
        gate.propose(payment_action()).unwrap();

        let eval = gate.evaluate("what is my balance?");
        assert!(matches!(
            eval.disposition,
            GateDisposition::PassThrough { .. }
        ));
        assert!(!gate.is_idle());

        // Still confirmable afterwards.
        assert!(matches!(
            gate.evaluate("y").disposition,
            GateDisposition::Execute(_)
        ));
    }

    #[test]
    fn test_pass_through_is_sanitized() {
        let mut gate = ConfirmationGate::new();
        let key = "a1b2c3d4e5f6a7b8c9d0e1f2a3b4c5d6e7f8a9b0c1d2e3f4a5b6c7d8e9f0a1b2";
        let eval = gate.evaluate(&format!("my key is 0x{key}"));
        let GateDisposition::PassThrough { sanitized } = eval.disposition else {
            panic!("expected pass-through");
        };
        assert!(!sanitized.contains(key));
    }

    #[test]
    fn test_yes_while_idle_is_pass_through() {
        let mut gate = ConfirmationGate::new();
        let eval = gate.evaluate("yes");
        assert!(matches!(
            eval.disposition,
            GateDisposition::PassThrough { .. }
        ));
    }

    // -----------------------------------------------------------------------
    // One-slot rule and expiry
    // -----------------------------------------------------------------------

    #[test]
    fn test_second_proposal_rejected_while_awaiting() {
        let mut gate = ConfirmationGate::new();
        gate.propose(payment_action()).unwrap();
        let err = gate.propose(payment_action()).unwrap_err();
        assert!(matches!(err, GateError::AlreadyAwaiting { .. }));
    }

    #[test]
    fn test_stale_action_expires_on_evaluation() {
        let mut gate = ConfirmationGate::with_ttl(Duration::seconds(-1));
        gate.propose(payment_action()).unwrap();

        // "yes" arrives too late: the action expired, nothing executes.
        let eval = gate.evaluate("yes");
        assert!(eval.expired.is_some());
        assert!(matches!(
            eval.disposition,
            GateDisposition::PassThrough { .. }
        ));
        assert!(gate.is_idle());
    }

    #[test]
    fn test_stale_action_expires_on_propose() {
        let mut gate = ConfirmationGate::with_ttl(Duration::seconds(-1));
        gate.propose(payment_action()).unwrap();
        // The stale holder does not block a new proposal.
        gate.propose(payment_action()).unwrap();
    }

    #[test]
    fn test_requires_confirmation_rules() {
        // Explicitly unconfirmed: gated.
        assert!(PendingAction::requires_confirmation(
            ActionKind::TokenTransfer,
            &serde_json::json!({"confirmed": false}),
        ));
        // Financial kind with no flag: gated.
        assert!(PendingAction::requires_confirmation(
            ActionKind::X402Payment,
            &serde_json::json!({}),
        ));
        // Re-issued after approval: not gated again.
        assert!(!PendingAction::requires_confirmation(
            ActionKind::TokenTransfer,
            &serde_json::json!({"confirmed": true}),
        ));
    }

    // -----------------------------------------------------------------------
    // Session isolation
    // -----------------------------------------------------------------------

    #[test]
    fn test_sessions_are_isolated() {
        let registry = GateRegistry::new();
        let alice = SessionId::new();
        let bob = SessionId::new();

        registry.propose(&alice, payment_action()).unwrap();

        // Bob's "yes" confirms nothing.
        let eval = registry.evaluate(&bob, "yes");
        assert!(matches!(
            eval.disposition,
            GateDisposition::PassThrough { .. }
        ));

        // Alice's "yes" confirms her action.
        let eval = registry.evaluate(&alice, "yes");
        assert!(matches!(eval.disposition, GateDisposition::Execute(_)));
    }

    #[test]
    fn test_registry_remove() {
        let registry = GateRegistry::new();
        let session = SessionId::new();
        registry.propose(&session, payment_action()).unwrap();
        assert_eq!(registry.session_count(), 1);
        registry.remove(&session);
        assert_eq!(registry.session_count(), 0);
    }
}
