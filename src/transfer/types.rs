use std::sync::Arc;

use crate::wallet::AccountAdapter;

/// Immutable description of one transfer attempt.
///
/// Constructed fresh per submission and never mutated. The adapter handles
/// identify the connected accounts on each side; the amount is a positive
/// decimal string of USDC.
#[derive(Clone)]
pub struct TransferRequest {
    pub source_chain: String,
    pub destination_chain: String,
    pub amount: String,
    pub source_adapter: Arc<dyn AccountAdapter>,
    pub destination_adapter: Arc<dyn AccountAdapter>,
}

/// Terminal result of one transfer attempt. Derived exactly once, at the
/// end of the attempt; an attempt is either still in flight or has exactly
/// one outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferOutcome {
    Success { settled_amount: String },
    Failure { reason: String },
}

/// Errors that stop an attempt before it produces an outcome
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    /// Rejected pre-flight; no state was changed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another attempt is already in flight on this orchestrator.
    #[error("A transfer is already in flight")]
    Busy,

    /// The user declined the entry network switch; the attempt simply stops.
    #[error("User declined the network switch")]
    SwitchDeclined,
}
