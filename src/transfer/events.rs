//! Event normalization for transfer progress.
//!
//! This module maps the bridge's raw, polymorphic progress events into a
//! small closed set of step identifiers and per-step states. Recognition is
//! a pure function at this boundary: unknown method names or malformed
//! payloads are dropped, never fatal, so a protocol-side addition can not
//! break an in-flight transfer.

use crate::bridge::BridgeEvent;

/// The discrete steps of one cross-chain transfer, in protocol order.
///
/// `Success` and `Error` are terminal pseudo-steps set by the orchestrator
/// at resolution; the normalizer only ever produces the four phase steps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransferStep {
    Approving,
    Burning,
    Attesting,
    Minting,
    Success,
    Error,
}

impl TransferStep {
    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            TransferStep::Approving => "Approval",
            TransferStep::Burning => "Burn",
            TransferStep::Attesting => "Attestation",
            TransferStep::Minting => "Mint",
            TransferStep::Success => "Success",
            TransferStep::Error => "Error",
        }
    }
}

/// Per-step state reported by the bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepState {
    Pending,
    Active,
    Success,
    Error,
}

impl StepState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepState::Pending => "pending",
            StepState::Active => "active",
            StepState::Success => "success",
            StepState::Error => "error",
        }
    }
}

/// A recognized progress event, ready for the tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedEvent {
    pub step: TransferStep,
    pub state: StepState,
    /// Error message carried by the raw event, when present.
    pub detail: Option<String>,
}

/// Map a raw bridge event to a (step, state) observation.
///
/// Method names cover the protocol's phase names and their on-chain
/// aliases. Returns `None` for anything unrecognized; callers are free to
/// log dropped events at a diagnostic level.
pub fn normalize(event: &BridgeEvent) -> Option<NormalizedEvent> {
    let step = match event.method.as_str() {
        "approve" | "approval" => TransferStep::Approving,
        "burn" | "depositForBurn" => TransferStep::Burning,
        "attest" | "attestation" | "fetchAttestation" => TransferStep::Attesting,
        "mint" | "receiveMessage" => TransferStep::Minting,
        _ => return None,
    };

    let state = match event.values.state.as_deref() {
        Some("pending") => StepState::Pending,
        Some("active") | Some("in_progress") | Some("inProgress") => StepState::Active,
        Some("success") => StepState::Success,
        Some("error") | Some("failed") => StepState::Error,
        _ => return None,
    };

    Some(NormalizedEvent {
        step,
        state,
        detail: event.values.error_message.clone(),
    })
}

/// Whether a raw event should trigger destination-network alignment.
///
/// True for mint-phase events whose reported state is not terminal. A
/// missing state counts as non-terminal: the wallet must be on the
/// destination network before the mint transaction is signed.
pub fn is_mint_alignment_trigger(event: &BridgeEvent) -> bool {
    matches!(event.method.as_str(), "mint" | "receiveMessage")
        && !matches!(event.values.state.as_deref(), Some("success") | Some("error"))
}
