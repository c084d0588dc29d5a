//! Transfer orchestrator and integration point for one bridge attempt.
//!
//! This module defines the `TransferOrchestrator`, which drives a single
//! cross-chain USDC transfer from submission to terminal outcome. It owns
//! the attempt lifecycle:
//!
//! - Pre-flight validation against the chain catalog and the source balance
//! - Entry alignment of the wallet to the source network
//! - Invoking the external bridge call and routing its progress events to
//!   the progress tracker (always) and to the network synchronizer
//!   (mint-phase destination alignment)
//! - Classifying the terminal envelope into exactly one outcome
//! - Refreshing the source balance after a successful transfer
//!
//! Every attempt carries an id; tracker writes and success side effects for
//! an attempt the caller has since reset are discarded, since the underlying
//! protocol action can not be cancelled and may resolve late.

use crate::bridge::{
    BridgeEnvelope, BridgeEvent, BridgeResult, BridgeService, BridgeTransferRequest, ChainCatalog,
    SupportedChain,
};
use crate::transfer::events::{TransferStep, is_mint_alignment_trigger, normalize};
use crate::transfer::network::{
    AlignError, AlignmentReason, NetworkSynchronizer, WalletNetworkPort,
};
use crate::transfer::progress::{LogEntry, ProgressTracker};
use crate::transfer::types::{TransferError, TransferOutcome, TransferRequest};
use crate::utils::parse_decimal_amount;
use crate::wallet::WalletKind;

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Configuration for the orchestrator
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Upper bound on the mid-flight destination network switch, so a
    /// wallet prompt the user ignores can not wedge event processing.
    pub mint_switch_timeout: Duration,
    /// Capacity of the progress-event channel between the bridge call and
    /// the orchestrating task.
    pub event_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            mint_switch_timeout: Duration::from_secs(20),
            event_buffer: 32,
        }
    }
}

/// Drives one transfer attempt at a time from submission to outcome.
///
/// The orchestrator is the entry point for transfers. It wires together the
/// bridge service, the progress tracker, the network synchronizer, and the
/// balance collaborator, and guarantees exactly one `TransferOutcome` per
/// accepted submission. Only one attempt may be in flight per instance; a
/// concurrent submission is rejected.
pub struct TransferOrchestrator {
    bridge: Arc<dyn BridgeService>,
    balances: Arc<dyn crate::wallet::UsdcBalancePort>,
    network: NetworkSynchronizer,
    catalog: ChainCatalog,

    progress: Mutex<ProgressTracker>,
    /// Monotonically increasing attempt tag; updates for stale tags are dropped.
    attempt: AtomicU64,
    in_flight: AtomicBool,
    event_buffer: usize,
}

impl TransferOrchestrator {
    pub fn new(
        bridge: Arc<dyn BridgeService>,
        balances: Arc<dyn crate::wallet::UsdcBalancePort>,
        wallet: Arc<dyn WalletNetworkPort>,
        catalog: ChainCatalog,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            bridge,
            balances,
            network: NetworkSynchronizer::new(wallet, config.mint_switch_timeout),
            catalog,
            progress: Mutex::new(ProgressTracker::new()),
            attempt: AtomicU64::new(0),
            in_flight: AtomicBool::new(false),
            event_buffer: config.event_buffer,
        }
    }

    /// The read-only chain catalog this orchestrator was built with.
    pub fn catalog(&self) -> &ChainCatalog {
        &self.catalog
    }

    /// Snapshot of the current attempt's log.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.progress.lock().unwrap().logs().to_vec()
    }

    /// The step the current attempt is in, or `None` before the first one.
    pub fn current_step(&self) -> Option<TransferStep> {
        self.progress.lock().unwrap().current_step()
    }

    /// Clear local tracking state. This does not stop the underlying
    /// protocol action; anything it still emits for the old attempt is
    /// discarded.
    pub fn reset(&self) {
        self.attempt.fetch_add(1, Ordering::SeqCst);
        self.progress.lock().unwrap().reset();
        info!("Transfer tracking state cleared");
    }

    /// Drive one transfer attempt to its terminal outcome.
    ///
    /// Returns `Err` only for submissions that never start: validation
    /// failures, a concurrent attempt, or the user declining the entry
    /// network switch. Everything that fails after the bridge is invoked
    /// resolves to `Ok(TransferOutcome::Failure)` with a log trail.
    pub async fn submit(
        &self,
        request: TransferRequest,
    ) -> Result<TransferOutcome, TransferError> {
        let (source, destination) = self.validate(&request)?;

        // The UI caps the input at the available balance; enforce it here
        // too. A failed balance read never blocks the transfer.
        match self
            .balances
            .balance(source, request.source_adapter.as_ref())
            .await
        {
            Ok(available) => {
                let requested = parse_decimal_amount(&request.amount);
                let available_value = available.parse::<f64>().ok();
                if let (Some(requested), Some(available_value)) = (requested, available_value) {
                    if requested > available_value {
                        return Err(TransferError::Validation(format!(
                            "Requested {} USDC but only {} USDC available on {}",
                            request.amount,
                            available,
                            source.display_name()
                        )));
                    }
                }
            }
            Err(e) => warn!("Could not read source balance, skipping the pre-check: {}", e),
        }

        if self.in_flight.swap(true, Ordering::SeqCst) {
            return Err(TransferError::Busy);
        }

        let attempt = self.attempt.fetch_add(1, Ordering::SeqCst) + 1;
        info!(
            "Starting bridge attempt {}: {} -> {} ({} USDC)",
            attempt, request.source_chain, request.destination_chain, request.amount
        );

        let result = self.run_attempt(attempt, &request, source, destination).await;
        self.in_flight.store(false, Ordering::SeqCst);
        result
    }

    fn validate<'a>(
        &'a self,
        request: &TransferRequest,
    ) -> Result<(&'a SupportedChain, &'a SupportedChain), TransferError> {
        if parse_decimal_amount(&request.amount).is_none() {
            return Err(TransferError::Validation(format!(
                "Amount must be a positive number, got {:?}",
                request.amount
            )));
        }

        if request.source_chain == request.destination_chain {
            return Err(TransferError::Validation(
                "Source and destination chains must differ".to_string(),
            ));
        }

        let source = self.catalog.find(&request.source_chain).ok_or_else(|| {
            TransferError::Validation(format!("Unknown source chain {}", request.source_chain))
        })?;
        let destination = self.catalog.find(&request.destination_chain).ok_or_else(|| {
            TransferError::Validation(format!(
                "Unknown destination chain {}",
                request.destination_chain
            ))
        })?;

        if request.source_adapter.kind() != expected_kind(source) {
            return Err(TransferError::Validation(format!(
                "Source adapter does not match the {} wallet kind",
                source.display_name()
            )));
        }
        if request.destination_adapter.kind() != expected_kind(destination) {
            return Err(TransferError::Validation(format!(
                "Destination adapter does not match the {} wallet kind",
                destination.display_name()
            )));
        }

        Ok((source, destination))
    }

    async fn run_attempt(
        &self,
        attempt: u64,
        request: &TransferRequest,
        source: &SupportedChain,
        destination: &SupportedChain,
    ) -> Result<TransferOutcome, TransferError> {
        self.with_tracker(attempt, |tracker| {
            tracker.reset();
            tracker.add_log("Bridge started");
            tracker.add_log("Approving USDC transfer...");
            tracker.set_step(TransferStep::Approving);
        });

        // The approval and burn transactions are signed on the source chain;
        // make that an explicit alignment instead of assuming prior UI action
        // left the wallet there.
        if source.requires_alignment() {
            match self
                .network
                .align(source, AlignmentReason::SourceEntry)
                .await
            {
                Ok(()) => {}
                Err(AlignError::Declined) => {
                    warn!(
                        "User declined the source network switch; aborting attempt {}",
                        attempt
                    );
                    return Err(TransferError::SwitchDeclined);
                }
                Err(e) => return Ok(self.fail(attempt, e.to_string())),
            }
        }

        let bridge_request = BridgeTransferRequest {
            from_chain: request.source_chain.clone(),
            to_chain: request.destination_chain.clone(),
            amount: request.amount.clone(),
            from_address: request.source_adapter.address().to_string(),
            to_address: request.destination_adapter.address().to_string(),
        };

        let (events_tx, mut events_rx) = mpsc::channel::<BridgeEvent>(self.event_buffer);
        let call = self.bridge.execute(&bridge_request, events_tx);
        tokio::pin!(call);

        // The bridge emits events while we are awaiting the same call, so
        // drive both from one select loop.
        let mut events_open = true;
        let mut mint_aligned = false;
        let call_result = loop {
            tokio::select! {
                maybe_event = events_rx.recv(), if events_open => match maybe_event {
                    Some(event) => {
                        self.on_event(attempt, destination, &event, &mut mint_aligned).await
                    }
                    None => events_open = false,
                },
                result = &mut call => break result,
            }
        };

        // Resolution can race the last few events; apply whatever is buffered.
        while let Ok(event) = events_rx.try_recv() {
            self.on_event(attempt, destination, &event, &mut mint_aligned)
                .await;
        }

        let envelope = match call_result {
            Ok(envelope) => envelope,
            Err(e) => return Ok(self.fail(attempt, e.to_string())),
        };

        let outcome = Self::classify_envelope(&envelope, &request.amount);

        match &outcome {
            TransferOutcome::Success { .. } => {
                let current = self.with_tracker(attempt, |tracker| {
                    tracker.set_step(TransferStep::Success);
                    tracker.add_log(format!(
                        "Successfully bridged {} USDC from {} to {}",
                        request.amount,
                        source.display_name(),
                        destination.display_name()
                    ));
                });
                if current {
                    if let Err(e) = self
                        .balances
                        .refresh(source, request.source_adapter.as_ref())
                        .await
                    {
                        warn!("Balance refresh after success failed: {}", e);
                    }
                } else {
                    debug!("Attempt {} superseded; skipping success side effects", attempt);
                }
            }
            TransferOutcome::Failure { reason } => {
                self.fail(attempt, reason.clone());
            }
        }

        Ok(outcome)
    }

    /// Handle one progress event: forward it to the tracker, and align the
    /// wallet to the destination network when the mint phase begins.
    async fn on_event(
        &self,
        attempt: u64,
        destination: &SupportedChain,
        event: &BridgeEvent,
        mint_aligned: &mut bool,
    ) {
        if self.attempt.load(Ordering::SeqCst) != attempt {
            debug!("Discarding event for stale attempt {}", attempt);
            return;
        }

        match normalize(event) {
            Some(normalized) => {
                self.with_tracker(attempt, |tracker| {
                    tracker.handle_event(&normalized);
                });
            }
            None => debug!("Dropping unrecognized bridge event method {:?}", event.method),
        }

        // The mint transaction is signed by the user's wallet, which must be
        // on the destination network before the prompt appears. Once the
        // switch has succeeded, later mint events do not prompt again.
        if is_mint_alignment_trigger(event) && destination.requires_alignment() && !*mint_aligned {
            match self
                .network
                .align_bounded(destination, AlignmentReason::MintPhase)
                .await
            {
                Ok(()) => *mint_aligned = true,
                Err(AlignError::Declined) => {
                    warn!(
                        "User declined the destination network switch; minting may fail on the wallet side"
                    );
                }
                Err(e) => warn!("Destination network alignment failed: {}; continuing", e),
            }
        }
    }

    /// Classify the terminal envelope into exactly one outcome.
    ///
    /// A step-level error overrides a top-level success report; an
    /// undecodable payload is a failure, never a panic.
    fn classify_envelope(envelope: &BridgeEnvelope, amount: &str) -> TransferOutcome {
        let decoded: Result<BridgeResult, serde_json::Error> = match &envelope.data {
            serde_json::Value::String(raw) => serde_json::from_str(raw),
            other => serde_json::from_value(other.clone()),
        };

        let result = match decoded {
            Ok(result) => result,
            Err(e) => {
                debug!("Failed to decode bridge result payload: {}", e);
                return TransferOutcome::Failure {
                    reason: "Bridge returned an unreadable result".to_string(),
                };
            }
        };

        let error_step = result.steps.iter().find(|step| step.state == "error");
        let succeeded =
            envelope.ok && error_step.is_none() && result.state.as_deref() == Some("success");

        if succeeded {
            TransferOutcome::Success {
                settled_amount: amount.to_string(),
            }
        } else {
            let reason = error_step
                .and_then(|step| step.error_message.clone())
                .unwrap_or_else(|| "Bridge failed".to_string());
            TransferOutcome::Failure { reason }
        }
    }

    fn fail(&self, attempt: u64, reason: String) -> TransferOutcome {
        error!("Bridge attempt {} failed: {}", attempt, reason);
        self.with_tracker(attempt, |tracker| {
            tracker.add_log(format!("Error: {}", reason));
            tracker.set_step(TransferStep::Error);
        });
        TransferOutcome::Failure { reason }
    }

    /// Run `f` against the tracker if `attempt` is still current. Returns
    /// whether the write was applied.
    fn with_tracker<F: FnOnce(&mut ProgressTracker)>(&self, attempt: u64, f: F) -> bool {
        if self.attempt.load(Ordering::SeqCst) != attempt {
            debug!("Discarding tracker update for stale attempt {}", attempt);
            return false;
        }
        let mut tracker = self.progress.lock().unwrap();
        f(&mut tracker);
        true
    }
}

fn expected_kind(chain: &SupportedChain) -> WalletKind {
    if chain.kind_is_evm {
        WalletKind::Evm
    } else {
        WalletKind::Solana
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeError, BridgeEventValues};
    use crate::transfer::network::SwitchError;
    use crate::wallet::{
        AccountAdapter, BalanceError, EvmAccountAdapter, SolanaAccountAdapter, UsdcBalancePort,
    };
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    struct ScriptedBridge {
        events: Vec<BridgeEvent>,
        envelope: BridgeEnvelope,
        delay: Duration,
        calls: AtomicUsize,
    }

    impl ScriptedBridge {
        fn new(events: Vec<BridgeEvent>, envelope: BridgeEnvelope) -> Arc<Self> {
            Arc::new(Self {
                events,
                envelope,
                delay: Duration::ZERO,
                calls: AtomicUsize::new(0),
            })
        }

        fn slow(events: Vec<BridgeEvent>, envelope: BridgeEnvelope, delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                events,
                envelope,
                delay,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl BridgeService for ScriptedBridge {
        async fn supported_chains(&self) -> Result<Vec<SupportedChain>, BridgeError> {
            Ok(Vec::new())
        }

        async fn execute(
            &self,
            _request: &BridgeTransferRequest,
            events: mpsc::Sender<BridgeEvent>,
        ) -> Result<BridgeEnvelope, BridgeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            for event in &self.events {
                let _ = events.send(event.clone()).await;
            }
            if !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            Ok(self.envelope.clone())
        }
    }

    struct StubBalances {
        available: String,
        refreshes: AtomicUsize,
    }

    impl StubBalances {
        fn new(available: &str) -> Arc<Self> {
            Arc::new(Self {
                available: available.to_string(),
                refreshes: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait::async_trait]
    impl UsdcBalancePort for StubBalances {
        async fn balance(
            &self,
            _chain: &SupportedChain,
            _wallet: &dyn AccountAdapter,
        ) -> Result<String, BalanceError> {
            Ok(self.available.clone())
        }

        async fn refresh(
            &self,
            _chain: &SupportedChain,
            _wallet: &dyn AccountAdapter,
        ) -> Result<String, BalanceError> {
            self.refreshes.fetch_add(1, Ordering::SeqCst);
            Ok(self.available.clone())
        }
    }

    enum WalletMode {
        Accept,
        Decline,
        Fault,
    }

    struct ScriptedWallet {
        mode: WalletMode,
        calls: Mutex<Vec<u64>>,
    }

    impl ScriptedWallet {
        fn new(mode: WalletMode) -> Arc<Self> {
            Arc::new(Self {
                mode,
                calls: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl WalletNetworkPort for ScriptedWallet {
        async fn switch_active_network(&self, chain_id: u64) -> Result<(), SwitchError> {
            self.calls.lock().unwrap().push(chain_id);
            match self.mode {
                WalletMode::Accept => Ok(()),
                WalletMode::Decline => Err(SwitchError::Declined),
                WalletMode::Fault => Err(SwitchError::Wallet("wallet connection lost".to_string())),
            }
        }
    }

    fn evm_chain(chain: &str, chain_id: u64) -> SupportedChain {
        SupportedChain {
            chain: chain.to_string(),
            name: None,
            chain_id: Some(chain_id),
            is_testnet: true,
            kind_is_evm: true,
        }
    }

    fn catalog() -> ChainCatalog {
        ChainCatalog::new(vec![
            evm_chain("Ethereum_Sepolia", 11155111),
            evm_chain("Base_Sepolia", 84532),
            SupportedChain {
                chain: "Solana_Devnet".to_string(),
                name: None,
                chain_id: None,
                is_testnet: true,
                kind_is_evm: false,
            },
        ])
    }

    fn adapter_for(chain: &str) -> Arc<dyn AccountAdapter> {
        if chain.starts_with("Solana") {
            Arc::new(SolanaAccountAdapter::new(
                "9xQeWvG816bUx9EPjHmaT23yvVM2ZWbrrpZb9PusVFin",
            ))
        } else {
            Arc::new(EvmAccountAdapter::new(
                "0x52908400098527886E0F7030069857D2E4169EE7",
            ))
        }
    }

    fn request(source: &str, destination: &str, amount: &str) -> TransferRequest {
        TransferRequest {
            source_chain: source.to_string(),
            destination_chain: destination.to_string(),
            amount: amount.to_string(),
            source_adapter: adapter_for(source),
            destination_adapter: adapter_for(destination),
        }
    }

    fn event(method: &str, state: &str) -> BridgeEvent {
        BridgeEvent {
            method: method.to_string(),
            values: BridgeEventValues {
                state: Some(state.to_string()),
                error_message: None,
            },
        }
    }

    fn success_envelope() -> BridgeEnvelope {
        BridgeEnvelope {
            ok: true,
            data: serde_json::Value::String(r#"{"state":"success","steps":[]}"#.to_string()),
        }
    }

    fn orchestrator(
        bridge: Arc<ScriptedBridge>,
        balances: Arc<StubBalances>,
        wallet: Arc<ScriptedWallet>,
    ) -> TransferOrchestrator {
        TransferOrchestrator::new(
            bridge,
            balances,
            wallet,
            catalog(),
            OrchestratorConfig {
                mint_switch_timeout: Duration::from_millis(100),
                event_buffer: 32,
            },
        )
    }

    #[tokio::test]
    async fn successful_transfer_settles_the_requested_amount() {
        let bridge = ScriptedBridge::new(
            vec![
                event("approve", "success"),
                event("burn", "success"),
                event("mint", "success"),
            ],
            success_envelope(),
        );
        let balances = StubBalances::new("1000");
        let wallet = ScriptedWallet::new(WalletMode::Accept);
        let orch = orchestrator(bridge, balances.clone(), wallet);

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "12.5"))
            .await
            .expect("Failed while submitting transfer");

        assert_eq!(
            outcome,
            TransferOutcome::Success {
                settled_amount: "12.5".to_string()
            }
        );
        assert_eq!(balances.refreshes.load(Ordering::SeqCst), 1);
        assert_eq!(orch.current_step(), Some(TransferStep::Success));
    }

    #[tokio::test]
    async fn step_level_error_overrides_top_level_success() {
        let envelope = BridgeEnvelope {
            ok: true,
            data: serde_json::Value::String(
                r#"{"state":"success","steps":[{"state":"error","errorMessage":"insufficient funds"}]}"#
                    .to_string(),
            ),
        };
        let bridge = ScriptedBridge::new(Vec::new(), envelope);
        let balances = StubBalances::new("1000");
        let orch = orchestrator(bridge, balances.clone(), ScriptedWallet::new(WalletMode::Accept));

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");

        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                reason: "insufficient funds".to_string()
            }
        );
        assert_eq!(balances.refreshes.load(Ordering::SeqCst), 0);
        assert_eq!(orch.current_step(), Some(TransferStep::Error));
        assert!(
            orch.logs()
                .iter()
                .any(|l| l.message == "Error: insufficient funds")
        );
    }

    #[tokio::test]
    async fn structured_result_payload_needs_no_reparse() {
        let envelope = BridgeEnvelope {
            ok: true,
            data: json!({"state": "success", "steps": []}),
        };
        let bridge = ScriptedBridge::new(Vec::new(), envelope);
        let orch = orchestrator(
            bridge,
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");
        assert!(matches!(outcome, TransferOutcome::Success { .. }));
    }

    #[tokio::test]
    async fn undecodable_result_payload_is_a_generic_failure() {
        let envelope = BridgeEnvelope {
            ok: true,
            data: serde_json::Value::String("definitely not json".to_string()),
        };
        let bridge = ScriptedBridge::new(Vec::new(), envelope);
        let orch = orchestrator(
            bridge,
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");
        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                reason: "Bridge returned an unreadable result".to_string()
            }
        );
    }

    #[tokio::test]
    async fn not_ok_envelope_fails_despite_success_state() {
        let envelope = BridgeEnvelope {
            ok: false,
            data: json!({"state": "success", "steps": []}),
        };
        let bridge = ScriptedBridge::new(Vec::new(), envelope);
        let orch = orchestrator(
            bridge,
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");
        assert_eq!(
            outcome,
            TransferOutcome::Failure {
                reason: "Bridge failed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn mint_pending_triggers_one_destination_alignment() {
        let bridge = ScriptedBridge::new(
            vec![
                event("burn", "success"),
                event("mint", "pending"),
                event("mint", "pending"),
            ],
            success_envelope(),
        );
        let wallet = ScriptedWallet::new(WalletMode::Accept);
        let orch = orchestrator(bridge, StubBalances::new("1000"), wallet.clone());

        orch.submit(request("Solana_Devnet", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");

        // One switch to the destination chain id, not one per event.
        assert_eq!(*wallet.calls.lock().unwrap(), vec![84532]);
    }

    #[tokio::test]
    async fn terminal_mint_states_never_trigger_alignment() {
        let bridge = ScriptedBridge::new(
            vec![event("mint", "success"), event("mint", "error")],
            success_envelope(),
        );
        let wallet = ScriptedWallet::new(WalletMode::Accept);
        let orch = orchestrator(bridge, StubBalances::new("1000"), wallet.clone());

        orch.submit(request("Solana_Devnet", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");
        assert!(wallet.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn declined_destination_switch_is_swallowed() {
        let bridge = ScriptedBridge::new(vec![event("mint", "pending")], success_envelope());
        let wallet = ScriptedWallet::new(WalletMode::Decline);
        let orch = orchestrator(bridge, StubBalances::new("1000"), wallet.clone());

        let outcome = orch
            .submit(request("Solana_Devnet", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");

        // The decline is logged and swallowed; the bridge call still resolves.
        assert!(matches!(outcome, TransferOutcome::Success { .. }));
        assert_eq!(*wallet.calls.lock().unwrap(), vec![84532]);
    }

    #[tokio::test]
    async fn declined_entry_switch_aborts_silently() {
        let bridge = ScriptedBridge::new(Vec::new(), success_envelope());
        let wallet = ScriptedWallet::new(WalletMode::Decline);
        let orch = orchestrator(bridge.clone(), StubBalances::new("1000"), wallet);

        let result = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await;

        assert!(matches!(result, Err(TransferError::SwitchDeclined)));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
        assert!(
            orch.logs()
                .iter()
                .all(|l| !l.message.starts_with("Error:"))
        );
    }

    #[tokio::test]
    async fn wallet_fault_at_entry_is_a_failure_outcome() {
        let bridge = ScriptedBridge::new(Vec::new(), success_envelope());
        let wallet = ScriptedWallet::new(WalletMode::Fault);
        let orch = orchestrator(bridge.clone(), StubBalances::new("1000"), wallet);

        let outcome = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await
            .expect("Failed while submitting transfer");

        match outcome {
            TransferOutcome::Failure { reason } => {
                assert!(reason.contains("wallet connection lost"))
            }
            TransferOutcome::Success { .. } => panic!("expected failure"),
        }
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
        assert_eq!(orch.current_step(), Some(TransferStep::Error));
    }

    #[tokio::test]
    async fn overlapping_submits_reject_the_second() {
        let bridge = ScriptedBridge::slow(
            Vec::new(),
            success_envelope(),
            Duration::from_millis(200),
        );
        let orch = Arc::new(orchestrator(
            bridge,
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        ));

        let first = {
            let orch = orch.clone();
            tokio::spawn(
                async move { orch.submit(request("Ethereum_Sepolia", "Base_Sepolia", "5")).await },
            )
        };
        sleep(Duration::from_millis(50)).await;

        let second = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "5"))
            .await;
        assert!(matches!(second, Err(TransferError::Busy)));

        let first = first.await.expect("Failed while joining first submit");
        assert!(matches!(first, Ok(TransferOutcome::Success { .. })));
    }

    #[tokio::test]
    async fn invalid_amounts_are_rejected_pre_flight() {
        let bridge = ScriptedBridge::new(Vec::new(), success_envelope());
        let orch = orchestrator(
            bridge.clone(),
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );

        for amount in ["0", "-3", "abc", ""] {
            let result = orch
                .submit(request("Ethereum_Sepolia", "Base_Sepolia", amount))
                .await;
            assert!(matches!(result, Err(TransferError::Validation(_))));
        }
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn identical_chains_are_rejected_pre_flight() {
        let orch = orchestrator(
            ScriptedBridge::new(Vec::new(), success_envelope()),
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );
        let result = orch
            .submit(request("Base_Sepolia", "Base_Sepolia", "5"))
            .await;
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[tokio::test]
    async fn adapter_kind_mismatch_is_rejected_pre_flight() {
        let orch = orchestrator(
            ScriptedBridge::new(Vec::new(), success_envelope()),
            StubBalances::new("1000"),
            ScriptedWallet::new(WalletMode::Accept),
        );
        let mut bad = request("Ethereum_Sepolia", "Base_Sepolia", "5");
        bad.source_adapter = adapter_for("Solana_Devnet");
        let result = orch.submit(bad).await;
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[tokio::test]
    async fn amount_above_available_balance_is_rejected() {
        let orch = orchestrator(
            ScriptedBridge::new(Vec::new(), success_envelope()),
            StubBalances::new("10"),
            ScriptedWallet::new(WalletMode::Accept),
        );
        let result = orch
            .submit(request("Ethereum_Sepolia", "Base_Sepolia", "25"))
            .await;
        assert!(matches!(result, Err(TransferError::Validation(_))));
    }

    #[tokio::test]
    async fn reset_during_flight_discards_late_side_effects() {
        let bridge = ScriptedBridge::slow(
            vec![event("burn", "pending")],
            success_envelope(),
            Duration::from_millis(150),
        );
        let balances = StubBalances::new("1000");
        let orch = Arc::new(orchestrator(
            bridge,
            balances.clone(),
            ScriptedWallet::new(WalletMode::Accept),
        ));

        let inflight = {
            let orch = orch.clone();
            tokio::spawn(
                async move { orch.submit(request("Ethereum_Sepolia", "Base_Sepolia", "5")).await },
            )
        };
        sleep(Duration::from_millis(50)).await;
        orch.reset();

        let outcome = inflight
            .await
            .expect("Failed while joining submit")
            .expect("Failed while submitting transfer");

        // The protocol action still resolved, but the stale attempt must not
        // touch the cleared tracker or refresh balances.
        assert!(matches!(outcome, TransferOutcome::Success { .. }));
        assert_eq!(balances.refreshes.load(Ordering::SeqCst), 0);
        assert!(orch.logs().is_empty());
        assert_eq!(orch.current_step(), None);
    }
}
