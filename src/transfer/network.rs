//! Network synchronization for chain-specific wallet actions.
//!
//! Account-based (EVM) wallets hold one active network at a time; a
//! transaction for a different chain can not be signed until the wallet
//! switches. The `NetworkSynchronizer` makes the wallet's active network
//! match a required target chain before such an action proceeds, and
//! distinguishes a user decline from a wallet fault so callers can choose to
//! continue or abort. Solana-style chains carry their own wallet context and
//! never need alignment.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, info};

use crate::bridge::SupportedChain;

/// Why an alignment is being requested. Carried for logging only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlignmentReason {
    /// Aligning to the source chain before the approval/burn is signed.
    SourceEntry,
    /// Aligning to the destination chain while the mint phase runs.
    MintPhase,
}

/// Ephemeral request consumed by one alignment call.
#[derive(Debug, Clone)]
pub struct NetworkAlignmentRequest {
    pub target_chain_id: u64,
    pub reason: AlignmentReason,
}

/// Result of asking the wallet to switch networks.
#[derive(Debug, thiserror::Error)]
pub enum SwitchError {
    #[error("User declined the network switch")]
    Declined,

    #[error("Wallet error: {0}")]
    Wallet(String),
}

/// Errors surfaced by an alignment call.
#[derive(Debug, thiserror::Error)]
pub enum AlignError {
    #[error("User declined the network switch")]
    Declined,

    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Network switch timed out after {0:?}")]
    TimedOut(Duration),
}

/// Wallet-side network switch collaborator.
///
/// Suspends until the wallet confirms or rejects the switch. Implemented by
/// `RpcWalletClient` for injected wallets and by stubs in tests.
#[async_trait::async_trait]
pub trait WalletNetworkPort: Send + Sync {
    async fn switch_active_network(&self, chain_id: u64) -> Result<(), SwitchError>;
}

/// Ensures the wallet's active network matches a required target chain.
pub struct NetworkSynchronizer {
    wallet: Arc<dyn WalletNetworkPort>,
    /// Upper bound on how long a bounded alignment waits for the wallet prompt.
    prompt_timeout: Duration,
}

impl NetworkSynchronizer {
    pub fn new(wallet: Arc<dyn WalletNetworkPort>, prompt_timeout: Duration) -> Self {
        Self {
            wallet,
            prompt_timeout,
        }
    }

    /// Align the wallet's active network to `chain`.
    ///
    /// No-op for chains that do not use the account-based model. Suspends
    /// until the wallet confirms or rejects; a decline is a distinguished
    /// outcome, not a generic error.
    pub async fn align(
        &self,
        chain: &SupportedChain,
        reason: AlignmentReason,
    ) -> Result<(), AlignError> {
        if !chain.requires_alignment() {
            debug!("Chain {} needs no network alignment", chain.chain);
            return Ok(());
        }

        let Some(target_chain_id) = chain.chain_id else {
            return Err(AlignError::Wallet(format!(
                "Chain {} has no numeric chain id",
                chain.chain
            )));
        };

        self.execute(NetworkAlignmentRequest {
            target_chain_id,
            reason,
        })
        .await
    }

    /// Align with a bounded wait, so a wallet prompt the user ignores can
    /// not wedge the caller indefinitely.
    pub async fn align_bounded(
        &self,
        chain: &SupportedChain,
        reason: AlignmentReason,
    ) -> Result<(), AlignError> {
        match timeout(self.prompt_timeout, self.align(chain, reason)).await {
            Ok(result) => result,
            Err(_) => Err(AlignError::TimedOut(self.prompt_timeout)),
        }
    }

    async fn execute(&self, request: NetworkAlignmentRequest) -> Result<(), AlignError> {
        info!(
            "Aligning wallet network to chain id {} ({:?})",
            request.target_chain_id, request.reason
        );

        match self
            .wallet
            .switch_active_network(request.target_chain_id)
            .await
        {
            Ok(()) => {
                info!("Wallet switched to chain id {}", request.target_chain_id);
                Ok(())
            }
            Err(SwitchError::Declined) => Err(AlignError::Declined),
            Err(SwitchError::Wallet(message)) => Err(AlignError::Wallet(message)),
        }
    }
}
