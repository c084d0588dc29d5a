//! Bridge service integration module
//!
//! This module provides the client and types for interacting with the hosted
//! bridge API. The bridge custodies and burns USDC on the source chain and
//! mints it on the destination chain; its internal protocol (approval, burn,
//! attestation, mint) is opaque here and surfaces only as a stream of
//! progress events plus one terminal result envelope.

/// HTTP + WebSocket client for the bridge API
mod client;
/// Type definitions for bridge wire data
mod types;

pub use client::BridgeKitClient;
pub use types::*;

use tokio::sync::mpsc;

/// The single external call the orchestrator depends on, plus the startup
/// chain-catalog query.
///
/// Implemented by `BridgeKitClient` for the real service and by scripted
/// stubs in tests.
#[async_trait::async_trait]
pub trait BridgeService: Send + Sync {
    /// Fetch the catalog of chains the bridge can transfer between.
    async fn supported_chains(&self) -> Result<Vec<SupportedChain>, BridgeError>;

    /// Execute one transfer, emitting zero or more progress events into
    /// `events` before resolving with the final envelope.
    async fn execute(
        &self,
        request: &BridgeTransferRequest,
        events: mpsc::Sender<BridgeEvent>,
    ) -> Result<BridgeEnvelope, BridgeError>;
}

#[async_trait::async_trait]
impl BridgeService for BridgeKitClient {
    async fn supported_chains(&self) -> Result<Vec<SupportedChain>, BridgeError> {
        self.fetch_supported_chains().await
    }

    async fn execute(
        &self,
        request: &BridgeTransferRequest,
        events: mpsc::Sender<BridgeEvent>,
    ) -> Result<BridgeEnvelope, BridgeError> {
        self.run_transfer(request, events).await
    }
}
