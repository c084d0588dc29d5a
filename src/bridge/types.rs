//! Types for the hosted bridge API: progress events, result envelopes, and
//! the supported-chain catalog.

use serde::{Deserialize, Serialize};

/// One entry of the bridge's supported-chain catalog.
///
/// This struct represents a chain as returned by the bridge API, including its
/// stable identifier, display name, numeric chain id (EVM chains only),
/// testnet flag, and transaction-model kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportedChain {
    /// Stable chain identifier used in transfer requests (e.g. "Ethereum_Sepolia").
    pub chain: String,
    /// Optional human-readable display name.
    pub name: Option<String>,
    /// Numeric chain id for account-based (EVM) chains. Absent for Solana.
    #[serde(rename = "chainId")]
    pub chain_id: Option<u64>,
    /// Whether this chain is a testnet.
    #[serde(rename = "isTestnet", default)]
    pub is_testnet: bool,
    /// Whether this chain uses the account-based (EVM) transaction model.
    #[serde(rename = "kindIsEvm", default)]
    pub kind_is_evm: bool,
}

impl SupportedChain {
    /// Whether signing on this chain requires the wallet's active network to
    /// match it. Solana-style chains carry their own wallet context and never do.
    pub fn requires_alignment(&self) -> bool {
        self.kind_is_evm
    }

    /// Display name, falling back to the stable identifier.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.chain)
    }
}

/// Read-only catalog of chains available for transfers.
///
/// Built once at startup from the bridge API and treated as reference data
/// for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct ChainCatalog {
    chains: Vec<SupportedChain>,
}

impl ChainCatalog {
    pub fn new(chains: Vec<SupportedChain>) -> Self {
        Self { chains }
    }

    /// Keep only testnet entries, as the demo environment requires.
    pub fn testnets(chains: Vec<SupportedChain>) -> Self {
        Self::new(chains.into_iter().filter(|c| c.is_testnet).collect())
    }

    /// Look up a chain by its stable identifier.
    pub fn find(&self, chain: &str) -> Option<&SupportedChain> {
        self.chains.iter().find(|c| c.chain == chain)
    }

    pub fn chains(&self) -> &[SupportedChain] {
        &self.chains
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

/// Values attached to a progress event.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BridgeEventValues {
    /// Reported state of the step ("pending", "success", "error", ...).
    #[serde(default)]
    pub state: Option<String>,
    /// Error message when the step failed.
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

/// A raw progress event emitted by the bridge while a transfer executes.
///
/// The payload is polymorphic on `method`; everything else is free-form.
/// Recognition of method names happens at the normalizer boundary, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeEvent {
    /// Protocol method this event belongs to ("approve", "burn", "mint", ...).
    pub method: String,
    /// Free-form per-step values.
    #[serde(default)]
    pub values: BridgeEventValues,
}

/// Final envelope returned when the bridge call resolves.
///
/// `data` is opaque at this boundary: it may be a JSON-encoded string
/// requiring one parse, or an already-structured value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeEnvelope {
    pub ok: bool,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Decoded form of the envelope's `data` payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResult {
    /// Overall transfer state as reported by the protocol.
    #[serde(default)]
    pub state: Option<String>,
    /// Per-step reports in protocol order.
    #[serde(default)]
    pub steps: Vec<BridgeResultStep>,
}

/// One per-step report inside the decoded result payload.
#[derive(Debug, Clone, Deserialize)]
pub struct BridgeResultStep {
    #[serde(default)]
    pub state: String,
    #[serde(rename = "errorMessage", default)]
    pub error_message: Option<String>,
}

/// Request body for creating a transfer on the bridge API.
#[derive(Debug, Clone, Serialize)]
pub struct BridgeTransferRequest {
    #[serde(rename = "fromChain")]
    pub from_chain: String,
    #[serde(rename = "toChain")]
    pub to_chain: String,
    /// Decimal string amount of USDC to move.
    pub amount: String,
    #[serde(rename = "fromAddress")]
    pub from_address: String,
    #[serde(rename = "toAddress")]
    pub to_address: String,
}

/// Error types for bridge API operations
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    #[error("Bridge API error: {0}")]
    Api(String),

    #[error("No data returned")]
    NoData,

    #[error("WebSocket error: {0}")]
    WebSocketError(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Transfer stream ended without a result")]
    StreamEnded,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(id: &str, testnet: bool) -> SupportedChain {
        SupportedChain {
            chain: id.to_string(),
            name: None,
            chain_id: Some(1),
            is_testnet: testnet,
            kind_is_evm: true,
        }
    }

    #[test]
    fn catalog_testnet_filter_drops_mainnets() {
        let catalog = ChainCatalog::testnets(vec![
            chain("Ethereum", false),
            chain("Ethereum_Sepolia", true),
            chain("Base_Sepolia", true),
        ]);
        assert_eq!(catalog.chains().len(), 2);
        assert!(catalog.find("Ethereum").is_none());
        assert!(catalog.find("Base_Sepolia").is_some());
    }

    #[test]
    fn supported_chain_deserializes_wire_names() {
        let parsed: SupportedChain = serde_json::from_str(
            r#"{"chain":"Base_Sepolia","name":"Base Sepolia","chainId":84532,"isTestnet":true,"kindIsEvm":true}"#,
        )
        .expect("Failed while parsing SupportedChain");
        assert_eq!(parsed.chain_id, Some(84532));
        assert!(parsed.requires_alignment());
        assert_eq!(parsed.display_name(), "Base Sepolia");
    }

    #[test]
    fn solana_chain_never_requires_alignment() {
        let parsed: SupportedChain = serde_json::from_str(
            r#"{"chain":"Solana_Devnet","isTestnet":true,"kindIsEvm":false}"#,
        )
        .expect("Failed while parsing SupportedChain");
        assert_eq!(parsed.chain_id, None);
        assert!(!parsed.requires_alignment());
        assert_eq!(parsed.display_name(), "Solana_Devnet");
    }

    #[test]
    fn event_tolerates_missing_values() {
        let parsed: BridgeEvent =
            serde_json::from_str(r#"{"method":"mint"}"#).expect("Failed while parsing BridgeEvent");
        assert_eq!(parsed.method, "mint");
        assert_eq!(parsed.values.state, None);
    }
}
