//!
//! JSON-RPC client for the injected wallet's network-switch surface.
//!
//! Speaks EIP-3326 `wallet_switchEthereumChain` against a wallet RPC
//! endpoint. The EIP-1193 user-rejection code (4001) is mapped to a
//! distinguished decline so callers can tell "the user said no" apart from
//! a wallet fault.

use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::transfer::network::{SwitchError, WalletNetworkPort};

/// EIP-1193 userRejectedRequest error code.
const USER_REJECTED_REQUEST: i64 = 4001;

/// Wallet RPC client for network switching
#[derive(Clone)]
pub struct RpcWalletClient {
	http_client: Client,
	/// The wallet's JSON-RPC endpoint.
	rpc_url: String,
}

impl RpcWalletClient {
	pub fn new(rpc_url: String) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(120))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			rpc_url,
		}
	}
}

#[async_trait::async_trait]
impl WalletNetworkPort for RpcWalletClient {
	async fn switch_active_network(&self, chain_id: u64) -> Result<(), SwitchError> {
		let body = json!({
			"jsonrpc": "2.0",
			"id": 1,
			"method": "wallet_switchEthereumChain",
			"params": [{ "chainId": format!("0x{:x}", chain_id) }],
		});

		debug!("Requesting wallet switch to chain id {}", chain_id);

		let response: serde_json::Value = self
			.http_client
			.post(&self.rpc_url)
			.json(&body)
			.send()
			.await
			.map_err(|e| SwitchError::Wallet(e.to_string()))?
			.json()
			.await
			.map_err(|e| SwitchError::Wallet(e.to_string()))?;

		if let Some(error) = response.get("error") {
			let code = error.get("code").and_then(|c| c.as_i64());
			if code == Some(USER_REJECTED_REQUEST) {
				return Err(SwitchError::Declined);
			}
			let message = error
				.get("message")
				.and_then(|m| m.as_str())
				.unwrap_or("Unknown wallet error");
			return Err(SwitchError::Wallet(message.to_string()));
		}

		Ok(())
	}
}
