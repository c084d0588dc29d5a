mod bridge;
mod transfer;
mod utils;
mod wallet;

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::bridge::{BridgeKitClient, BridgeService, ChainCatalog};
use crate::transfer::{
	OrchestratorConfig, TransferOrchestrator, TransferOutcome, TransferRequest,
};
use crate::utils::format_balance;
use crate::wallet::{
	AccountAdapter, EvmAccountAdapter, RpcWalletClient, SolanaAccountAdapter, UsdcBalanceClient,
	UsdcBalancePort,
};

fn env_or(name: &str, default: &str) -> String {
	std::env::var(name).unwrap_or_else(|_| default.to_string())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::from_default_env()
				.add_directive("usdc_bridge_orchestrator=debug".parse().unwrap())
				.add_directive(tracing::Level::INFO.into()),
		)
		.with_target(false)
		.with_thread_ids(false)
		.with_thread_names(false)
		.with_file(false)
		.with_line_number(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.init();

	info!("Starting bridge transfer service");

	let api_url = env_or("BRIDGE_API_URL", "https://bridge.circle-sandbox.com/api");
	let ws_url = env_or("BRIDGE_WS_URL", "wss://bridge.circle-sandbox.com/api");
	let wallet_rpc_url = env_or("WALLET_RPC_URL", "http://localhost:8545");

	let source_chain = env_or("SOURCE_CHAIN", "Ethereum_Sepolia");
	let destination_chain = env_or("DESTINATION_CHAIN", "Base_Sepolia");
	let amount = env_or("AMOUNT", "1");

	let evm_address = env_or("EVM_ADDRESS", "");
	let solana_address = env_or("SOLANA_ADDRESS", "");

	let client = BridgeKitClient::new(api_url.clone(), ws_url);
	info!("Created bridge client for {}", api_url);

	let all_chains = match client.supported_chains().await {
		Ok(chains) => chains,
		Err(e) => {
			error!("Failed to load supported chains: {:?}", e);
			return;
		}
	};

	// Demo environment runs against testnets only.
	let catalog = ChainCatalog::testnets(all_chains);
	if catalog.is_empty() {
		error!("Bridge reports no testnet chains; nothing to transfer on");
		return;
	}
	for chain in catalog.chains() {
		info!("Available chain: {} ({})", chain.display_name(), chain.chain);
	}

	let adapter_for = |chain_id: &str| -> Option<Arc<dyn AccountAdapter>> {
		let chain = catalog.find(chain_id)?;
		if chain.kind_is_evm {
			if evm_address.is_empty() {
				warn!("No EVM_ADDRESS configured for chain {}", chain_id);
				return None;
			}
			Some(Arc::new(EvmAccountAdapter::new(evm_address.clone())))
		} else {
			if solana_address.is_empty() {
				warn!("No SOLANA_ADDRESS configured for chain {}", chain_id);
				return None;
			}
			Some(Arc::new(SolanaAccountAdapter::new(solana_address.clone())))
		}
	};

	let (Some(source_adapter), Some(destination_adapter)) =
		(adapter_for(&source_chain), adapter_for(&destination_chain))
	else {
		error!("Missing wallet address for the requested chains");
		return;
	};

	let balances = Arc::new(UsdcBalanceClient::new(api_url));
	let wallet = Arc::new(RpcWalletClient::new(wallet_rpc_url));

	let orchestrator = TransferOrchestrator::new(
		Arc::new(client),
		balances.clone(),
		wallet,
		catalog,
		OrchestratorConfig::default(),
	);

	if let Some(source) = orchestrator.catalog().find(&source_chain) {
		match balances.balance(source, source_adapter.as_ref()).await {
			Ok(balance) => info!(
				"{} USDC available on {}",
				format_balance(&balance),
				source.display_name()
			),
			Err(e) => warn!("Could not read source balance: {}", e),
		}
	}

	info!(
		"Bridging {} USDC from {} to {}",
		amount, source_chain, destination_chain
	);

	let request = TransferRequest {
		source_chain,
		destination_chain,
		amount,
		source_adapter,
		destination_adapter,
	};

	match orchestrator.submit(request).await {
		Ok(TransferOutcome::Success { settled_amount }) => {
			info!("Bridge completed: {} USDC settled", settled_amount);
		}
		Ok(TransferOutcome::Failure { reason }) => {
			error!("Bridge failed: {}", reason);
		}
		Err(e) => {
			error!("Transfer did not start: {}", e);
		}
	}

	for entry in orchestrator.logs() {
		info!("[{}] {}", entry.at.format("%H:%M:%S"), entry.message);
	}
	info!("Final step: {:?}", orchestrator.current_step());

	// Clear local tracking state; the protocol action, if any is still
	// running, resolves on its own and its late events are discarded.
	orchestrator.reset();
}
