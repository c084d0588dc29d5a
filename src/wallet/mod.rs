//! Wallet-side collaborators: account adapters, the network-switch RPC
//! client, and USDC balance fetching.

pub mod balance;
pub mod rpc;

pub use balance::{BalanceError, UsdcBalanceClient, UsdcBalancePort};
pub use rpc::RpcWalletClient;

/// The two wallet families a transfer can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletKind {
	/// Account-based wallet with one active network at a time.
	Evm,
	/// Solana wallet; carries its own network context.
	Solana,
}

/// Handle to a connected account on one side of a transfer.
pub trait AccountAdapter: Send + Sync {
	fn address(&self) -> &str;
	fn kind(&self) -> WalletKind;
}

/// Adapter for an account-based (EVM) wallet.
pub struct EvmAccountAdapter {
	address: String,
}

impl EvmAccountAdapter {
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
		}
	}
}

impl AccountAdapter for EvmAccountAdapter {
	fn address(&self) -> &str {
		&self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::Evm
	}
}

/// Adapter for a Solana wallet.
pub struct SolanaAccountAdapter {
	address: String,
}

impl SolanaAccountAdapter {
	pub fn new(address: impl Into<String>) -> Self {
		Self {
			address: address.into(),
		}
	}
}

impl AccountAdapter for SolanaAccountAdapter {
	fn address(&self) -> &str {
		&self.address
	}

	fn kind(&self) -> WalletKind {
		WalletKind::Solana
	}
}
