//!
//! USDC balance collaborator.
//!
//! Balances are fetched from the bridge API's balances endpoint and cached
//! per (chain, address) pair. `balance` serves from cache when possible so
//! the presentation layer can poll cheaply; `refresh` always refetches and
//! repopulates the cache, and is invoked by the orchestrator after a
//! successful transfer so the debited balance shows up.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use reqwest::Client;
use tracing::debug;

use crate::bridge::SupportedChain;
use crate::wallet::AccountAdapter;

/// Error types for balance fetching
#[derive(Debug, thiserror::Error)]
pub enum BalanceError {
	#[error("HTTP error: {0}")]
	HttpError(#[from] reqwest::Error),

	#[error("No balance returned")]
	NoData,
}

/// Balance collaborator consumed by the orchestrator and the presentation
/// layer. Amounts are decimal strings as reported by the service.
#[async_trait::async_trait]
pub trait UsdcBalancePort: Send + Sync {
	/// Current balance, served from cache when available.
	async fn balance(
		&self,
		chain: &SupportedChain,
		wallet: &dyn AccountAdapter,
	) -> Result<String, BalanceError>;

	/// Refetch the balance, bypassing and repopulating the cache.
	async fn refresh(
		&self,
		chain: &SupportedChain,
		wallet: &dyn AccountAdapter,
	) -> Result<String, BalanceError>;
}

/// HTTP balance client with a per-(chain, address) cache.
pub struct UsdcBalanceClient {
	http_client: Client,
	api_url: String,
	cache: Mutex<HashMap<String, String>>,
}

impl UsdcBalanceClient {
	pub fn new(api_url: String) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			api_url,
			cache: Mutex::new(HashMap::new()),
		}
	}

	fn cache_key(chain: &SupportedChain, wallet: &dyn AccountAdapter) -> String {
		format!("{}:{}", chain.chain, wallet.address())
	}

	async fn fetch(
		&self,
		chain: &SupportedChain,
		wallet: &dyn AccountAdapter,
	) -> Result<String, BalanceError> {
		let url = format!("{}/v1/balances", self.api_url);
		let response: serde_json::Value = self
			.http_client
			.get(&url)
			.query(&[("chain", chain.chain.as_str()), ("address", wallet.address())])
			.send()
			.await?
			.json()
			.await?;

		let balance = response
			.get("balance")
			.and_then(|b| b.as_str())
			.ok_or(BalanceError::NoData)?
			.to_string();

		debug!(
			"Balance for {} on {}: {} USDC",
			wallet.address(),
			chain.chain,
			balance
		);
		Ok(balance)
	}
}

#[async_trait::async_trait]
impl UsdcBalancePort for UsdcBalanceClient {
	async fn balance(
		&self,
		chain: &SupportedChain,
		wallet: &dyn AccountAdapter,
	) -> Result<String, BalanceError> {
		let key = Self::cache_key(chain, wallet);
		if let Some(cached) = self.cache.lock().unwrap().get(&key) {
			return Ok(cached.clone());
		}

		let balance = self.fetch(chain, wallet).await?;
		self.cache.lock().unwrap().insert(key, balance.clone());
		Ok(balance)
	}

	async fn refresh(
		&self,
		chain: &SupportedChain,
		wallet: &dyn AccountAdapter,
	) -> Result<String, BalanceError> {
		let balance = self.fetch(chain, wallet).await?;
		self.cache
			.lock()
			.unwrap()
			.insert(Self::cache_key(chain, wallet), balance.clone());
		Ok(balance)
	}
}
