//!
//! HTTP + WebSocket client for the hosted bridge API.
//!
//! This module provides an async client for driving a cross-chain transfer
//! through the bridge service. A transfer is created over HTTP, then a
//! WebSocket subscription streams per-step progress events until the service
//! publishes the final result envelope. All methods are async and designed
//! for use with Tokio.

use super::types::*;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, error, info, warn};

/// One frame on the transfer event stream: either a progress event or the
/// terminal result envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransferStreamFrame {
	Result { result: BridgeEnvelope },
	Event(BridgeEvent),
}

/// Bridge API client
#[derive(Clone)]
pub struct BridgeKitClient {
	/// The underlying HTTP client for REST calls.
	http_client: Client,
	/// The base URL for the bridge HTTP API.
	api_url: String,
	/// The WebSocket base URL for transfer event subscriptions.
	ws_url: String,
}

impl BridgeKitClient {
	/// Create a new bridge client.
	///
	/// # Arguments
	/// * `api_url` - The base URL of the bridge HTTP API.
	/// * `ws_url` - The base URL of the bridge WebSocket endpoint.
	pub fn new(api_url: String, ws_url: String) -> Self {
		let http_client = Client::builder()
			.timeout(Duration::from_secs(30))
			.build()
			.expect("Failed to create HTTP client");

		Self {
			http_client,
			api_url,
			ws_url,
		}
	}

	/// Fetch the catalog of chains the bridge can transfer between.
	///
	/// # Returns
	/// The raw, unfiltered chain list, or a `BridgeError` if the call fails.
	pub async fn fetch_supported_chains(&self) -> Result<Vec<SupportedChain>, BridgeError> {
		let url = format!("{}/v1/chains", self.api_url);
		debug!("Fetching supported chains from {}", url);

		let response: serde_json::Value =
			self.http_client.get(&url).send().await?.json().await?;

		// The API wraps the list in {"chains": [...]}; accept a bare array too.
		let chains_value = response
			.get("chains")
			.cloned()
			.unwrap_or(response);

		let chains: Vec<SupportedChain> = serde_json::from_value(chains_value)?;
		info!("Bridge reports {} supported chains", chains.len());
		Ok(chains)
	}

	/// Create a transfer on the bridge API.
	///
	/// # Arguments
	/// * `request` - The transfer parameters.
	///
	/// # Returns
	/// The server-assigned transfer id, or a `BridgeError` if creation fails.
	async fn create_transfer(&self, request: &BridgeTransferRequest) -> Result<String, BridgeError> {
		let url = format!("{}/v1/transfers", self.api_url);

		let body = json!({
			"fromChain": request.from_chain,
			"toChain": request.to_chain,
			"amount": request.amount,
			"fromAddress": request.from_address,
			"toAddress": request.to_address,
			"idempotencyKey": idempotency_key(),
		});

		let response: serde_json::Value = self
			.http_client
			.post(&url)
			.json(&body)
			.send()
			.await?
			.json()
			.await?;

		if let Some(message) = response
			.get("error")
			.and_then(|e| e.get("message"))
			.and_then(|m| m.as_str())
		{
			return Err(BridgeError::Api(message.to_string()));
		}

		let transfer_id = response
			.get("transferId")
			.and_then(|id| id.as_str())
			.ok_or(BridgeError::NoData)?
			.to_string();

		info!("Created bridge transfer {}", transfer_id);
		Ok(transfer_id)
	}

	/// Drive one transfer to completion, forwarding progress events.
	///
	/// Events are pushed into `events` as they arrive; a dropped receiver is
	/// tolerated and never fails the transfer. The call resolves when the
	/// service publishes its result frame.
	///
	/// # Errors
	/// Returns `BridgeError` if creation, the WebSocket connection, or the
	/// subscription fails, or if the stream closes before a result frame.
	pub async fn run_transfer(
		&self,
		request: &BridgeTransferRequest,
		events: mpsc::Sender<BridgeEvent>,
	) -> Result<BridgeEnvelope, BridgeError> {
		let transfer_id = self.create_transfer(request).await?;

		let stream_url = format!("{}/v1/transfers/{}/events", self.ws_url, transfer_id);
		debug!("Attempting WebSocket connection to: {}", stream_url);

		let (ws_stream, response) = connect_async(stream_url.as_str()).await?;
		debug!(
			"WebSocket connection established, response status: {}",
			response.status()
		);
		let (mut ws_sender, mut ws_receiver) = ws_stream.split();

		while let Some(message) = ws_receiver.next().await {
			match message? {
				Message::Text(text) => match serde_json::from_str::<TransferStreamFrame>(&text) {
					Ok(TransferStreamFrame::Result { result }) => {
						info!(
							"Transfer {} resolved (ok={})",
							transfer_id, result.ok
						);
						return Ok(result);
					}
					Ok(TransferStreamFrame::Event(event)) => {
						debug!("Received bridge event: {:?}", event);
						if events.send(event).await.is_err() {
							// Receiver went away; keep draining until the result frame.
							warn!("Event receiver dropped for transfer {}", transfer_id);
						}
					}
					Err(e) => {
						error!("Failed to deserialize transfer frame: {}", e);
						error!("Raw frame was: {}", text);
					}
				},
				Message::Ping(payload) => {
					ws_sender.send(Message::Pong(payload)).await?;
				}
				Message::Close(_) => {
					debug!("Transfer event stream closed by server");
					break;
				}
				_ => {}
			}
		}

		Err(BridgeError::StreamEnded)
	}
}

/// Random hex key attached to transfer creation so retries are safe.
fn idempotency_key() -> String {
	let mut bytes = [0u8; 16];
	rand::rng().fill(&mut bytes);
	hex::encode(bytes)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn idempotency_keys_are_unique_hex() {
		let first = idempotency_key();
		let second = idempotency_key();
		assert_eq!(first.len(), 32);
		assert!(first.chars().all(|c| c.is_ascii_hexdigit()));
		assert_ne!(first, second);
	}

	#[test]
	fn stream_frame_distinguishes_result_from_event() {
		let frame: TransferStreamFrame =
			serde_json::from_str(r#"{"result":{"ok":true,"data":"{}"}}"#)
				.expect("Failed while parsing result frame");
		assert!(matches!(frame, TransferStreamFrame::Result { .. }));

		let frame: TransferStreamFrame =
			serde_json::from_str(r#"{"method":"burn","values":{"state":"pending"}}"#)
				.expect("Failed while parsing event frame");
		match frame {
			TransferStreamFrame::Event(event) => {
				assert_eq!(event.method, "burn");
				assert_eq!(event.values.state.as_deref(), Some("pending"));
			}
			TransferStreamFrame::Result { .. } => panic!("expected event frame"),
		}
	}
}
