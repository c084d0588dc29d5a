//! Cross-chain Transfer Module
//!
//! This module provides all the core logic for driving one USDC transfer
//! between chains through the external bridge protocol. It is composed of
//! several submodules, each responsible for a specific aspect of an attempt:
//!
//! - `orchestrator`: The main entry point and coordinator for a transfer. It wires together the bridge call, progress tracking, and network alignment.
//! - `events`: Maps the bridge's raw progress events into the closed set of transfer steps and states.
//! - `progress`: Folds normalized events into the current-step pointer and the human-readable log.
//! - `network`: Keeps the wallet's active network aligned with the chain a signature is needed on.
//! - `types`: The request, outcome, and error types shared across the module.
//!
//! The orchestrator coordinates one attempt at a time: it validates the
//! request, aligns the source network, routes the bridge's event stream, and
//! classifies the terminal envelope into exactly one outcome.

/// Event normalization for bridge progress events
pub mod events;
/// Wallet network alignment
pub mod network;
/// Main coordinator for one transfer attempt
pub mod orchestrator;
/// Step pointer and log tracking
pub mod progress;
/// Request, outcome, and error types
pub mod types;

pub use orchestrator::*;
pub use types::*;

/// Number of decimal places for USDC.
pub const USDC_DECIMALS: u32 = 6;
