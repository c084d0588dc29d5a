//!
//! Utility module for amount handling.
//!
//! Re-exports parsing and formatting helpers for use throughout the codebase.
/// Utility functions for parsing and display
pub mod index;

pub use index::{format_balance, parse_decimal_amount};
