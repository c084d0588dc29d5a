use crate::transfer::USDC_DECIMALS;

/// Parse a decimal string as a positive, finite amount.
///
/// Returns `None` for zero, negatives, and anything that does not parse.
pub fn parse_decimal_amount(amount: &str) -> Option<f64> {
    let value = amount.trim().parse::<f64>().ok()?;
    if value.is_finite() && value > 0.0 {
        Some(value)
    } else {
        None
    }
}

/// Format a decimal balance string for display, trimming trailing zeros.
pub fn format_balance(balance: &str) -> String {
    match balance.parse::<f64>() {
        Ok(value) => {
            let formatted = format!("{:.*}", USDC_DECIMALS as usize, value);
            let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
            trimmed.to_string()
        }
        Err(_) => balance.to_string(),
    }
}
