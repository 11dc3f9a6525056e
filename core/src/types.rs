//! Shared primitive types and formatting helpers used across the engine.

/// A stock-keeping unit identifier, e.g. "SKU-101".
pub type Sku = String;

/// Unix timestamp in whole seconds.
pub type UnixTime = i64;

/// Clamp a float into [low, high].
pub fn clamp(value: f64, low: f64, high: f64) -> f64 {
    value.max(low).min(high)
}

/// Round to `dp` decimal places. Used wherever a value crosses the wire.
pub fn round_dp(value: f64, dp: u32) -> f64 {
    let factor = 10f64.powi(dp as i32);
    (value * factor).round() / factor
}

/// Format a whole-dollar amount with thousands separators: 40800 -> "$40,800".
pub fn usd(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if negative {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Compact risk magnitude: "$12.3K" below one million, "$1.20M" above.
pub fn usd_compact(amount: f64) -> String {
    if amount < 1_000_000.0 {
        format!("${:.1}K", amount / 1_000.0)
    } else {
        format!("${:.2}M", amount / 1_000_000.0)
    }
}
