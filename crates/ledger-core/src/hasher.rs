//! Content hash over a block's canonical fields.
//!
//! The canonical text is the plain concatenation of index, transactions,
//! timestamp, previous hash and nonce with no separators. Chains already on
//! disk were hashed with exactly this rendering, so changing field order or
//! number formatting here is a breaking format change.

use sha2::{Digest, Sha256};

/// SHA-256 of the canonical text, as lowercase hex.
pub fn digest(
    index: u64,
    transactions: &str,
    timestamp: f64,
    previous_hash: &str,
    nonce: u64,
) -> String {
    let canonical = format!(
        "{index}{transactions}{}{previous_hash}{nonce}",
        canonical_seconds(timestamp)
    );
    hex::encode(Sha256::digest(canonical.as_bytes()))
}

/// Renders seconds as the shortest round-tripping decimal, always with a
/// fractional part (`1700000000.0`), falling back to exponent form
/// (`1e+16`, `1.5e-05`) outside `1e-4 <= |x| < 1e16`.
pub fn canonical_seconds(seconds: f64) -> String {
    if seconds.is_nan() {
        return "nan".to_string();
    }
    if seconds.is_infinite() {
        return if seconds > 0.0 { "inf" } else { "-inf" }.to_string();
    }

    // `{:e}` yields the shortest digits, e.g. "1.5e-5" or "0e0".
    let scientific = format!("{seconds:e}");
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((&scientific, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if seconds == 0.0 || (-4..16).contains(&exponent) {
        let mut plain = seconds.to_string();
        if !plain.contains('.') {
            plain.push_str(".0");
        }
        plain
    } else {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{mantissa}e{sign}{:02}", exponent.abs())
    }
}
