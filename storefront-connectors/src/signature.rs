//! Callback signature verification.
//!
//! The gateway signs each notification with
//! `SHA512(order_id + status_code + gross_amount + server_key)`, hex encoded.

use sha2::{Digest, Sha512};

/// Compute the expected signature for a notification.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Check a notification's `signature_key` against the server key.
///
/// Comparison is case-insensitive and does not short-circuit on the first
/// differing byte.
pub fn verify_notification(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    signature_key: &str,
    server_key: &str,
) -> bool {
    let expected = notification_signature(order_id, status_code, gross_amount, server_key);
    let given = signature_key.to_ascii_lowercase();

    if expected.len() != given.len() {
        return false;
    }
    expected
        .bytes()
        .zip(given.bytes())
        .fold(0u8, |diff, (a, b)| diff | (a ^ b))
        == 0
}
