//! Gateway callback authenticity check.
//!
//! The gateway signs `order_id|payment_id` with HMAC-SHA256 keyed by the account
//! secret and hands the lowercase hex digest to the browser, which relays it to us.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn mac_for(order_id: &str, payment_id: &str, secret: &str) -> Option<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());
    Some(mac)
}

/// Hex signature for `order_id|payment_id`. Empty if the key is unusable.
pub fn sign(order_id: &str, payment_id: &str, secret: &str) -> String {
    mac_for(order_id, payment_id, secret)
        .map(|mac| hex::encode(mac.finalize().into_bytes()))
        .unwrap_or_default()
}

/// Constant-time check of a relayed signature. Malformed input is simply not authentic.
pub fn verify(order_id: &str, payment_id: &str, provided_signature: &str, secret: &str) -> bool {
    if order_id.is_empty() || payment_id.is_empty() || secret.is_empty() {
        return false;
    }
    let Ok(provided) = hex::decode(provided_signature.trim()) else {
        return false;
    };
    match mac_for(order_id, payment_id, secret) {
        Some(mac) => mac.verify_slice(&provided).is_ok(),
        None => false,
    }
}
