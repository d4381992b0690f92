//! Cryptographic utilities for share links, payment references and webhook signatures.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Alphabet for share ids: URL-safe, without look-alike characters.
const SHARE_ID_CHARSET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";

/// Length of a generated form share id.
pub const SHARE_ID_LENGTH: usize = 12;

/// Prefix for payment references handed to the payment gateway.
pub const PAYMENT_REFERENCE_PREFIX: &str = "fl_sub_";

/// Generate a random share id used in public form links.
pub fn generate_share_id() -> String {
    let mut rng = rand::thread_rng();

    (0..SHARE_ID_LENGTH)
        .map(|_| {
            let idx = rng.gen_range(0..SHARE_ID_CHARSET.len());
            SHARE_ID_CHARSET[idx] as char
        })
        .collect()
}

/// Generate a unique payment reference (16 random bytes, hex encoded).
pub fn generate_payment_reference() -> String {
    let bytes: [u8; 16] = rand::thread_rng().gen();
    format!("{}{}", PAYMENT_REFERENCE_PREFIX, hex::encode(bytes))
}

/// Sign a payload with HMAC-SHA512 and return the hex digest.
pub fn hmac_sha512_hex(secret: &str, payload: &[u8]) -> Result<String, String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes()).map_err(|e| e.to_string())?;
    mac.update(payload);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Verify a hex HMAC-SHA512 signature in constant time.
pub fn verify_hmac_sha512(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(expected) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let Ok(mut mac) = HmacSha512::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    mac.verify_slice(&expected).is_ok()
}
