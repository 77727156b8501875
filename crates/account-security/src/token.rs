//! Opaque single-use tokens

use account_shared::constants::VERIFICATION_TOKEN_BYTES;
use rand::RngCore;

/// Random hex token used to prove control of an email address.
pub fn generate_verification_token() -> String {
    let mut bytes = [0u8; VERIFICATION_TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Exact, length-sensitive comparison that does not short-circuit on the
/// first differing byte.
pub fn tokens_match(supplied: &str, expected: &str) -> bool {
    let (a, b) = (supplied.as_bytes(), expected.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
