//! Session secret generation.
//!
//! The secret is `hex(SHA256(random_32_bytes || unix_nanos))`. It only needs
//! to be unpredictable enough for signing session cookies. Deployments that
//! need a stronger or stable secret set `SESSION_SECRET` explicitly.

use rand_core::{OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Generate a fresh 64-character hex session secret.
pub fn generate() -> String {
    let mut seed = [0u8; 32];
    OsRng.fill_bytes(&mut seed);

    let nanos = chrono::Utc::now()
        .timestamp_nanos_opt()
        .unwrap_or_default();

    let mut hasher = Sha256::new();
    hasher.update(seed);
    hasher.update(nanos.to_le_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_is_64_hex_chars() {
        let s = generate();
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn secrets_differ() {
        assert_ne!(generate(), generate());
    }
}
