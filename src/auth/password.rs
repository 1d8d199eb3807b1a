use argon2::Config;
use rand::{thread_rng, RngCore};

use crate::{StoreError, StoreResult};

const SALT_LEN: usize = 16;

/// Hashes a password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> StoreResult<String> {
    let mut salt = [0u8; SALT_LEN];
    thread_rng().fill_bytes(&mut salt);
    argon2::hash_encoded(password.as_bytes(), &salt, &Config::default())
        .map_err(|e| StoreError::Internal(format!("password hashing failed: {e}")))
}

/// Checks `password` against an encoded Argon2 hash. Malformed hashes never match.
pub fn verify_password(encoded: &str, password: &str) -> bool {
    argon2::verify_encoded(encoded, password.as_bytes()).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verifies_only_the_original_password() {
        let hash = hash_password("s3cret").unwrap();
        assert!(verify_password(&hash, "s3cret"));
        assert!(!verify_password(&hash, "S3cret"));
    }

    #[test]
    fn salts_differ_between_hashes() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn malformed_hash_is_rejected() {
        assert!(!verify_password("not-a-hash", "anything"));
    }
}
