//! Salted password hashing.
//!
//! Reproduces the stored format `<hex sha256(password‖salt)>.<salt>` for
//! compatibility with existing hashes. Plain salted SHA-256 is NOT a
//! memory-hard password hash: any production deployment must migrate to
//! Argon2id (or scrypt) with a constant-time comparison before protecting
//! real secrets. Kept as-is here because stored hashes must keep verifying.

use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

const SALT_BYTES: usize = 16;

/// Hash `password` with `salt`, generating a random salt when none is given.
///
/// Output format is `<hexHash>.<salt>`.
pub fn hash_password(password: &str, salt: Option<&str>) -> String {
    let salt = match salt {
        Some(s) => s.to_string(),
        None => generate_salt(),
    };
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    hasher.update(salt.as_bytes());
    format!("{}.{salt}", hex::encode(hasher.finalize()))
}

/// Verify `password` against a stored `<hexHash>.<salt>` string.
///
/// Malformed stored values (no separator) never verify.
pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((_, salt)) = stored.split_once('.') else {
        return false;
    };
    hash_password(password, Some(salt)) == stored
}

fn generate_salt() -> String {
    let mut bytes = [0u8; SALT_BYTES];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
