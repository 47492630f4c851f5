//! Data protection: symmetric encryption and password hashing.
//!
//! # Design Decisions
//! - One AES-256-GCM key per process, lazily loaded or generated
//! - Ciphertext tokens are self-contained (IV travels with the payload)
//! - Failures propagate; callers decide whether to audit and re-raise

pub mod cipher;
pub mod keys;
pub mod password;

pub use cipher::DataCipher;
pub use keys::EncryptionKey;
pub use password::{hash_password, verify_password};
