//! Symmetric key lifecycle.

use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::{Arc, Mutex};

use crate::error::{SecurityError, SecurityResult};
use crate::storage::LocalStore;

const STORE_KEY: &str = "security.encryption_key";

/// Process-wide AES-256 key with lazy load-or-generate initialization.
///
/// First use loads persisted raw key bytes (hex) from the local store; if
/// none exist, a fresh 256-bit key is generated and its hex encoding
/// persisted before use. Init happens at most once per process; the key is
/// never rotated.
pub struct EncryptionKey {
    store: Arc<LocalStore>,
    cached: Mutex<Option<[u8; 32]>>,
}

impl EncryptionKey {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            store,
            cached: Mutex::new(None),
        }
    }

    /// The key bytes, initializing on first call.
    ///
    /// A persist failure during generation is an error: handing out a key
    /// that will not survive restart would silently orphan every ciphertext
    /// produced with it.
    pub fn bytes(&self) -> SecurityResult<[u8; 32]> {
        let mut cached = self.cached.lock().expect("key mutex poisoned");
        if let Some(key) = *cached {
            return Ok(key);
        }

        let key = match self.store.get::<String>(STORE_KEY) {
            Some(hex_key) => {
                let raw = hex::decode(&hex_key).map_err(|e| {
                    SecurityError::KeyUnavailable(format!("persisted key is not hex: {e}"))
                })?;
                let key: [u8; 32] = raw.try_into().map_err(|_| {
                    SecurityError::KeyUnavailable("persisted key has wrong length".into())
                })?;
                tracing::debug!("Loaded persisted encryption key");
                key
            }
            None => {
                let mut key = [0u8; 32];
                OsRng.fill_bytes(&mut key);
                self.store
                    .put(STORE_KEY, &hex::encode(key))
                    .map_err(|e| SecurityError::KeyUnavailable(format!("cannot persist key: {e}")))?;
                tracing::info!("Generated new encryption key");
                key
            }
        };

        *cached = Some(key);
        Ok(key)
    }
}
