//! Authenticated encryption of opaque strings.

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;

use crate::crypto::keys::EncryptionKey;
use crate::error::{SecurityError, SecurityResult};
use crate::storage::LocalStore;

/// AES-GCM IV length in bytes (96 bits).
const IV_LEN: usize = 12;

/// Encrypts and decrypts sensitive values under the process key.
///
/// Tokens are `base64(IV ‖ ciphertext‖tag)`. Every encryption draws an
/// independent random IV; reusing an IV under the same key breaks GCM, so
/// IVs are never derived from the payload or a counter.
pub struct DataCipher {
    key: EncryptionKey,
}

impl DataCipher {
    pub fn new(store: Arc<LocalStore>) -> Self {
        Self {
            key: EncryptionKey::new(store),
        }
    }

    fn cipher(&self) -> SecurityResult<Aes256Gcm> {
        let bytes = self.key.bytes()?;
        Ok(Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&bytes)))
    }

    /// Encrypt `plaintext`, returning a self-contained ciphertext token.
    pub fn encrypt(&self, plaintext: &str) -> SecurityResult<String> {
        let cipher = self.cipher()?;

        let mut iv = [0u8; IV_LEN];
        OsRng.fill_bytes(&mut iv);

        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&iv), plaintext.as_bytes())
            .map_err(|_| SecurityError::Crypto("encryption failed".into()))?;

        let mut token = Vec::with_capacity(IV_LEN + ciphertext.len());
        token.extend_from_slice(&iv);
        token.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(token))
    }

    /// Decrypt a token produced by [`encrypt`](Self::encrypt).
    ///
    /// Fails on malformed input or when the authentication tag does not
    /// verify; altered ciphertext is never returned as plaintext.
    pub fn decrypt(&self, token: &str) -> SecurityResult<String> {
        let raw = BASE64
            .decode(token)
            .map_err(|e| SecurityError::InvalidCiphertext(format!("bad base64: {e}")))?;
        if raw.len() <= IV_LEN {
            return Err(SecurityError::InvalidCiphertext(
                "token shorter than IV".into(),
            ));
        }
        let (iv, ciphertext) = raw.split_at(IV_LEN);

        let cipher = self.cipher()?;
        let plaintext = cipher
            .decrypt(Nonce::from_slice(iv), ciphertext)
            .map_err(|_| SecurityError::Crypto("authentication failed".into()))?;

        String::from_utf8(plaintext)
            .map_err(|_| SecurityError::Crypto("plaintext is not valid UTF-8".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn cipher() -> (tempfile::TempDir, DataCipher) {
        let dir = tempdir().unwrap();
        let store = Arc::new(LocalStore::open(dir.path().join("store.json")));
        (dir, DataCipher::new(store))
    }

    #[test]
    fn test_roundtrip() {
        let (_dir, cipher) = cipher();
        for plaintext in ["", "secret", "unicode: żółć 資料", "a\nmulti\nline"] {
            let token = cipher.encrypt(plaintext).unwrap();
            assert_eq!(cipher.decrypt(&token).unwrap(), plaintext);
        }
    }

    #[test]
    fn test_fresh_iv_per_call() {
        let (_dir, cipher) = cipher();
        let a = cipher.encrypt("same input").unwrap();
        let b = cipher.encrypt("same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_tampering_detected() {
        let (_dir, cipher) = cipher();
        let token = cipher.encrypt("account=primary").unwrap();
        let mut raw = BASE64.decode(&token).unwrap();

        // Flip one byte anywhere in the token; decrypt must fail.
        for i in 0..raw.len() {
            raw[i] ^= 0x01;
            let tampered = BASE64.encode(&raw);
            assert!(cipher.decrypt(&tampered).is_err(), "byte {i} flip accepted");
            raw[i] ^= 0x01;
        }
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let (_dir, cipher) = cipher();
        assert!(matches!(
            cipher.decrypt("!!!not base64!!!"),
            Err(SecurityError::InvalidCiphertext(_))
        ));
        // Valid base64 but shorter than one IV.
        assert!(matches!(
            cipher.decrypt(&BASE64.encode([0u8; 8])),
            Err(SecurityError::InvalidCiphertext(_))
        ));
    }

    #[test]
    fn test_decrypt_across_restart() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let token = {
            let store = Arc::new(LocalStore::open(&path));
            DataCipher::new(store).encrypt("survives restart").unwrap()
        };
        let store = Arc::new(LocalStore::open(&path));
        assert_eq!(
            DataCipher::new(store).decrypt(&token).unwrap(),
            "survives restart"
        );
    }
}
