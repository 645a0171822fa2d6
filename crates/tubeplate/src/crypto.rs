//! At-rest encryption for OAuth credentials.
//!
//! Tokens are stored as base64 of `nonce || ciphertext` using AES-256-GCM.
//! The key is supplied by configuration as 32 base64-encoded bytes.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Errors from token encryption or decryption.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("Invalid encryption key: {0}")]
    InvalidKey(String),

    #[error("Stored token is not valid base64")]
    Encoding,

    #[error("Stored token is truncated")]
    Truncated,

    #[error("Token could not be decrypted (wrong key or corrupted data)")]
    Decrypt,

    #[error("Token could not be encrypted")]
    Encrypt,

    #[error("Decrypted token is not valid UTF-8")]
    Utf8,
}

/// Opaque encrypt/decrypt pair for credential columns.
pub trait TokenCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError>;
    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError>;
}

/// AES-256-GCM token cipher with a random nonce per encryption.
#[derive(Clone)]
pub struct AesGcmCipher {
    key: Key<Aes256Gcm>,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher").finish_non_exhaustive()
    }
}

impl AesGcmCipher {
    pub fn from_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "expected {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Ok(Self {
            key: *Key::<Aes256Gcm>::from_slice(key),
        })
    }

    /// Build a cipher from the base64 form used in configuration.
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
        Self::from_bytes(&bytes)
    }

    /// Generate a fresh random key, base64-encoded.
    pub fn generate_key() -> String {
        STANDARD.encode(Aes256Gcm::generate_key(&mut OsRng))
    }
}

impl TokenCipher for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, CryptoError> {
        let cipher = Aes256Gcm::new(&self.key);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(ciphertext)
            .map_err(|_| CryptoError::Encoding)?;
        if raw.len() <= NONCE_LEN {
            return Err(CryptoError::Truncated);
        }
        let (nonce, sealed) = raw.split_at(NONCE_LEN);

        let cipher = Aes256Gcm::new(&self.key);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plain).map_err(|_| CryptoError::Utf8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cipher() -> AesGcmCipher {
        AesGcmCipher::from_base64_key(&AesGcmCipher::generate_key()).expect("generated key")
    }

    #[test]
    fn decrypt_recovers_plaintext() {
        let c = cipher();
        let sealed = c.encrypt("ya29.token").unwrap();
        assert_ne!(sealed, "ya29.token");
        assert_eq!(c.decrypt(&sealed).unwrap(), "ya29.token");
    }

    #[test]
    fn encryption_uses_a_fresh_nonce() {
        let c = cipher();
        assert_ne!(c.encrypt("same").unwrap(), c.encrypt("same").unwrap());
    }

    #[test]
    fn wrong_key_fails_to_decrypt() {
        let sealed = cipher().encrypt("secret").unwrap();
        assert_eq!(cipher().decrypt(&sealed), Err(CryptoError::Decrypt));
    }

    #[test]
    fn malformed_ciphertext_is_rejected() {
        let c = cipher();
        assert_eq!(c.decrypt("not base64 !!"), Err(CryptoError::Encoding));
        assert_eq!(c.decrypt(&STANDARD.encode([0u8; 4])), Err(CryptoError::Truncated));
    }

    #[test]
    fn key_must_be_32_bytes() {
        let err = AesGcmCipher::from_bytes(&[0u8; 16]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidKey(_)));
        assert!(AesGcmCipher::from_base64_key("%%%").is_err());
    }
}
