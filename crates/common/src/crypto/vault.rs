//! AES-256-GCM credential vault.
//!
//! Marketplace credentials never touch storage in plaintext: the vault
//! encrypts them into an opaque base64 string and decrypts them back on
//! demand. The encoded payload carries its own nonce and algorithm tag, so a
//! blob is self-describing and a key mismatch or tamper surfaces as a typed
//! error rather than garbage plaintext.

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Errors surfaced by the vault. Decryption failures are deliberately vague
/// about the cause (wrong key vs. tampered ciphertext are indistinguishable
/// under GCM).
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("encryption key must be exactly 32 bytes")]
    InvalidKeyLength,
    #[error("unsupported payload algorithm: {0}")]
    UnsupportedAlgorithm(String),
    #[error("payload nonce must be exactly 12 bytes")]
    InvalidNonce,
    #[error("encryption failed")]
    EncryptionFailed,
    #[error("decryption failed")]
    DecryptionFailed,
    #[error("malformed encrypted payload: {0}")]
    MalformedPayload(String),
}

/// Serializable encrypted payload, carried base64-encoded inside connection
/// records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptedPayload {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub algorithm: String,
}

const ALGORITHM: &str = "AES-256-GCM";

/// AES-256-GCM vault keyed with a single 32-byte symmetric key.
pub struct CredentialVault {
    key: Vec<u8>,
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CredentialVault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVault").field("key", &"[REDACTED]").finish()
    }
}

impl CredentialVault {
    /// Create a vault from a raw 32-byte key.
    pub fn new(key: Vec<u8>) -> Result<Self, CryptoError> {
        if key.len() != 32 {
            return Err(CryptoError::InvalidKeyLength);
        }
        let cipher = Aes256Gcm::new_from_slice(&key).map_err(|_| CryptoError::InvalidKeyLength)?;
        Ok(Self { key, cipher })
    }

    /// Create a vault from a base64-encoded 32-byte key (the form used in
    /// environment configuration).
    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let key = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::MalformedPayload(format!("key is not valid base64: {e}")))?;
        Self::new(key)
    }

    /// Generate a random 32-byte symmetric key.
    pub fn generate_key() -> Vec<u8> {
        use aes_gcm::aead::rand_core::RngCore;
        let mut key = vec![0u8; 32];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt bytes into a structured payload.
    pub fn encrypt(&self, data: &[u8]) -> Result<EncryptedPayload, CryptoError> {
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext =
            self.cipher.encrypt(&nonce, data).map_err(|_| CryptoError::EncryptionFailed)?;

        Ok(EncryptedPayload {
            nonce: nonce.to_vec(),
            ciphertext,
            algorithm: ALGORITHM.to_string(),
        })
    }

    /// Decrypt a structured payload back into raw bytes.
    pub fn decrypt(&self, payload: &EncryptedPayload) -> Result<Vec<u8>, CryptoError> {
        if payload.algorithm != ALGORITHM {
            return Err(CryptoError::UnsupportedAlgorithm(payload.algorithm.clone()));
        }
        let nonce_bytes: [u8; 12] =
            payload.nonce.as_slice().try_into().map_err(|_| CryptoError::InvalidNonce)?;

        self.cipher
            .decrypt(&Nonce::from(nonce_bytes), payload.ciphertext.as_ref())
            .map_err(|_| CryptoError::DecryptionFailed)
    }

    /// Encrypt bytes and encode the payload as a single base64 string.
    pub fn encrypt_to_string(&self, data: &[u8]) -> Result<String, CryptoError> {
        let payload = self.encrypt(data)?;
        let serialized = serde_json::to_vec(&payload)
            .map_err(|e| CryptoError::MalformedPayload(e.to_string()))?;
        Ok(BASE64.encode(serialized))
    }

    /// Decode a base64 string and decrypt the contained payload.
    pub fn decrypt_from_string(&self, encoded: &str) -> Result<Vec<u8>, CryptoError> {
        let decoded = BASE64
            .decode(encoded)
            .map_err(|e| CryptoError::MalformedPayload(format!("base64 decode failed: {e}")))?;
        let payload: EncryptedPayload = serde_json::from_slice(&decoded)
            .map_err(|e| CryptoError::MalformedPayload(e.to_string()))?;
        self.decrypt(&payload)
    }

    /// Short fingerprint of the current key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        use sha2::{Digest, Sha256};
        let mut hasher = Sha256::new();
        hasher.update(&self.key);
        let digest = hasher.finalize();
        BASE64.encode(&digest[..8])
    }
}
