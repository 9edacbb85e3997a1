//! Cryptographic primitives for credential storage.

mod vault;

pub use vault::{CredentialVault, CryptoError, EncryptedPayload};
