//! # MktSync Common
//!
//! Shared building blocks used across the workspace:
//!
//! - [`crypto`]: AES-256-GCM credential vault
//! - [`auth`]: OAuth 2.0 token types and expiry arithmetic
//! - [`retry`]: exponential-backoff retry policy

pub mod auth;
pub mod crypto;
pub mod retry;

pub use auth::{Credentials, OAuthErrorBody, TokenResponse};
pub use crypto::{CredentialVault, CryptoError};
pub use retry::RetryPolicy;
