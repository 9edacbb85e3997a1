//! Error types used throughout the application

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for MktSync marketplace operations.
///
/// Every variant carries a human-readable message; [`MarketplaceError::code`]
/// exposes a stable machine-readable identifier and
/// [`MarketplaceError::is_retryable`] classifies whether the failed operation
/// may be attempted again.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum MarketplaceError {
    /// Unknown marketplace id or invalid static configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// OAuth anti-CSRF state check failed; the connect flow must restart.
    #[error("Invalid OAuth state: {0}")]
    InvalidState(String),

    /// Authorization-code exchange or refresh-token grant failed.
    #[error("Authentication error: {message}")]
    Auth { message: String, status: Option<u16> },

    /// Refresh token revoked or expired; the connection has been disabled
    /// and the user must reconnect the account.
    #[error("Reauthorization required: {0}")]
    ReauthRequired(String),

    /// No connection record exists for the requested (user, marketplace).
    #[error("Marketplace not connected: {0}")]
    NotConnected(String),

    /// Transport-level failure (connection refused, name resolution, TLS).
    #[error("Network error: {0}")]
    Network(String),

    /// Per-request timeout elapsed.
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Upstream returned HTTP 429.
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Marketplace API returned an unexpected response.
    #[error("Marketplace API error ({status}): {message}")]
    Api { message: String, status: u16 },

    /// Local persistence failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Caller-supplied input failed a precondition.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Credential encryption/decryption failure.
    #[error("Security error: {0}")]
    Security(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketplaceError {
    /// Stable machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidState(_) => "INVALID_STATE",
            Self::Auth { .. } => "AUTH_FAILED",
            Self::ReauthRequired(_) => "REAUTH_REQUIRED",
            Self::NotConnected(_) => "NOT_CONNECTED",
            Self::Network(_) => "NETWORK_ERROR",
            Self::Timeout(_) => "TIMEOUT",
            Self::RateLimited(_) => "RATE_LIMITED",
            Self::Api { .. } => "API_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::InvalidInput(_) => "INVALID_INPUT",
            Self::Security(_) => "SECURITY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Upstream HTTP status, when one was observed.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Auth { status, .. } => *status,
            Self::Api { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }

    /// Whether the failed operation may be retried.
    ///
    /// Authentication failures are never retryable; transient network,
    /// timeout, rate-limit, and server-side conditions are.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimited(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Config(_)
            | Self::InvalidState(_)
            | Self::Auth { .. }
            | Self::ReauthRequired(_)
            | Self::NotConnected(_)
            | Self::Storage(_)
            | Self::InvalidInput(_)
            | Self::Security(_)
            | Self::Internal(_) => false,
        }
    }
}

/// Result type alias for MktSync operations
pub type Result<T> = std::result::Result<T, MarketplaceError>;
