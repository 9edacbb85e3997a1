//! OAuth 2.0 token structures and expiry arithmetic.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored marketplace credentials with expiry metadata.
///
/// This is the plaintext shape that lives vault-encrypted inside a
/// connection record. `expires_at` is absolute so the check stays valid
/// across process restarts; providers that issue non-expiring tokens leave
/// it unset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,

    /// Optional because some providers (Shopify offline tokens) never issue
    /// refresh tokens.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Absolute expiration timestamp (UTC), computed from `expires_in` when
    /// the token was obtained.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,

    /// Granted scopes, space-separated, as reported by the provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl Credentials {
    /// Build credentials from a token endpoint response.
    ///
    /// When the provider rotates refresh tokens the new one wins; when it
    /// omits the field the previous refresh token is carried forward so the
    /// connection stays refreshable.
    #[must_use]
    pub fn from_response(response: TokenResponse, previous_refresh: Option<String>) -> Self {
        let expires_at = response
            .expires_in
            .filter(|secs| *secs > 0)
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs));

        Self {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(previous_refresh),
            expires_at,
            scope: response.scope,
        }
    }

    /// Whether the access token is expired or will expire within the given
    /// threshold. Tokens without an expiry are never considered expired.
    #[must_use]
    pub fn is_expired(&self, threshold_seconds: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() + chrono::Duration::seconds(threshold_seconds) >= expires_at,
            None => false,
        }
    }

    /// Seconds until expiry, if an expiry is set.
    #[must_use]
    pub fn seconds_until_expiry(&self) -> Option<i64> {
        self.expires_at.map(|at| (at - Utc::now()).num_seconds())
    }
}

/// Token endpoint response (RFC 6749 §5.1).
///
/// `expires_in` and `token_type` are optional because several marketplace
/// token endpoints omit them (Shopify offline tokens have no expiry).
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

/// Token endpoint error response (RFC 6749 §5.2).
#[derive(Debug, Deserialize)]
pub struct OAuthErrorBody {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
}

impl fmt::Display for OAuthErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.error_description {
            Some(desc) => write!(f, "{}: {}", self.error, desc),
            None => write!(f, "{}", self.error),
        }
    }
}

impl std::error::Error for OAuthErrorBody {}
