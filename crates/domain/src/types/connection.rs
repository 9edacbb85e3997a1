//! Marketplace connection records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::marketplace::MarketplaceId;

/// One connection per (user, marketplace) pair.
///
/// Created on the first successful OAuth exchange, updated on token refresh
/// or settings change, and disabled (never deleted) when a refresh fails
/// irrecoverably. The credential blob is always vault-encrypted; plaintext
/// credentials exist only transiently in memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConnection {
    pub user_id: String,
    pub marketplace: MarketplaceId,
    pub enabled: bool,
    /// Vault-encrypted credential bundle (base64 string).
    pub credentials: String,
    /// Free-form per-connection settings.
    #[serde(default)]
    pub settings: Value,
    pub updated_at: DateTime<Utc>,
}

impl MarketplaceConnection {
    /// Build a freshly-enabled connection with the given encrypted blob.
    pub fn new_enabled(
        user_id: impl Into<String>,
        marketplace: MarketplaceId,
        credentials: String,
        settings: Value,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            marketplace,
            enabled: true,
            credentials,
            settings,
            updated_at: Utc::now(),
        }
    }
}
