//! Port interfaces for marketplace connections and OAuth flow state

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktsync_domain::{MarketplaceConnection, MarketplaceId, Result};
use serde::{Deserialize, Serialize};

/// Trait for storing marketplace connections
///
/// One row per (user, marketplace); a second successful connect for the same
/// pair replaces the stored credentials rather than inserting a duplicate.
/// Connections are disabled, never deleted, when refresh fails irrecoverably.
#[async_trait]
pub trait ConnectionRepository: Send + Sync {
    /// Insert or replace a connection on its (user, marketplace) key
    async fn upsert(&self, connection: &MarketplaceConnection) -> Result<()>;

    /// Fetch a connection by (user, marketplace)
    async fn find(&self, user_id: &str, marketplace: MarketplaceId)
        -> Result<Option<MarketplaceConnection>>;

    /// List all connections for a user
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<MarketplaceConnection>>;

    /// Flip the enabled flag without touching credentials
    async fn set_enabled(&self, user_id: &str, marketplace: MarketplaceId, enabled: bool)
        -> Result<()>;

    /// Replace the encrypted credential blob for an existing connection
    async fn update_credentials(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        credentials: &str,
    ) -> Result<()>;
}

/// In-flight OAuth authorization, parked between initiate and callback.
///
/// Keyed on (user, marketplace); initiating a second flow for the same pair
/// overwrites the first, so only the most recent state value is accepted at
/// callback time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingFlow {
    pub user_id: String,
    pub marketplace: MarketplaceId,
    /// Random anti-CSRF state echoed back by the provider.
    pub state: String,
    /// Connect-time input (shop domain, site URL, account name) captured at
    /// initiate so the callback can resolve templated URLs.
    pub connect_input: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Trait for single-use OAuth flow state
#[async_trait]
pub trait FlowStateStore: Send + Sync {
    /// Park a pending flow, replacing any previous one for the same
    /// (user, marketplace)
    async fn put(&self, flow: PendingFlow) -> Result<()>;

    /// Atomically take the pending flow matching `state`, if any.
    ///
    /// The flow is removed whether or not the caller's exchange succeeds;
    /// a state value is never accepted twice.
    async fn take(&self, user_id: &str, marketplace: MarketplaceId, state: &str)
        -> Result<Option<PendingFlow>>;
}
