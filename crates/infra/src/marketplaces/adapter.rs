//! Marketplace adapter trait.
//!
//! Each supported marketplace implements this trait to translate its REST
//! surface into the canonical product schema. The sync engine drives
//! adapters in two phases: enumerate listing references, then load and map
//! each listing. Enumeration failure aborts a sync; per-listing failures are
//! isolated by the engine.

use async_trait::async_trait;
use mktsync_domain::{MarketplaceId, Product, Result};
use serde_json::Value;

use crate::http::ApiClient;

/// Reference to one remote listing.
///
/// Marketplaces whose listing endpoint already returns full product bodies
/// (Shopify, generic REST catalogs) embed the body as `payload` so the load
/// phase needs no extra network call; two-step marketplaces (Mercado Livre)
/// carry only the id.
#[derive(Debug, Clone)]
pub struct RemoteListing {
    pub id: String,
    pub payload: Option<Value>,
}

impl RemoteListing {
    pub fn by_id(id: impl Into<String>) -> Self {
        Self { id: id.into(), payload: None }
    }

    pub fn with_payload(id: impl Into<String>, payload: Value) -> Self {
        Self { id: id.into(), payload: Some(payload) }
    }
}

/// Trait for marketplace catalog adapters
#[async_trait]
pub trait MarketplaceAdapter: Send + Sync {
    fn marketplace(&self) -> MarketplaceId;

    /// Listings processed concurrently per batch.
    fn batch_size(&self) -> usize;

    /// Enumerate every listing the connected account owns.
    async fn fetch_listing_refs(&self, api: &ApiClient) -> Result<Vec<RemoteListing>>;

    /// Load one listing and map it into the canonical product schema.
    async fn load_product(
        &self,
        api: &ApiClient,
        user_id: &str,
        listing: &RemoteListing,
    ) -> Result<Product>;
}
