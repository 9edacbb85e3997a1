//! Port interfaces for catalog persistence

use async_trait::async_trait;
use chrono::NaiveDate;
use mktsync_domain::{Product, Result, SalesMetric};

/// Trait for storing canonical products
///
/// Uniqueness is per (user, sku): upserting a product that already exists
/// for the user replaces the stored row instead of inserting a duplicate.
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert or replace a product on its (user, sku) key
    async fn upsert(&self, product: &Product) -> Result<()>;

    /// Fetch a single product by (user, sku)
    async fn find_by_sku(&self, user_id: &str, sku: &str) -> Result<Option<Product>>;

    /// List all products for a user
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Product>>;

    /// Count products for a user
    async fn count_for_user(&self, user_id: &str) -> Result<u64>;
}

/// Trait for daily sync metrics, keyed on (user, date)
#[async_trait]
pub trait SalesMetricsRepository: Send + Sync {
    /// Insert or replace the metric row for the metric's (user, date)
    async fn upsert(&self, metric: &SalesMetric) -> Result<()>;

    /// Fetch the metric row for a specific day
    async fn find_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Option<SalesMetric>>;
}
