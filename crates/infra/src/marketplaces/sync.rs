//! Product sync engine.
//!
//! One sync run enumerates the remote catalog, then loads and upserts
//! listings in fixed-size batches with a pause between batches to stay under
//! marketplace rate limits. Enumeration failure aborts the run; per-listing
//! failures are recorded in the report and never abort the batch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use mktsync_core::{ProductRepository, SalesMetricsRepository};
use mktsync_domain::{MarketplaceId, Result, SalesMetric, SyncReport};
use tracing::{info, warn};

use crate::http::ApiClient;
use crate::marketplaces::adapter::{MarketplaceAdapter, RemoteListing};
use crate::marketplaces::registry::MarketplaceRegistry;
use crate::marketplaces::token_manager::TokenRefreshManager;

pub struct SyncEngine {
    token_manager: Arc<TokenRefreshManager>,
    registry: Arc<MarketplaceRegistry>,
    products: Arc<dyn ProductRepository>,
    metrics: Arc<dyn SalesMetricsRepository>,
    /// Pause between batches. Not applied after the last batch.
    batch_delay: Duration,
}

impl SyncEngine {
    pub fn new(
        token_manager: Arc<TokenRefreshManager>,
        registry: Arc<MarketplaceRegistry>,
        products: Arc<dyn ProductRepository>,
        metrics: Arc<dyn SalesMetricsRepository>,
        batch_delay: Duration,
    ) -> Self {
        Self { token_manager, registry, products, metrics, batch_delay }
    }

    /// Sync the full remote catalog for one (user, marketplace).
    pub async fn sync_products(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
    ) -> Result<SyncReport> {
        let api = self.token_manager.get_client(user_id, marketplace).await?;
        let adapter = self.registry.adapter_for(marketplace)?;
        let marketplace = adapter.marketplace();

        let listings = adapter.fetch_listing_refs(&api).await?;
        info!(user_id, %marketplace, listings = listings.len(), "sync started");

        let mut report = SyncReport::default();
        let batch_size = adapter.batch_size().max(1);
        let batch_count = listings.len().div_ceil(batch_size);

        for (index, batch) in listings.chunks(batch_size).enumerate() {
            let outcomes = join_all(
                batch
                    .iter()
                    .map(|listing| self.sync_one(&api, adapter.as_ref(), user_id, listing)),
            )
            .await;

            let mut batch_report = SyncReport::default();
            for outcome in outcomes {
                match outcome {
                    Ok(_) => batch_report.record_success(),
                    Err((sku, err)) => {
                        warn!(user_id, %marketplace, sku = %sku, error = %err, "listing sync failed");
                        batch_report.record_failure(sku, err.to_string());
                    }
                }
            }
            report.merge(batch_report);

            if index + 1 < batch_count && !self.batch_delay.is_zero() {
                tokio::time::sleep(self.batch_delay).await;
            }
        }

        info!(
            user_id,
            %marketplace,
            updated = report.products_updated,
            failed = report.products_failed,
            "sync finished"
        );

        self.record_metric(user_id, &report).await;
        Ok(report)
    }

    /// Load, map, and persist one listing. Failures return the best sku we
    /// have for the report (the listing id when mapping never happened).
    async fn sync_one(
        &self,
        api: &ApiClient,
        adapter: &dyn MarketplaceAdapter,
        user_id: &str,
        listing: &RemoteListing,
    ) -> std::result::Result<String, (String, mktsync_domain::MarketplaceError)> {
        let product = adapter
            .load_product(api, user_id, listing)
            .await
            .map_err(|err| (listing.id.clone(), err))?;

        let sku = product.sku.clone();
        self.products.upsert(&product).await.map_err(|err| (sku.clone(), err))?;
        Ok(sku)
    }

    /// Metrics are best-effort: a metrics write failure never fails a sync
    /// that already updated products.
    async fn record_metric(&self, user_id: &str, report: &SyncReport) {
        let metric = SalesMetric {
            user_id: user_id.to_string(),
            date: Utc::now().date_naive(),
            products_synced: report.products_updated,
        };
        if let Err(err) = self.metrics.upsert(&metric).await {
            warn!(user_id, error = %err, "failed to record sync metric");
        }
    }
}
