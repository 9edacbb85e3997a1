//! Sync result aggregation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Cap on the per-SKU error list carried by a [`SyncReport`]. The failure
/// counter keeps counting past the cap so aggregate totals stay exact for
/// very large catalogs.
pub const MAX_SYNC_ERRORS: usize = 100;

/// Per-item sync failure, recorded without aborting the batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncItemError {
    pub sku: String,
    pub error: String,
}

/// Aggregate outcome of one product sync run.
///
/// A run that reaches item processing always yields a report, even when
/// individual items failed; failures before any item is processed surface as
/// a top-level `MarketplaceError` instead.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncReport {
    pub products_updated: u32,
    pub products_failed: u32,
    /// Ordered per-SKU failures, truncated at [`MAX_SYNC_ERRORS`].
    pub errors: Vec<SyncItemError>,
}

impl SyncReport {
    pub fn record_success(&mut self) {
        self.products_updated += 1;
    }

    /// Record a per-item failure; the error list is bounded but the counter
    /// is not.
    pub fn record_failure(&mut self, sku: impl Into<String>, error: impl Into<String>) {
        self.products_failed += 1;
        if self.errors.len() < MAX_SYNC_ERRORS {
            self.errors.push(SyncItemError { sku: sku.into(), error: error.into() });
        }
    }

    /// Fold another report into this one (used across batches).
    pub fn merge(&mut self, other: SyncReport) {
        self.products_updated += other.products_updated;
        self.products_failed += other.products_failed;
        for err in other.errors {
            if self.errors.len() >= MAX_SYNC_ERRORS {
                break;
            }
            self.errors.push(err);
        }
    }
}

/// Daily sales/sync metric row, upserted on (user, date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesMetric {
    pub user_id: String,
    pub date: NaiveDate,
    pub products_synced: u32,
}
