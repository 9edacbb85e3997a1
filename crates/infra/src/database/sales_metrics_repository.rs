//! Daily sales metrics repository implementation using pooled SQLite
//!
//! One row per (user_id, date); a second sync on the same day replaces the
//! day's counters.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use mktsync_core::SalesMetricsRepository;
use mktsync_domain::{MarketplaceError, Result, SalesMetric};
use rusqlite::params;
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// SQLite-backed implementation of `SalesMetricsRepository`
pub struct SqliteSalesMetricsRepository {
    db: Arc<DbManager>,
}

impl SqliteSalesMetricsRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SalesMetricsRepository for SqliteSalesMetricsRepository {
    async fn upsert(&self, metric: &SalesMetric) -> Result<()> {
        let db = Arc::clone(&self.db);
        let metric = metric.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO sales_metrics (user_id, date, products_synced)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(user_id, date) DO UPDATE SET
                    products_synced = excluded.products_synced",
                params![&metric.user_id, metric.date.to_string(), metric.products_synced],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_for_date(&self, user_id: &str, date: NaiveDate) -> Result<Option<SalesMetric>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Option<SalesMetric>> {
            let conn = db.get_connection()?;

            let result = conn.query_row(
                "SELECT user_id, date, products_synced FROM sales_metrics
                 WHERE user_id = ?1 AND date = ?2",
                params![&user_id, date.to_string()],
                |row| {
                    let date: String = row.get(1)?;
                    Ok((row.get::<_, String>(0)?, date, row.get::<_, u32>(2)?))
                },
            );

            match result {
                Ok((user_id, date, products_synced)) => {
                    let date = date.parse::<NaiveDate>().map_err(|e| {
                        MarketplaceError::Storage(format!("malformed metric date: {e}"))
                    })?;
                    Ok(Some(SalesMetric { user_id, date, products_synced }))
                }
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }
}
