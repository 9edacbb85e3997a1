//! Marketplace connection repository implementation using pooled SQLite
//!
//! Connections are keyed on (user_id, marketplace); reconnecting an account
//! replaces the stored credentials rather than creating a duplicate row.

use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mktsync_core::ConnectionRepository;
use mktsync_domain::{MarketplaceConnection, MarketplaceError, MarketplaceId, Result};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// SQLite-backed implementation of `ConnectionRepository`
pub struct SqliteConnectionRepository {
    db: Arc<DbManager>,
}

impl SqliteConnectionRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ConnectionRepository for SqliteConnectionRepository {
    async fn upsert(&self, connection: &MarketplaceConnection) -> Result<()> {
        let db = Arc::clone(&self.db);
        let connection = connection.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let settings = serde_json::to_string(&connection.settings)
                .map_err(|e| MarketplaceError::Internal(e.to_string()))?;

            conn.execute(
                "INSERT INTO marketplace_connections (
                    user_id, marketplace, enabled, credentials, settings, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(user_id, marketplace) DO UPDATE SET
                    enabled = excluded.enabled,
                    credentials = excluded.credentials,
                    settings = excluded.settings,
                    updated_at = excluded.updated_at",
                params![
                    &connection.user_id,
                    connection.marketplace.as_str(),
                    connection.enabled,
                    &connection.credentials,
                    &settings,
                    connection.updated_at.to_rfc3339(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
    ) -> Result<Option<MarketplaceConnection>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Option<MarketplaceConnection>> {
            let conn = db.get_connection()?;

            let result = conn.query_row(
                "SELECT user_id, marketplace, enabled, credentials, settings, updated_at
                 FROM marketplace_connections WHERE user_id = ?1 AND marketplace = ?2",
                params![&user_id, marketplace.as_str()],
                map_connection_row,
            );

            match result {
                Ok(connection) => Ok(Some(connection?)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<MarketplaceConnection>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<MarketplaceConnection>> {
            let conn = db.get_connection()?;

            let mut stmt = conn
                .prepare(
                    "SELECT user_id, marketplace, enabled, credentials, settings, updated_at
                     FROM marketplace_connections WHERE user_id = ?1 ORDER BY marketplace",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![&user_id], map_connection_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;

            rows.into_iter().collect()
        })
        .await
        .map_err(map_join_error)?
    }

    async fn set_enabled(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        enabled: bool,
    ) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE marketplace_connections SET enabled = ?3, updated_at = ?4
                     WHERE user_id = ?1 AND marketplace = ?2",
                    params![&user_id, marketplace.as_str(), enabled, Utc::now().to_rfc3339()],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(MarketplaceError::NotConnected(marketplace.to_string()));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update_credentials(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        credentials: &str,
    ) -> Result<()> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let credentials = credentials.to_string();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE marketplace_connections SET credentials = ?3, updated_at = ?4
                     WHERE user_id = ?1 AND marketplace = ?2",
                    params![&user_id, marketplace.as_str(), &credentials, Utc::now().to_rfc3339()],
                )
                .map_err(map_sql_error)?;

            if changed == 0 {
                return Err(MarketplaceError::NotConnected(marketplace.to_string()));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_connection_row(row: &Row) -> rusqlite::Result<Result<MarketplaceConnection>> {
    let marketplace: String = row.get(1)?;
    let settings: String = row.get(4)?;
    let updated_at: String = row.get(5)?;

    Ok(build_connection(
        row.get(0)?,
        marketplace,
        row.get(2)?,
        row.get(3)?,
        settings,
        updated_at,
    ))
}

fn build_connection(
    user_id: String,
    marketplace: String,
    enabled: bool,
    credentials: String,
    settings: String,
    updated_at: String,
) -> Result<MarketplaceConnection> {
    let marketplace = MarketplaceId::from_str(&marketplace)?;
    let settings = serde_json::from_str(&settings)
        .map_err(|e| MarketplaceError::Storage(format!("malformed settings JSON: {e}")))?;
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| MarketplaceError::Storage(format!("malformed timestamp: {e}")))?
        .with_timezone(&Utc);

    Ok(MarketplaceConnection { user_id, marketplace, enabled, credentials, settings, updated_at })
}
