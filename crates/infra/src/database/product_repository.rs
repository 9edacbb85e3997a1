//! Product repository implementation using pooled SQLite
//!
//! Canonical products are keyed on (user_id, sku); a sync upserting the same
//! SKU twice updates the existing row instead of inserting a duplicate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mktsync_core::ProductRepository;
use mktsync_domain::{MarketplaceError, Product, ProductMetadata, ProductStatus, Result};
use rusqlite::{params, Row};
use tokio::task;

use super::manager::{map_join_error, map_sql_error, DbManager};

/// SQLite-backed implementation of `ProductRepository`
pub struct SqliteProductRepository {
    db: Arc<DbManager>,
}

impl SqliteProductRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn upsert(&self, product: &Product) -> Result<()> {
        let db = Arc::clone(&self.db);
        let product = product.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let metadata = serde_json::to_string(&product.metadata)
                .map_err(|e| MarketplaceError::Internal(e.to_string()))?;

            conn.execute(
                "INSERT INTO products (
                    user_id, sku, name, description, price, stock_quantity, status, metadata, updated_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                 ON CONFLICT(user_id, sku) DO UPDATE SET
                    name = excluded.name,
                    description = excluded.description,
                    price = excluded.price,
                    stock_quantity = excluded.stock_quantity,
                    status = excluded.status,
                    metadata = excluded.metadata,
                    updated_at = excluded.updated_at",
                params![
                    &product.user_id,
                    &product.sku,
                    &product.name,
                    &product.description,
                    product.price,
                    product.stock_quantity,
                    status_to_str(product.status),
                    &metadata,
                    Utc::now().to_rfc3339(),
                ],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_by_sku(&self, user_id: &str, sku: &str) -> Result<Option<Product>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();
        let sku = sku.to_string();

        task::spawn_blocking(move || -> Result<Option<Product>> {
            let conn = db.get_connection()?;

            let result = conn.query_row(
                "SELECT user_id, sku, name, description, price, stock_quantity, status, metadata
                 FROM products WHERE user_id = ?1 AND sku = ?2",
                params![&user_id, &sku],
                map_product_row,
            );

            match result {
                Ok(product) => Ok(Some(product)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(err) => Err(map_sql_error(err)),
            }
        })
        .await
        .map_err(map_join_error)?
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Product>> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<Vec<Product>> {
            let conn = db.get_connection()?;

            let mut stmt = conn
                .prepare(
                    "SELECT user_id, sku, name, description, price, stock_quantity, status, metadata
                     FROM products WHERE user_id = ?1 ORDER BY sku",
                )
                .map_err(map_sql_error)?;

            let rows = stmt
                .query_map(params![&user_id], map_product_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn count_for_user(&self, user_id: &str) -> Result<u64> {
        let db = Arc::clone(&self.db);
        let user_id = user_id.to_string();

        task::spawn_blocking(move || -> Result<u64> {
            let conn = db.get_connection()?;
            let count: i64 = conn
                .query_row(
                    "SELECT COUNT(*) FROM products WHERE user_id = ?1",
                    params![&user_id],
                    |row| row.get(0),
                )
                .map_err(map_sql_error)?;
            Ok(count as u64)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_product_row(row: &Row) -> rusqlite::Result<Product> {
    let status: String = row.get(6)?;
    let metadata: String = row.get(7)?;
    let metadata: ProductMetadata = serde_json::from_str(&metadata).unwrap_or_default();

    Ok(Product {
        user_id: row.get(0)?,
        sku: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        price: row.get(4)?,
        stock_quantity: row.get(5)?,
        status: status_from_str(&status),
        metadata,
    })
}

fn status_to_str(status: ProductStatus) -> &'static str {
    match status {
        ProductStatus::Active => "active",
        ProductStatus::Inactive => "inactive",
    }
}

fn status_from_str(raw: &str) -> ProductStatus {
    match raw {
        "active" => ProductStatus::Active,
        _ => ProductStatus::Inactive,
    }
}

#[cfg(test)]
mod tests {
    use mktsync_domain::ProductImages;
    use tempfile::TempDir;

    use super::*;

    fn setup_test_db() -> (Arc<DbManager>, TempDir) {
        let temp_dir = TempDir::new().expect("create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let manager = DbManager::new(&db_path, 4).expect("create db manager");
        manager.run_migrations().expect("run migrations");
        (Arc::new(manager), temp_dir)
    }

    fn test_product(sku: &str) -> Product {
        Product {
            user_id: "user-1".into(),
            sku: sku.into(),
            name: "Widget".into(),
            description: Some("A widget".into()),
            price: 49.9,
            stock_quantity: 3,
            status: ProductStatus::Active,
            metadata: ProductMetadata {
                brand: Some("Acme".into()),
                images: ProductImages::from_ordered(vec!["a.jpg".into(), "b.jpg".into()]),
                ..Default::default()
            },
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_and_find_round_trip() {
        let (db, _tmp) = setup_test_db();
        let repo = SqliteProductRepository::new(db);
        let product = test_product("SKU-1");

        repo.upsert(&product).await.expect("upsert");

        let found = repo.find_by_sku("user-1", "SKU-1").await.expect("find").unwrap();
        assert_eq!(found, product);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn upsert_same_sku_replaces_row() {
        let (db, _tmp) = setup_test_db();
        let repo = SqliteProductRepository::new(db);

        repo.upsert(&test_product("SKU-1")).await.expect("first upsert");

        let mut updated = test_product("SKU-1");
        updated.price = 99.0;
        updated.stock_quantity = 7;
        repo.upsert(&updated).await.expect("second upsert");

        assert_eq!(repo.count_for_user("user-1").await.unwrap(), 1);
        let found = repo.find_by_sku("user-1", "SKU-1").await.unwrap().unwrap();
        assert_eq!(found.price, 99.0);
        assert_eq!(found.stock_quantity, 7);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn same_sku_for_different_users_coexists() {
        let (db, _tmp) = setup_test_db();
        let repo = SqliteProductRepository::new(db);

        repo.upsert(&test_product("SKU-1")).await.unwrap();
        let mut other = test_product("SKU-1");
        other.user_id = "user-2".into();
        repo.upsert(&other).await.unwrap();

        assert_eq!(repo.count_for_user("user-1").await.unwrap(), 1);
        assert_eq!(repo.count_for_user("user-2").await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn find_missing_returns_none() {
        let (db, _tmp) = setup_test_db();
        let repo = SqliteProductRepository::new(db);

        assert!(repo.find_by_sku("user-1", "nope").await.unwrap().is_none());
    }
}
