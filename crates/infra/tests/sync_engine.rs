//! Full sync runs against a mock Mercado Livre API and a real SQLite
//! database.

mod support;

use std::sync::Arc;
use std::time::Duration;

use mktsync_core::{ConnectionRepository, ProductRepository, SalesMetricsRepository};
use mktsync_domain::{MarketplaceConnection, MarketplaceError, MarketplaceId};
use mktsync_infra::{SyncEngine, TokenRefreshManager};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::{
    encrypted_credentials, fast_http_client, mercadolivre_config, nuvemshop_config, registry_with,
    test_vault, TestDatabase,
};

const SELLER_ID: u64 = 123456;

fn engine(server_uri: &str, db: &TestDatabase) -> SyncEngine {
    let registry = registry_with(mercadolivre_config(server_uri));
    let token_manager = Arc::new(TokenRefreshManager::new(
        registry.clone(),
        fast_http_client(),
        test_vault(),
        db.connections.clone(),
    ));
    SyncEngine::new(
        token_manager,
        registry,
        db.products.clone(),
        db.metrics.clone(),
        Duration::ZERO,
    )
}

async fn store_connection(db: &TestDatabase) {
    let vault = test_vault();
    let blob = encrypted_credentials(&vault, "APP_USR-access", Some("refresh-1"), Some(3600));
    let connection = MarketplaceConnection::new_enabled(
        "user-1",
        MarketplaceId::MercadoLivre,
        blob,
        serde_json::json!({}),
    );
    db.connections.upsert(&connection).await.expect("store connection");
}

async fn mount_catalog(server: &MockServer, ids: &[&str]) {
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": SELLER_ID,
            "nickname": "TESTSELLER"
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/users/{SELLER_ID}/items/search")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({ "results": ids, "paging": {"total": ids.len()} })),
        )
        .mount(server)
        .await;
}

async fn mount_item(server: &MockServer, id: &str, price: f64) {
    Mock::given(method("GET"))
        .and(path(format!("/items/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": id,
            "title": format!("Produto {id}"),
            "category_id": "MLB1051",
            "price": price,
            "available_quantity": 3,
            "status": "active",
            "listing_type_id": "gold_special",
            "pictures": [{"source": format!("https://http2.mlstatic.com/{id}.jpg")}],
            "attributes": [
                {"id": "BRAND", "value_name": "Acme"},
                {"id": "GTIN", "value_name": "7891234567890"}
            ]
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn sync_imports_the_whole_catalog() {
    let server = MockServer::start().await;
    let ids = ["MLB1", "MLB2", "MLB3"];
    mount_catalog(&server, &ids).await;
    for (i, id) in ids.iter().enumerate() {
        mount_item(&server, id, 10.0 + i as f64).await;
    }

    let db = TestDatabase::new();
    store_connection(&db).await;

    let report = engine(&server.uri(), &db)
        .sync_products("user-1", MarketplaceId::MercadoLivre)
        .await
        .expect("sync");

    assert_eq!(report.products_updated, 3);
    assert_eq!(report.products_failed, 0);
    assert!(report.errors.is_empty());

    assert_eq!(db.products.count_for_user("user-1").await.unwrap(), 3);
    let product =
        db.products.find_by_sku("user-1", "MLB2").await.unwrap().expect("product stored");
    assert_eq!(product.name, "Produto MLB2");
    assert_eq!(product.metadata.brand.as_deref(), Some("Acme"));

    // One metric row for today with the updated count.
    let metric = db
        .metrics
        .find_for_date("user-1", chrono::Utc::now().date_naive())
        .await
        .unwrap()
        .expect("metric recorded");
    assert_eq!(metric.products_synced, 3);
}

#[tokio::test]
async fn failed_listings_are_isolated() {
    let server = MockServer::start().await;
    let ids = ["MLB1", "MLB2", "MLB3"];
    mount_catalog(&server, &ids).await;
    mount_item(&server, "MLB1", 10.0).await;
    mount_item(&server, "MLB3", 30.0).await;
    Mock::given(method("GET"))
        .and(path("/items/MLB2"))
        .respond_with(ResponseTemplate::new(404).set_body_string("item not found"))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    store_connection(&db).await;

    let report = engine(&server.uri(), &db)
        .sync_products("user-1", MarketplaceId::MercadoLivre)
        .await
        .expect("sync");

    assert_eq!(report.products_updated, 2);
    assert_eq!(report.products_failed, 1);
    assert_eq!(report.errors.len(), 1);
    assert_eq!(report.errors[0].sku, "MLB2");

    assert_eq!(db.products.count_for_user("user-1").await.unwrap(), 2);
}

#[tokio::test]
async fn enumeration_failure_aborts_the_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/me"))
        .respond_with(ResponseTemplate::new(401).set_body_string("token rejected"))
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    store_connection(&db).await;

    let err = engine(&server.uri(), &db)
        .sync_products("user-1", MarketplaceId::MercadoLivre)
        .await
        .unwrap_err();

    assert!(matches!(err, MarketplaceError::Auth { .. }), "got {err:?}");
    assert_eq!(db.products.count_for_user("user-1").await.unwrap(), 0);
}

#[tokio::test]
async fn resync_is_idempotent() {
    let server = MockServer::start().await;
    let ids = ["MLB1", "MLB2"];
    mount_catalog(&server, &ids).await;
    mount_item(&server, "MLB1", 10.0).await;
    mount_item(&server, "MLB2", 20.0).await;

    let db = TestDatabase::new();
    store_connection(&db).await;
    let engine = engine(&server.uri(), &db);

    engine.sync_products("user-1", MarketplaceId::MercadoLivre).await.expect("first sync");
    engine.sync_products("user-1", MarketplaceId::MercadoLivre).await.expect("second sync");

    // Same (user, sku) keys replace rather than duplicate.
    assert_eq!(db.products.count_for_user("user-1").await.unwrap(), 2);
}

#[tokio::test]
async fn large_flat_catalog_is_batched_with_failures_isolated() {
    let server = MockServer::start().await;

    // 25 products for a batch-10 adapter: batches of 10, 10, 5. Three of
    // them carry neither sku nor id and fail mapping.
    let products: Vec<serde_json::Value> = (0..25)
        .map(|i| {
            if i % 9 == 4 {
                serde_json::json!({"name": format!("Broken {i}"), "price": "1.00"})
            } else {
                serde_json::json!({
                    "id": i,
                    "sku": format!("NV-{i}"),
                    "name": format!("Produto {i}"),
                    "price": format!("{}.90", 10 + i),
                    "stock_quantity": i
                })
            }
        })
        .collect();

    Mock::given(method("GET"))
        .and(path("/products"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "products": products
        })))
        .expect(1)
        .mount(&server)
        .await;

    let db = TestDatabase::new();
    let vault = test_vault();
    let blob = encrypted_credentials(&vault, "nv-access", None, None);
    let connection = MarketplaceConnection::new_enabled(
        "user-1",
        MarketplaceId::Nuvemshop,
        blob,
        serde_json::json!({}),
    );
    db.connections.upsert(&connection).await.expect("store connection");

    let registry = registry_with(nuvemshop_config(&server.uri()));
    let token_manager = Arc::new(TokenRefreshManager::new(
        registry.clone(),
        fast_http_client(),
        test_vault(),
        db.connections.clone(),
    ));
    let engine = SyncEngine::new(
        token_manager,
        registry,
        db.products.clone(),
        db.metrics.clone(),
        Duration::ZERO,
    );

    let report =
        engine.sync_products("user-1", MarketplaceId::Nuvemshop).await.expect("sync");

    assert_eq!(report.products_updated, 22);
    assert_eq!(report.products_failed, 3);
    assert_eq!(report.errors.len(), 3);
    assert_eq!(db.products.count_for_user("user-1").await.unwrap(), 22);
}

#[tokio::test]
async fn empty_catalog_yields_empty_report() {
    let server = MockServer::start().await;
    mount_catalog(&server, &[]).await;

    let db = TestDatabase::new();
    store_connection(&db).await;

    let report = engine(&server.uri(), &db)
        .sync_products("user-1", MarketplaceId::MercadoLivre)
        .await
        .expect("sync");

    assert_eq!(report.products_updated, 0);
    assert_eq!(report.products_failed, 0);
}
