//! Shared helpers for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use mktsync_common::{CredentialVault, Credentials, RetryPolicy};
use mktsync_domain::{
    EndpointMap, MarketplaceConfig, MarketplaceId, RateLimitPolicy,
};
use mktsync_infra::{
    DbManager, HttpClient, MarketplaceRegistry, SqliteConnectionRepository,
    SqliteProductRepository, SqliteSalesMetricsRepository,
};
use tempfile::TempDir;

/// Migrated SQLite database on a temp dir, with all repositories wired.
pub struct TestDatabase {
    _tmp: TempDir,
    pub db: Arc<DbManager>,
    pub products: Arc<SqliteProductRepository>,
    pub connections: Arc<SqliteConnectionRepository>,
    pub metrics: Arc<SqliteSalesMetricsRepository>,
}

impl TestDatabase {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("temp dir");
        let db = Arc::new(DbManager::new(tmp.path().join("test.db"), 2).expect("db manager"));
        db.run_migrations().expect("migrations");

        Self {
            products: Arc::new(SqliteProductRepository::new(db.clone())),
            connections: Arc::new(SqliteConnectionRepository::new(db.clone())),
            metrics: Arc::new(SqliteSalesMetricsRepository::new(db.clone())),
            _tmp: tmp,
            db,
        }
    }
}

/// Vault with a fixed key so blobs survive helper boundaries within a test.
pub fn test_vault() -> Arc<CredentialVault> {
    Arc::new(CredentialVault::new(vec![7u8; 32]).expect("vault"))
}

/// HTTP client with fast, deterministic retries.
pub fn fast_http_client() -> HttpClient {
    HttpClient::builder()
        .timeout(Duration::from_secs(5))
        .retry_policy(
            RetryPolicy::new(2, Duration::from_millis(2), Duration::from_millis(10))
                .with_jitter_factor(0.0),
        )
        .build()
        .expect("http client")
}

/// Mercado Livre-shaped config with every URL pointed at `base_url`.
pub fn mercadolivre_config(base_url: &str) -> MarketplaceConfig {
    MarketplaceConfig {
        id: MarketplaceId::MercadoLivre,
        display_name: "Mercado Livre".into(),
        auth_url: format!("{base_url}/authorization"),
        token_url: format!("{base_url}/oauth/token"),
        api_url: base_url.to_string(),
        scopes: vec!["write".into(), "read".into(), "offline_access".into()],
        endpoints: EndpointMap {
            products: "/items".into(),
            me: Some("/users/me".into()),
            user_items: Some("/users/{seller_id}/items/search".into()),
            ..Default::default()
        },
        rate_limit: RateLimitPolicy {
            max_requests: 50,
            window_ms: 60_000,
            retry_after_secs: 60,
            timeout_ms: 10_000,
        },
        fallback_auth_domains: vec![],
        connect_input: None,
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
    }
}

/// Nuvemshop-shaped config (flat REST catalog, no connect input) with every
/// URL pointed at `base_url`.
pub fn nuvemshop_config(base_url: &str) -> MarketplaceConfig {
    MarketplaceConfig {
        id: MarketplaceId::Nuvemshop,
        display_name: "Nuvemshop".into(),
        auth_url: format!("{base_url}/apps/authorize"),
        token_url: format!("{base_url}/apps/authorize/token"),
        api_url: base_url.to_string(),
        scopes: vec!["read_products".into(), "write_products".into()],
        endpoints: EndpointMap { products: "/products".into(), ..Default::default() },
        rate_limit: RateLimitPolicy {
            max_requests: 40,
            window_ms: 60_000,
            retry_after_secs: 30,
            timeout_ms: 10_000,
        },
        fallback_auth_domains: vec![],
        connect_input: None,
        client_id: "test-client".into(),
        client_secret: "test-secret".into(),
    }
}

/// Registry holding a single marketplace config.
pub fn registry_with(config: MarketplaceConfig) -> Arc<MarketplaceRegistry> {
    Arc::new(MarketplaceRegistry::from_configs(vec![config]).expect("registry"))
}

/// Credentials expiring `expires_in_secs` from now (negative for already
/// expired), encrypted with the given vault.
pub fn encrypted_credentials(
    vault: &CredentialVault,
    access_token: &str,
    refresh_token: Option<&str>,
    expires_in_secs: Option<i64>,
) -> String {
    let credentials = Credentials {
        access_token: access_token.to_string(),
        refresh_token: refresh_token.map(str::to_string),
        expires_at: expires_in_secs.map(|secs| chrono::Utc::now() + chrono::Duration::seconds(secs)),
        scope: None,
    };
    let plaintext = serde_json::to_string(&credentials).expect("serialize credentials");
    vault.encrypt_to_string(plaintext.as_bytes()).expect("encrypt credentials")
}
