//! # MktSync Infra
//!
//! Infrastructure layer - all external system interactions.
//!
//! This crate contains:
//! - HTTP client with retry and auth-domain fallback
//! - OAuth flow controller and token refresh manager
//! - Marketplace registry and per-marketplace adapters
//! - SQLite persistence (products, connections, sales metrics)
//! - Sync engine orchestrating batched catalog imports

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod identity;
pub mod marketplaces;
pub mod storage;

pub use config::AppConfig;
pub use database::manager::DbManager;
pub use database::{
    SqliteConnectionRepository, SqliteProductRepository, SqliteSalesMetricsRepository,
};
pub use errors::InfraError;
pub use http::{ApiClient, HttpClient};
pub use identity::InMemoryIdentityProvider;
pub use marketplaces::adapter::{MarketplaceAdapter, RemoteListing};
pub use marketplaces::oauth::{AuthorizationRequest, InMemoryFlowStateStore, OAuthFlowController};
pub use marketplaces::registry::MarketplaceRegistry;
pub use marketplaces::sync::SyncEngine;
pub use marketplaces::token_manager::TokenRefreshManager;
pub use storage::LocalBlobStore;
