//! SQLite persistence layer.

pub mod connection_repository;
pub mod manager;
pub mod product_repository;
pub mod sales_metrics_repository;

pub use connection_repository::SqliteConnectionRepository;
pub use product_repository::SqliteProductRepository;
pub use sales_metrics_repository::SqliteSalesMetricsRepository;
