//! Domain types and models

pub mod connection;
pub mod marketplace;
pub mod product;
pub mod sync;
pub mod user;

pub use connection::MarketplaceConnection;
pub use marketplace::{
    ConnectInput, EndpointMap, MarketplaceConfig, MarketplaceId, RateLimitPolicy,
};
pub use product::{Dimensions, Product, ProductImages, ProductMetadata, ProductStatus, SourceListing};
pub use sync::{SalesMetric, SyncItemError, SyncReport, MAX_SYNC_ERRORS};
pub use user::User;
