//! # MktSync Core
//!
//! Pure business interfaces - no infrastructure dependencies.
//!
//! This crate contains the port traits implemented by the infra layer:
//! catalog persistence, connection storage, OAuth flow state, identity, and
//! blob storage. All external dependencies flow through these traits so the
//! orchestration logic stays testable.

pub mod catalog;
pub mod connections;
pub mod identity;
pub mod storage;

pub use catalog::ports::{ProductRepository, SalesMetricsRepository};
pub use connections::ports::{ConnectionRepository, FlowStateStore, PendingFlow};
pub use identity::ports::IdentityProvider;
pub use storage::ports::{object_key, BlobStore};
