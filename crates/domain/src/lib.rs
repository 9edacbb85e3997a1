//! # MktSync Domain
//!
//! Business domain types and models for MktSync.
//!
//! This crate contains:
//! - Marketplace configuration records and identifiers
//! - Canonical product, connection, and sync-result types
//! - Domain error taxonomy and Result definitions
//!
//! ## Architecture
//! - No dependencies on other MktSync crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod errors;
pub mod types;

// Re-export commonly used items
pub use errors::*;
pub use types::*;
