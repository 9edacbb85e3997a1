//! Marketplace integration layer: registry, adapters, OAuth flows, token
//! lifecycle, and the sync engine.

pub mod adapter;
pub mod generic;
pub mod mercadolivre;
pub mod oauth;
pub mod registry;
pub mod shopify;
pub mod sync;
pub mod token_manager;
