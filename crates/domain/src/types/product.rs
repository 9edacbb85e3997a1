//! Canonical product schema.
//!
//! Remote listings from every marketplace are mapped into this shape before
//! being upserted into local storage. Marketplace-specific fields that have
//! no canonical home survive inside [`SourceListing`].

use serde::{Deserialize, Serialize};

use crate::types::marketplace::MarketplaceId;

/// Lifecycle status of a product. Anything other than `active` is treated as
/// inactive for sync purposes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductStatus {
    #[default]
    Active,
    #[serde(other)]
    Inactive,
}

/// Physical dimensions, in the seller's configured units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

impl Dimensions {
    pub fn is_empty(&self) -> bool {
        self.weight.is_none() && self.length.is_none() && self.width.is_none() && self.height.is_none()
    }
}

/// Product imagery. The first remote image becomes `main`; the remainder are
/// kept in order as `additional`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductImages {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default)]
    pub additional: Vec<String>,
}

impl ProductImages {
    /// Split an ordered image list into main + additional.
    pub fn from_ordered(mut urls: Vec<String>) -> Self {
        if urls.is_empty() {
            return Self::default();
        }
        let main = Some(urls.remove(0));
        Self { main, additional: urls }
    }
}

/// Marketplace-specific extension fields carried alongside the canonical
/// product (source listing id, remote category, listing type).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceListing {
    pub marketplace: MarketplaceId,
    pub listing_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<String>,
}

/// Free-form product metadata block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
    #[serde(default)]
    pub images: ProductImages,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ean: Option<String>,
    /// Warranty length in months.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceListing>,
}

/// Canonical product record, one per (user, sku) conceptually; uniqueness is
/// enforced by the store's conflict key, not at this layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub user_id: String,
    pub sku: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Currency-agnostic numeric price.
    pub price: f64,
    pub stock_quantity: u32,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub metadata: ProductMetadata,
}
