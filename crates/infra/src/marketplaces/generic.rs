//! Generic REST catalog adapter.
//!
//! Covers marketplaces whose product endpoint returns a flat list of objects
//! with conventional field names (Amazon, WooCommerce, Shopee, Magento,
//! VTEX, Nuvemshop). The list may be a bare JSON array or wrapped in a
//! `products`/`items`/`data` envelope.

use async_trait::async_trait;
use mktsync_domain::{
    Dimensions, MarketplaceConfig, MarketplaceError, MarketplaceId, Product, ProductImages,
    ProductMetadata, ProductStatus, Result, SourceListing,
};
use serde::Deserialize;
use serde_json::Value;

use crate::http::ApiClient;
use crate::marketplaces::adapter::{MarketplaceAdapter, RemoteListing};

const BATCH_SIZE: usize = 10;

pub struct RestCatalogAdapter {
    config: MarketplaceConfig,
}

impl RestCatalogAdapter {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Default, Deserialize)]
struct RestDimensions {
    #[serde(default)]
    weight: Option<f64>,
    #[serde(default)]
    length: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RestProduct {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    price: Option<Value>,
    #[serde(default)]
    stock_quantity: Option<Value>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    brand: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    dimensions: Option<RestDimensions>,
    #[serde(default)]
    main_image: Option<String>,
    #[serde(default)]
    additional_images: Vec<String>,
    #[serde(default)]
    ean: Option<String>,
    #[serde(default)]
    warranty: Option<Value>,
}

#[async_trait]
impl MarketplaceAdapter for RestCatalogAdapter {
    fn marketplace(&self) -> MarketplaceId {
        self.config.id
    }

    fn batch_size(&self) -> usize {
        BATCH_SIZE
    }

    async fn fetch_listing_refs(&self, api: &ApiClient) -> Result<Vec<RemoteListing>> {
        let body: Value = api.get_json(&self.config.endpoints.products).await?;
        let items = unwrap_list(body);

        Ok(items
            .into_iter()
            .map(|payload| {
                let id = payload
                    .get("id")
                    .or_else(|| payload.get("sku"))
                    .map(value_to_string)
                    .unwrap_or_default();
                RemoteListing::with_payload(id, payload)
            })
            .collect())
    }

    async fn load_product(
        &self,
        _api: &ApiClient,
        user_id: &str,
        listing: &RemoteListing,
    ) -> Result<Product> {
        let payload = listing.payload.clone().ok_or_else(|| {
            MarketplaceError::Internal(format!(
                "{} listing {} has no payload",
                self.config.id, listing.id
            ))
        })?;

        let remote: RestProduct = serde_json::from_value(payload).map_err(|e| {
            MarketplaceError::Internal(format!(
                "failed to parse {} product {}: {e}",
                self.config.id, listing.id
            ))
        })?;

        map_product(self.config.id, user_id, remote)
    }
}

/// Accept a bare array or the common wrapper envelopes.
fn unwrap_list(body: Value) -> Vec<Value> {
    match body {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in ["products", "items", "data"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return items;
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn parse_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn parse_u32(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().map(|n| n as u32),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn map_product(marketplace: MarketplaceId, user_id: &str, remote: RestProduct) -> Result<Product> {
    let listing_id = remote.id.as_ref().map(value_to_string);

    let sku = remote
        .sku
        .filter(|s| !s.is_empty())
        .or_else(|| listing_id.clone())
        .ok_or_else(|| {
            MarketplaceError::InvalidInput(format!("{marketplace}: product has neither sku nor id"))
        })?;

    let name = remote.name.or(remote.title).unwrap_or_else(|| sku.clone());

    let mut images = Vec::new();
    if let Some(main) = remote.main_image {
        images.push(main);
    }
    images.extend(remote.additional_images);

    let dimensions = remote.dimensions.map(|d| Dimensions {
        weight: d.weight,
        length: d.length,
        width: d.width,
        height: d.height,
    });

    let status = match remote.status.as_deref() {
        Some("active") | Some("publish") | Some("enabled") | None => ProductStatus::Active,
        Some(_) => ProductStatus::Inactive,
    };

    let metadata = ProductMetadata {
        brand: remote.brand.filter(|b| !b.is_empty()),
        category: remote.category.filter(|c| !c.is_empty()),
        dimensions: dimensions.filter(|d| !d.is_empty()),
        images: ProductImages::from_ordered(images),
        ean: remote.ean.filter(|e| !e.is_empty()),
        warranty: remote.warranty.as_ref().and_then(parse_u32),
        source: listing_id.map(|listing_id| SourceListing {
            marketplace,
            listing_id,
            category_id: None,
            listing_type: None,
        }),
    };

    Ok(Product {
        user_id: user_id.to_string(),
        sku,
        name,
        description: remote.description,
        price: remote.price.as_ref().and_then(parse_f64).unwrap_or(0.0),
        stock_quantity: remote.stock_quantity.as_ref().and_then(parse_u32).unwrap_or(0),
        status,
        metadata,
    })
}
