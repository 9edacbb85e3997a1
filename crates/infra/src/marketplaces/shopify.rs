//! Shopify catalog adapter.
//!
//! `/products.json` returns full product bodies, so enumeration embeds each
//! body in the listing payload and the load phase maps in memory without a
//! further network call. Shopify sends the token in the
//! `X-Shopify-Access-Token` header; the token manager configures the client
//! accordingly.

use async_trait::async_trait;
use mktsync_domain::{
    MarketplaceConfig, MarketplaceError, MarketplaceId, Product, ProductImages, ProductMetadata,
    ProductStatus, Result, SourceListing,
};
use serde::Deserialize;

use crate::http::ApiClient;
use crate::marketplaces::adapter::{MarketplaceAdapter, RemoteListing};

const BATCH_SIZE: usize = 10;

pub struct ShopifyAdapter {
    config: MarketplaceConfig,
}

impl ShopifyAdapter {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Deserialize)]
struct ProductsEnvelope {
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ShopifyVariant {
    #[serde(default)]
    sku: Option<String>,
    #[serde(default)]
    price: Option<String>,
    #[serde(default)]
    inventory_quantity: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ShopifyImage {
    src: String,
}

#[derive(Debug, Deserialize)]
struct ShopifyProduct {
    id: u64,
    title: String,
    #[serde(default)]
    body_html: Option<String>,
    #[serde(default)]
    vendor: Option<String>,
    #[serde(default)]
    product_type: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    variants: Vec<ShopifyVariant>,
    #[serde(default)]
    images: Vec<ShopifyImage>,
}

#[async_trait]
impl MarketplaceAdapter for ShopifyAdapter {
    fn marketplace(&self) -> MarketplaceId {
        MarketplaceId::Shopify
    }

    fn batch_size(&self) -> usize {
        BATCH_SIZE
    }

    async fn fetch_listing_refs(&self, api: &ApiClient) -> Result<Vec<RemoteListing>> {
        let envelope: ProductsEnvelope =
            api.get_json(&self.config.endpoints.products).await?;

        Ok(envelope
            .products
            .into_iter()
            .map(|payload| {
                let id = payload["id"]
                    .as_u64()
                    .map(|n| n.to_string())
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
            MarketplaceError::Internal(format!("shopify listing {} has no payload", listing.id))
        })?;

        let product: ShopifyProduct = serde_json::from_value(payload).map_err(|e| {
            MarketplaceError::Internal(format!(
                "failed to parse shopify product {}: {e}",
                listing.id
            ))
        })?;

        Ok(map_product(user_id, product))
    }
}

fn map_product(user_id: &str, product: ShopifyProduct) -> Product {
    let listing_id = product.id.to_string();
    let first_variant = product.variants.first();

    let sku = first_variant
        .and_then(|v| v.sku.as_deref())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| listing_id.clone());

    let price = first_variant
        .and_then(|v| v.price.as_deref())
        .and_then(|p| p.parse::<f64>().ok())
        .unwrap_or(0.0);

    let stock_quantity = first_variant
        .and_then(|v| v.inventory_quantity)
        .map(|q| q.max(0) as u32)
        .unwrap_or(0);

    let status = match product.status.as_deref() {
        Some("active") | None => ProductStatus::Active,
        Some(_) => ProductStatus::Inactive,
    };

    let images: Vec<String> = product.images.into_iter().map(|i| i.src).collect();

    let metadata = ProductMetadata {
        brand: product.vendor.filter(|v| !v.is_empty()),
        category: product.product_type.filter(|t| !t.is_empty()),
        dimensions: None,
        images: ProductImages::from_ordered(images),
        ean: None,
        warranty: None,
        source: Some(SourceListing {
            marketplace: MarketplaceId::Shopify,
            listing_id,
            category_id: None,
            listing_type: None,
        }),
    };

    Product {
        user_id: user_id.to_string(),
        sku,
        name: product.title,
        description: product.body_html,
        price,
        stock_quantity,
        status,
        metadata,
    }
}
