//! Mercado Livre catalog adapter.
//!
//! Listing enumeration is two-step: `/users/me` resolves the seller id, then
//! the seller-items search returns listing ids only. Each listing is loaded
//! individually with `GET /items/{id}` during the batch phase.

use async_trait::async_trait;
use mktsync_domain::{
    MarketplaceConfig, MarketplaceError, MarketplaceId, Product, ProductImages, ProductMetadata,
    ProductStatus, Result, SourceListing,
};
use serde::Deserialize;
use tracing::debug;

use crate::http::ApiClient;
use crate::marketplaces::adapter::{MarketplaceAdapter, RemoteListing};

const BATCH_SIZE: usize = 20;

const ATTR_BRAND: &str = "BRAND";
const ATTR_GTIN: &str = "GTIN";
const ATTR_WARRANTY_TIME: &str = "WARRANTY_TIME";

pub struct MercadoLivreAdapter {
    config: MarketplaceConfig,
}

impl MercadoLivreAdapter {
    pub fn new(config: MarketplaceConfig) -> Self {
        Self { config }
    }
}

#[derive(Debug, Deserialize)]
struct MlUser {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct MlItemSearch {
    #[serde(default)]
    results: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MlPicture {
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MlAttribute {
    id: String,
    #[serde(default)]
    value_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MlItem {
    id: String,
    title: String,
    #[serde(default)]
    category_id: Option<String>,
    #[serde(default)]
    price: Option<f64>,
    #[serde(default)]
    available_quantity: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    listing_type_id: Option<String>,
    #[serde(default)]
    pictures: Vec<MlPicture>,
    #[serde(default)]
    attributes: Vec<MlAttribute>,
}

impl MlItem {
    fn attribute(&self, id: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.id == id)
            .and_then(|attr| attr.value_name.as_deref())
    }
}

#[async_trait]
impl MarketplaceAdapter for MercadoLivreAdapter {
    fn marketplace(&self) -> MarketplaceId {
        MarketplaceId::MercadoLivre
    }

    fn batch_size(&self) -> usize {
        BATCH_SIZE
    }

    async fn fetch_listing_refs(&self, api: &ApiClient) -> Result<Vec<RemoteListing>> {
        let me_path = self.config.endpoints.me.as_deref().ok_or_else(|| {
            MarketplaceError::Config("mercadolivre: me endpoint missing".into())
        })?;
        let user: MlUser = api.get_json(me_path).await?;

        let seller_id = user.id.to_string();
        let search_path =
            self.config.endpoints.user_items_for(&seller_id).ok_or_else(|| {
                MarketplaceError::Config("mercadolivre: user_items endpoint missing".into())
            })?;

        let search: MlItemSearch = api.get_json(&search_path).await?;
        debug!(seller_id = %seller_id, listings = search.results.len(), "enumerated seller items");

        Ok(search.results.into_iter().map(RemoteListing::by_id).collect())
    }

    async fn load_product(
        &self,
        api: &ApiClient,
        user_id: &str,
        listing: &RemoteListing,
    ) -> Result<Product> {
        let path = format!(
            "{}/{}",
            self.config.endpoints.products.trim_end_matches('/'),
            listing.id
        );
        let item: MlItem = api.get_json(&path).await?;
        Ok(map_item(user_id, item))
    }
}

fn map_item(user_id: &str, item: MlItem) -> Product {
    let images: Vec<String> = item
        .pictures
        .iter()
        .filter_map(|p| p.source.clone().or_else(|| p.url.clone()))
        .collect();

    let warranty = item
        .attribute(ATTR_WARRANTY_TIME)
        .and_then(|value| value.split_whitespace().next())
        .and_then(|n| n.parse::<u32>().ok());

    let status = match item.status.as_deref() {
        Some("active") | None => ProductStatus::Active,
        Some(_) => ProductStatus::Inactive,
    };

    let metadata = ProductMetadata {
        brand: item.attribute(ATTR_BRAND).map(str::to_string),
        category: item.category_id.clone(),
        dimensions: None,
        images: ProductImages::from_ordered(images),
        ean: item.attribute(ATTR_GTIN).map(str::to_string),
        warranty,
        source: Some(SourceListing {
            marketplace: MarketplaceId::MercadoLivre,
            listing_id: item.id.clone(),
            category_id: item.category_id.clone(),
            listing_type: item.listing_type_id.clone(),
        }),
    };

    Product {
        user_id: user_id.to_string(),
        sku: item.id,
        name: item.title,
        description: None,
        price: item.price.unwrap_or(0.0),
        stock_quantity: item.available_quantity.unwrap_or(0),
        status,
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn item_from_json(value: serde_json::Value) -> MlItem {
        serde_json::from_value(value).expect("item parses")
    }

    #[test]
    fn maps_attributes_into_metadata() {
        let item = item_from_json(json!({
            "id": "MLB123",
            "title": "Fone Bluetooth",
            "category_id": "MLB1051",
            "price": 149.9,
            "available_quantity": 12,
            "status": "active",
            "listing_type_id": "gold_special",
            "pictures": [
                {"source": "https://http2.mlstatic.com/a.jpg"},
                {"source": "https://http2.mlstatic.com/b.jpg"}
            ],
            "attributes": [
                {"id": "BRAND", "value_name": "JBL"},
                {"id": "GTIN", "value_name": "7891234567890"},
                {"id": "WARRANTY_TIME", "value_name": "12 meses"}
            ]
        }));

        let product = map_item("user-1", item);

        assert_eq!(product.sku, "MLB123");
        assert_eq!(product.name, "Fone Bluetooth");
        assert_eq!(product.price, 149.9);
        assert_eq!(product.stock_quantity, 12);
        assert_eq!(product.status, ProductStatus::Active);
        assert_eq!(product.metadata.brand.as_deref(), Some("JBL"));
        assert_eq!(product.metadata.ean.as_deref(), Some("7891234567890"));
        assert_eq!(product.metadata.warranty, Some(12));
        assert_eq!(
            product.metadata.images.main.as_deref(),
            Some("https://http2.mlstatic.com/a.jpg")
        );
        assert_eq!(product.metadata.images.additional.len(), 1);

        let source = product.metadata.source.expect("source listing");
        assert_eq!(source.listing_id, "MLB123");
        assert_eq!(source.category_id.as_deref(), Some("MLB1051"));
        assert_eq!(source.listing_type.as_deref(), Some("gold_special"));
    }

    #[test]
    fn tolerates_sparse_items() {
        let item = item_from_json(json!({"id": "MLB9", "title": "Sem preço"}));
        let product = map_item("user-1", item);

        assert_eq!(product.price, 0.0);
        assert_eq!(product.stock_quantity, 0);
        assert!(product.metadata.brand.is_none());
        assert!(product.metadata.images.main.is_none());
        assert_eq!(product.status, ProductStatus::Active);
    }

    #[test]
    fn paused_listing_maps_to_inactive() {
        let item = item_from_json(json!({"id": "MLB5", "title": "Pausado", "status": "paused"}));
        assert_eq!(map_item("user-1", item).status, ProductStatus::Inactive);
    }

    #[test]
    fn non_numeric_warranty_is_dropped() {
        let item = item_from_json(json!({
            "id": "MLB7",
            "title": "Garantia texto",
            "attributes": [{"id": "WARRANTY_TIME", "value_name": "sem garantia"}]
        }));
        assert!(map_item("user-1", item).metadata.warranty.is_none());
    }
}
