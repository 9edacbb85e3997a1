//! Static registry of supported marketplaces.
//!
//! The registry is built once at startup from compiled-in configuration plus
//! per-marketplace OAuth application credentials sourced from the
//! environment. Every config is validated at build time so a malformed
//! template fails fast instead of at connect time.

use std::collections::HashMap;
use std::sync::Arc;

use mktsync_domain::{
    ConnectInput, EndpointMap, MarketplaceConfig, MarketplaceError, MarketplaceId,
    RateLimitPolicy, Result,
};

use crate::config::AppConfig;
use crate::marketplaces::adapter::MarketplaceAdapter;
use crate::marketplaces::generic::RestCatalogAdapter;
use crate::marketplaces::mercadolivre::MercadoLivreAdapter;
use crate::marketplaces::shopify::ShopifyAdapter;

/// Registry of marketplace configurations and their catalog adapters.
pub struct MarketplaceRegistry {
    configs: HashMap<MarketplaceId, MarketplaceConfig>,
}

impl MarketplaceRegistry {
    /// Build the registry with credentials pulled from the environment.
    pub fn new() -> Result<Self> {
        let configs = MarketplaceId::ALL
            .into_iter()
            .map(|id| {
                let (client_id, client_secret) = AppConfig::client_credentials(id);
                build_config(id, client_id, client_secret)
            })
            .collect::<Vec<_>>();
        Self::from_configs(configs)
    }

    /// Build a registry from explicit configs. Used in tests to point
    /// marketplaces at mock servers.
    pub fn from_configs(configs: Vec<MarketplaceConfig>) -> Result<Self> {
        let mut map = HashMap::with_capacity(configs.len());
        for config in configs {
            config.validate()?;
            map.insert(config.id, config);
        }
        Ok(Self { configs: map })
    }

    /// Look up the config for a marketplace.
    pub fn get(&self, id: MarketplaceId) -> Result<&MarketplaceConfig> {
        self.configs
            .get(&id)
            .ok_or_else(|| MarketplaceError::Config(format!("marketplace not registered: {id}")))
    }

    /// All registered configs, in registry order.
    pub fn all(&self) -> impl Iterator<Item = &MarketplaceConfig> {
        MarketplaceId::ALL.iter().filter_map(|id| self.configs.get(id))
    }

    /// Catalog adapter for a marketplace.
    ///
    /// Mercado Livre and Shopify have bespoke adapters; every other
    /// marketplace speaks a plain REST product list.
    pub fn adapter_for(&self, id: MarketplaceId) -> Result<Arc<dyn MarketplaceAdapter>> {
        let config = self.get(id)?;
        Ok(match id {
            MarketplaceId::MercadoLivre => Arc::new(MercadoLivreAdapter::new(config.clone())),
            MarketplaceId::Shopify => Arc::new(ShopifyAdapter::new(config.clone())),
            _ => Arc::new(RestCatalogAdapter::new(config.clone())),
        })
    }
}

fn rate(max_requests: u32, window_ms: u64, retry_after_secs: u64, timeout_ms: u64) -> RateLimitPolicy {
    RateLimitPolicy { max_requests, window_ms, retry_after_secs, timeout_ms }
}

fn scopes(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn build_config(id: MarketplaceId, client_id: String, client_secret: String) -> MarketplaceConfig {
    match id {
        MarketplaceId::MercadoLivre => MarketplaceConfig {
            id,
            display_name: "Mercado Livre".into(),
            auth_url: "https://auth.mercadolibre.com/authorization".into(),
            token_url: "https://api.mercadolibre.com/oauth/token".into(),
            api_url: "https://api.mercadolibre.com".into(),
            scopes: scopes(&["write", "read", "offline_access"]),
            endpoints: EndpointMap {
                products: "/items".into(),
                orders: Some("/orders/search".into()),
                categories: Some("/sites/MLB/categories".into()),
                inventory: None,
                me: Some("/users/me".into()),
                user_items: Some("/users/{seller_id}/items/search".into()),
            },
            rate_limit: rate(50, 60_000, 60, 10_000),
            fallback_auth_domains: vec![
                "https://auth.mercadolibre.com".into(),
                "https://auth.mercadolibre.com.mx".into(),
                "https://auth.mercadolibre.cl".into(),
            ],
            connect_input: None,
            client_id,
            client_secret,
        },
        MarketplaceId::Amazon => MarketplaceConfig {
            id,
            display_name: "Amazon".into(),
            auth_url: "https://sellercentral.amazon.com/apps/authorize/consent".into(),
            token_url: "https://api.amazon.com/auth/o2/token".into(),
            api_url: "https://sellingpartnerapi-na.amazon.com".into(),
            scopes: scopes(&["sellingpartnerapi::catalog", "sellingpartnerapi::inventory"]),
            endpoints: EndpointMap {
                products: "/catalog/v2022-04-01/items".into(),
                orders: Some("/orders/v0/orders".into()),
                inventory: Some("/fba/inventory/v1/summaries".into()),
                ..Default::default()
            },
            rate_limit: rate(100, 60_000, 60, 15_000),
            fallback_auth_domains: vec![],
            connect_input: None,
            client_id,
            client_secret,
        },
        MarketplaceId::Shopify => MarketplaceConfig {
            id,
            display_name: "Shopify".into(),
            auth_url: "https://{shop}.myshopify.com/admin/oauth/authorize".into(),
            token_url: "https://{shop}.myshopify.com/admin/oauth/access_token".into(),
            api_url: "https://{shop}.myshopify.com/admin/api/2024-01".into(),
            scopes: scopes(&["read_products", "write_products", "read_inventory"]),
            endpoints: EndpointMap {
                products: "/products.json".into(),
                orders: Some("/orders.json".into()),
                inventory: Some("/inventory_levels.json".into()),
                ..Default::default()
            },
            rate_limit: rate(40, 60_000, 30, 10_000),
            fallback_auth_domains: vec![],
            connect_input: Some(ConnectInput::ShopDomain),
            client_id,
            client_secret,
        },
        MarketplaceId::WooCommerce => MarketplaceConfig {
            id,
            display_name: "WooCommerce".into(),
            auth_url: "{site_url}/wc-auth/v1/authorize".into(),
            token_url: "{site_url}/wc-auth/v1/access_token".into(),
            api_url: "{site_url}/wp-json/wc/v3".into(),
            scopes: scopes(&["read_write"]),
            endpoints: EndpointMap {
                products: "/products".into(),
                orders: Some("/orders".into()),
                categories: Some("/products/categories".into()),
                ..Default::default()
            },
            rate_limit: rate(40, 60_000, 30, 10_000),
            fallback_auth_domains: vec![],
            connect_input: Some(ConnectInput::SiteUrl),
            client_id,
            client_secret,
        },
        MarketplaceId::Shopee => MarketplaceConfig {
            id,
            display_name: "Shopee".into(),
            auth_url: "https://partner.shopeemobile.com/api/v2/shop/auth_partner".into(),
            token_url: "https://partner.shopeemobile.com/api/v2/auth/token/get".into(),
            api_url: "https://partner.shopeemobile.com/api/v2".into(),
            scopes: scopes(&["item.base", "item.fullinfo"]),
            endpoints: EndpointMap {
                products: "/product/get_item_list".into(),
                orders: Some("/order/get_order_list".into()),
                ..Default::default()
            },
            rate_limit: rate(1000, 60_000, 10, 10_000),
            fallback_auth_domains: vec![],
            connect_input: None,
            client_id,
            client_secret,
        },
        MarketplaceId::Magento => MarketplaceConfig {
            id,
            display_name: "Magento".into(),
            auth_url: "{site_url}/oauth/authorize".into(),
            token_url: "{site_url}/oauth/token".into(),
            api_url: "{site_url}/rest/V1".into(),
            scopes: scopes(&["catalog", "inventory"]),
            endpoints: EndpointMap {
                products: "/products".into(),
                orders: Some("/orders".into()),
                categories: Some("/categories".into()),
                ..Default::default()
            },
            rate_limit: rate(40, 60_000, 30, 10_000),
            fallback_auth_domains: vec![],
            connect_input: Some(ConnectInput::SiteUrl),
            client_id,
            client_secret,
        },
        MarketplaceId::Vtex => MarketplaceConfig {
            id,
            display_name: "VTEX".into(),
            auth_url: "https://{account_name}.myvtex.com/admin/oauth/authorize".into(),
            token_url: "https://{account_name}.myvtex.com/api/vtexid/oauth/token".into(),
            api_url: "https://{account_name}.vtexcommercestable.com.br/api".into(),
            scopes: scopes(&["catalog_read", "catalog_write"]),
            endpoints: EndpointMap {
                products: "/catalog_system/pvt/products/GetProductAndSkuIds".into(),
                orders: Some("/oms/pvt/orders".into()),
                ..Default::default()
            },
            rate_limit: rate(50, 60_000, 30, 10_000),
            fallback_auth_domains: vec![],
            connect_input: Some(ConnectInput::AccountName),
            client_id,
            client_secret,
        },
        MarketplaceId::Nuvemshop => MarketplaceConfig {
            id,
            display_name: "Nuvemshop".into(),
            auth_url: "https://www.nuvemshop.com.br/apps/authorize".into(),
            token_url: "https://www.nuvemshop.com.br/apps/authorize/token".into(),
            api_url: "https://api.nuvemshop.com.br/v1".into(),
            scopes: scopes(&["read_products", "write_products"]),
            endpoints: EndpointMap {
                products: "/products".into(),
                orders: Some("/orders".into()),
                categories: Some("/categories".into()),
                ..Default::default()
            },
            rate_limit: rate(40, 60_000, 30, 10_000),
            fallback_auth_domains: vec![],
            connect_input: None,
            client_id,
            client_secret,
        },
    }
}
