//! Marketplace identifiers and static configuration records.
//!
//! One [`MarketplaceConfig`] exists per supported marketplace. A config is
//! self-describing enough to drive both the OAuth flow and API calls without
//! marketplace-specific branching elsewhere: endpoints, scopes, rate limits,
//! fallback auth domains, and (for marketplaces whose URLs are templated) the
//! kind of user-supplied input that must be substituted before first use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::MarketplaceError;

/// Identifier for a supported marketplace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketplaceId {
    MercadoLivre,
    Amazon,
    Shopify,
    WooCommerce,
    Shopee,
    Magento,
    Vtex,
    Nuvemshop,
}

impl MarketplaceId {
    /// All supported marketplaces, in registry order.
    pub const ALL: [MarketplaceId; 8] = [
        MarketplaceId::MercadoLivre,
        MarketplaceId::Amazon,
        MarketplaceId::Shopify,
        MarketplaceId::WooCommerce,
        MarketplaceId::Shopee,
        MarketplaceId::Magento,
        MarketplaceId::Vtex,
        MarketplaceId::Nuvemshop,
    ];

    /// Canonical lowercase identifier used in storage and URLs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MercadoLivre => "mercadolivre",
            Self::Amazon => "amazon",
            Self::Shopify => "shopify",
            Self::WooCommerce => "woocommerce",
            Self::Shopee => "shopee",
            Self::Magento => "magento",
            Self::Vtex => "vtex",
            Self::Nuvemshop => "nuvemshop",
        }
    }
}

impl fmt::Display for MarketplaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MarketplaceId {
    type Err = MarketplaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mercadolivre" => Ok(Self::MercadoLivre),
            "amazon" => Ok(Self::Amazon),
            "shopify" => Ok(Self::Shopify),
            "woocommerce" => Ok(Self::WooCommerce),
            "shopee" => Ok(Self::Shopee),
            "magento" => Ok(Self::Magento),
            "vtex" => Ok(Self::Vtex),
            "nuvemshop" => Ok(Self::Nuvemshop),
            other => Err(MarketplaceError::Config(format!("unknown marketplace: {other}"))),
        }
    }
}

/// Per-marketplace rate-limit policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Maximum requests allowed per window.
    pub max_requests: u32,
    /// Rate-limit window in milliseconds.
    pub window_ms: u64,
    /// Suggested wait after a 429, in seconds.
    pub retry_after_secs: u64,
    /// Per-request timeout in milliseconds.
    pub timeout_ms: u64,
}

/// Endpoint path map for a marketplace's REST surface.
///
/// Paths are relative to the (resolved) API base URL. `user_items` is a
/// template containing `{seller_id}`, resolved at call time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointMap {
    pub products: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orders: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub me: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_items: Option<String>,
}

impl EndpointMap {
    /// Resolve the seller-items path template for a concrete seller id.
    pub fn user_items_for(&self, seller_id: &str) -> Option<String> {
        self.user_items.as_ref().map(|t| t.replace("{seller_id}", seller_id))
    }
}

/// Kind of user-supplied input a marketplace requires before its templated
/// URLs can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectInput {
    /// Shopify shop name, substituted into `{shop}`.
    ShopDomain,
    /// Full site URL (WooCommerce, Magento), substituted into `{site_url}`.
    SiteUrl,
    /// VTEX account name, substituted into `{account_name}`.
    AccountName,
}

impl ConnectInput {
    pub fn placeholder(&self) -> &'static str {
        match self {
            Self::ShopDomain => "{shop}",
            Self::SiteUrl => "{site_url}",
            Self::AccountName => "{account_name}",
        }
    }
}

/// Immutable configuration record for one marketplace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketplaceConfig {
    pub id: MarketplaceId,
    pub display_name: String,
    /// Authorization URL; may contain a placeholder (see `connect_input`).
    pub auth_url: String,
    /// Token URL; may contain a placeholder.
    pub token_url: String,
    /// API base URL; may contain a placeholder.
    pub api_url: String,
    /// OAuth scopes, in request order.
    pub scopes: Vec<String>,
    pub endpoints: EndpointMap,
    pub rate_limit: RateLimitPolicy,
    /// Alternative auth domains tried in order on DNS/connection failure.
    #[serde(default)]
    pub fallback_auth_domains: Vec<String>,
    /// Input the user must supply before templated URLs resolve.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_input: Option<ConnectInput>,
    pub client_id: String,
    pub client_secret: String,
}

impl MarketplaceConfig {
    /// OAuth scopes joined for the `scope` query parameter.
    pub fn scope_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Whether the templated URLs still carry an unresolved placeholder.
    pub fn needs_connect_input(&self) -> bool {
        self.connect_input.is_some()
    }

    /// Produce a copy with the connect-time placeholder substituted.
    ///
    /// Marketplaces without templated URLs ignore `input`. For templated
    /// marketplaces a missing or blank input is a precondition failure and
    /// must abort the connect flow before any network call.
    pub fn resolved(&self, input: Option<&str>) -> Result<MarketplaceConfig, MarketplaceError> {
        let Some(kind) = self.connect_input else {
            return Ok(self.clone());
        };

        let value = input.map(str::trim).filter(|v| !v.is_empty()).ok_or_else(|| {
            MarketplaceError::InvalidInput(format!(
                "{} requires {} before connecting",
                self.id,
                kind.placeholder()
            ))
        })?;

        let placeholder = kind.placeholder();
        let mut resolved = self.clone();
        resolved.auth_url = resolved.auth_url.replace(placeholder, value);
        resolved.token_url = resolved.token_url.replace(placeholder, value);
        resolved.api_url = resolved.api_url.replace(placeholder, value);
        resolved.connect_input = None;
        Ok(resolved)
    }

    /// Token endpoint chain: the primary token URL followed by fallback
    /// domains with `/oauth/token` appended. Tried in order when the
    /// primary auth domain is unreachable.
    pub fn token_url_chain(&self) -> Vec<String> {
        let mut chain = vec![self.token_url.clone()];
        chain.extend(
            self.fallback_auth_domains
                .iter()
                .map(|domain| format!("{}/oauth/token", domain.trim_end_matches('/'))),
        );
        chain
    }

    /// Validate structural invariants. Called once at registry build time.
    pub fn validate(&self) -> Result<(), MarketplaceError> {
        if self.auth_url.is_empty() || self.token_url.is_empty() || self.api_url.is_empty() {
            return Err(MarketplaceError::Config(format!("{}: empty URL in config", self.id)));
        }
        if self.endpoints.products.is_empty() {
            return Err(MarketplaceError::Config(format!(
                "{}: products endpoint is required",
                self.id
            )));
        }
        if let Some(kind) = self.connect_input {
            let placeholder = kind.placeholder();
            for (field, url) in
                [("auth_url", &self.auth_url), ("token_url", &self.token_url), ("api_url", &self.api_url)]
            {
                if !url.contains(placeholder) {
                    return Err(MarketplaceError::Config(format!(
                        "{}: {field} must contain {placeholder}",
                        self.id
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for types::marketplace.
    use super::*;

    fn templated_config() -> MarketplaceConfig {
        MarketplaceConfig {
            id: MarketplaceId::Shopify,
            display_name: "Shopify".into(),
            auth_url: "https://{shop}.myshopify.com/admin/oauth/authorize".into(),
            token_url: "https://{shop}.myshopify.com/admin/oauth/access_token".into(),
            api_url: "https://{shop}.myshopify.com/admin/api/2024-01".into(),
            scopes: vec!["read_products".into(), "write_products".into()],
            endpoints: EndpointMap { products: "/products.json".into(), ..Default::default() },
            rate_limit: RateLimitPolicy {
                max_requests: 40,
                window_ms: 60_000,
                retry_after_secs: 30,
                timeout_ms: 10_000,
            },
            fallback_auth_domains: vec![],
            connect_input: Some(ConnectInput::ShopDomain),
            client_id: "client".into(),
            client_secret: "secret".into(),
        }
    }

    #[test]
    fn marketplace_id_round_trips_through_str() {
        for id in MarketplaceId::ALL {
            assert_eq!(id.as_str().parse::<MarketplaceId>().unwrap(), id);
        }
    }

    #[test]
    fn unknown_marketplace_id_is_config_error() {
        let err = "ebay".parse::<MarketplaceId>().unwrap_err();
        assert_eq!(err.code(), "CONFIG_ERROR");
    }

    #[test]
    fn resolved_substitutes_placeholder_in_all_urls() {
        let config = templated_config();
        let resolved = config.resolved(Some("acme-store")).unwrap();
        assert_eq!(resolved.auth_url, "https://acme-store.myshopify.com/admin/oauth/authorize");
        assert_eq!(
            resolved.token_url,
            "https://acme-store.myshopify.com/admin/oauth/access_token"
        );
        assert_eq!(resolved.api_url, "https://acme-store.myshopify.com/admin/api/2024-01");
        assert!(!resolved.needs_connect_input());
    }

    #[test]
    fn resolved_rejects_missing_input() {
        let config = templated_config();
        assert!(matches!(config.resolved(None), Err(MarketplaceError::InvalidInput(_))));
        assert!(matches!(config.resolved(Some("  ")), Err(MarketplaceError::InvalidInput(_))));
    }

    #[test]
    fn validate_requires_placeholder_when_templated() {
        let mut config = templated_config();
        config.api_url = "https://fixed.example.com".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn token_url_chain_appends_oauth_token_to_fallbacks() {
        let mut config = templated_config();
        config.token_url = "https://api.example.com/oauth/token".into();
        config.fallback_auth_domains =
            vec!["https://auth.example.com.mx".into(), "https://auth.example.cl/".into()];

        assert_eq!(
            config.token_url_chain(),
            vec![
                "https://api.example.com/oauth/token".to_string(),
                "https://auth.example.com.mx/oauth/token".to_string(),
                "https://auth.example.cl/oauth/token".to_string(),
            ]
        );
    }

    #[test]
    fn user_items_template_resolves_seller_id() {
        let endpoints = EndpointMap {
            products: "/items".into(),
            user_items: Some("/users/{seller_id}/items/search".into()),
            ..Default::default()
        };
        assert_eq!(
            endpoints.user_items_for("12345").as_deref(),
            Some("/users/12345/items/search")
        );
    }
}
