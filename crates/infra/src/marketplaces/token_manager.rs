//! Access-token lifecycle.
//!
//! Hands out authenticated API clients for connected marketplaces,
//! refreshing tokens transparently when they are within the expiry
//! threshold. A refresh rejected by the provider (400/401) disables the
//! connection and surfaces `ReauthRequired`; transient failures leave the
//! connection enabled.

use std::collections::HashMap;
use std::sync::Arc;

use mktsync_common::{Credentials, CredentialVault, TokenResponse};
use mktsync_core::ConnectionRepository;
use mktsync_domain::{MarketplaceConnection, MarketplaceError, MarketplaceId, Result};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::http::{ApiClient, HttpClient};
use crate::marketplaces::registry::MarketplaceRegistry;

/// Tokens expiring within this many seconds are refreshed before use.
const REFRESH_THRESHOLD_SECS: i64 = 300;

const SHOPIFY_AUTH_HEADER: &str = "X-Shopify-Access-Token";

struct CachedClient {
    api: ApiClient,
    credentials: Credentials,
}

/// Caches one authenticated client per (user, marketplace) and keeps its
/// token fresh.
pub struct TokenRefreshManager {
    registry: Arc<MarketplaceRegistry>,
    http: HttpClient,
    vault: Arc<CredentialVault>,
    connections: Arc<dyn ConnectionRepository>,
    cache: RwLock<HashMap<(String, MarketplaceId), CachedClient>>,
}

impl TokenRefreshManager {
    pub fn new(
        registry: Arc<MarketplaceRegistry>,
        http: HttpClient,
        vault: Arc<CredentialVault>,
        connections: Arc<dyn ConnectionRepository>,
    ) -> Self {
        Self { registry, http, vault, connections, cache: RwLock::new(HashMap::new()) }
    }

    /// Authenticated client for a (user, marketplace), refreshing the token
    /// first when it is expired or close to expiry.
    pub async fn get_client(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
    ) -> Result<ApiClient> {
        let key = (user_id.to_string(), marketplace);

        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(&key) {
                if !cached.credentials.is_expired(REFRESH_THRESHOLD_SECS) {
                    return Ok(cached.api.clone());
                }
            }
        }

        let connection = self
            .connections
            .find(user_id, marketplace)
            .await?
            .ok_or_else(|| MarketplaceError::NotConnected(marketplace.to_string()))?;

        if !connection.enabled {
            return Err(MarketplaceError::ReauthRequired(format!(
                "{marketplace} connection is disabled, reconnect the account"
            )));
        }

        let mut credentials = self.decrypt_credentials(&connection)?;

        if credentials.is_expired(REFRESH_THRESHOLD_SECS) {
            debug!(user_id, %marketplace, "access token near expiry, refreshing");
            credentials = self.refresh(user_id, marketplace, &connection, credentials).await?;
        }

        let api = self.build_client(&connection, &credentials)?;
        self.cache
            .write()
            .await
            .insert(key, CachedClient { api: api.clone(), credentials });

        Ok(api)
    }

    /// Drop a cached client, forcing a reload on next use.
    pub async fn invalidate(&self, user_id: &str, marketplace: MarketplaceId) {
        self.cache.write().await.remove(&(user_id.to_string(), marketplace));
    }

    fn decrypt_credentials(&self, connection: &MarketplaceConnection) -> Result<Credentials> {
        let plaintext = self
            .vault
            .decrypt_from_string(&connection.credentials)
            .map_err(|e| MarketplaceError::Security(e.to_string()))?;
        serde_json::from_slice(&plaintext).map_err(|e| {
            MarketplaceError::Security(format!("stored credentials are malformed: {e}"))
        })
    }

    fn build_client(
        &self,
        connection: &MarketplaceConnection,
        credentials: &Credentials,
    ) -> Result<ApiClient> {
        let config = self.registry.get(connection.marketplace)?;
        let connect_input = connection
            .settings
            .get("connect_input")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let resolved = config.resolved(connect_input.as_deref())?;

        let api = ApiClient::new(self.http.clone(), resolved.api_url, &credentials.access_token);
        let api = match connection.marketplace {
            MarketplaceId::Shopify => api.with_header_auth(SHOPIFY_AUTH_HEADER),
            _ => api,
        };
        debug!(marketplace = %connection.marketplace, base_url = api.base_url(), "api client built");
        Ok(api)
    }

    async fn refresh(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        connection: &MarketplaceConnection,
        credentials: Credentials,
    ) -> Result<Credentials> {
        let refresh_token = credentials.refresh_token.clone().ok_or_else(|| {
            MarketplaceError::ReauthRequired(format!(
                "{marketplace} token expired and no refresh token is stored"
            ))
        })?;

        let config = self.registry.get(marketplace)?;
        let connect_input = connection
            .settings
            .get("connect_input")
            .and_then(|v| v.as_str())
            .map(str::to_string);
        let resolved = config.resolved(connect_input.as_deref())?;

        let response = self
            .http
            .post_form_with_fallback(
                &resolved.token_url_chain(),
                &[
                    ("grant_type", "refresh_token"),
                    ("client_id", &resolved.client_id),
                    ("client_secret", &resolved.client_secret),
                    ("refresh_token", &refresh_token),
                ],
            )
            .await?;

        let status = response.status();
        if status.as_u16() == 400 || status.as_u16() == 401 {
            // The grant itself was rejected: the refresh token is revoked or
            // expired. Disable the connection so sync stops hammering the
            // provider until the user reconnects.
            let body = response.text().await.unwrap_or_default();
            warn!(user_id, %marketplace, %status, "refresh token rejected, disabling connection");
            self.connections.set_enabled(user_id, marketplace, false).await?;
            self.invalidate(user_id, marketplace).await;

            let snippet: String = body.chars().take(200).collect();
            return Err(MarketplaceError::ReauthRequired(format!(
                "{marketplace} refresh rejected ({status}): {snippet}"
            )));
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let snippet: String = body.chars().take(200).collect();
            return Err(MarketplaceError::Api {
                message: format!("token refresh failed: {snippet}"),
                status: status.as_u16(),
            });
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            MarketplaceError::Internal(format!("failed to parse refresh response: {e}"))
        })?;

        let refreshed = Credentials::from_response(token, Some(refresh_token));

        let plaintext = serde_json::to_string(&refreshed)
            .map_err(|e| MarketplaceError::Internal(format!("credential serialization: {e}")))?;
        let encrypted = self
            .vault
            .encrypt_to_string(plaintext.as_bytes())
            .map_err(|e| MarketplaceError::Security(e.to_string()))?;

        self.connections.update_credentials(user_id, marketplace, &encrypted).await?;
        info!(user_id, %marketplace, "access token refreshed");

        Ok(refreshed)
    }
}
