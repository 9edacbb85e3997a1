//! OAuth authorization-code flow.
//!
//! `initiate` produces the provider authorization URL and parks a pending
//! flow keyed on (user, marketplace); `complete_callback` validates the
//! echoed anti-CSRF state, exchanges the code against the token URL chain,
//! encrypts the resulting credentials, and upserts the connection record.
//! Flow state is single-use and expires after ten minutes.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use mktsync_common::{Credentials, CredentialVault, OAuthErrorBody, TokenResponse};
use mktsync_core::{ConnectionRepository, FlowStateStore, PendingFlow};
use mktsync_domain::{
    MarketplaceConnection, MarketplaceError, MarketplaceId, Result,
};
use rand::distributions::Alphanumeric;
use rand::Rng;
use tokio::sync::RwLock;
use tracing::{info, warn};
use url::Url;

use crate::http::HttpClient;
use crate::marketplaces::registry::MarketplaceRegistry;

/// Pending flows expire after this many seconds.
const FLOW_TTL_SECS: i64 = 600;

const STATE_LEN: usize = 32;

/// In-memory flow state store. Last initiate for a (user, marketplace) pair
/// wins; `take` removes the entry regardless of what the caller does next.
#[derive(Default)]
pub struct InMemoryFlowStateStore {
    flows: RwLock<HashMap<(String, MarketplaceId), PendingFlow>>,
}

impl InMemoryFlowStateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FlowStateStore for InMemoryFlowStateStore {
    async fn put(&self, flow: PendingFlow) -> Result<()> {
        let key = (flow.user_id.clone(), flow.marketplace);
        self.flows.write().await.insert(key, flow);
        Ok(())
    }

    async fn take(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        state: &str,
    ) -> Result<Option<PendingFlow>> {
        let mut flows = self.flows.write().await;
        let key = (user_id.to_string(), marketplace);

        match flows.remove(&key) {
            Some(flow) if flow.state == state => Ok(Some(flow)),
            // Wrong state still consumes the flow; a guessed value must not
            // leave the real one redeemable.
            Some(_) | None => Ok(None),
        }
    }
}

/// Drives the OAuth connect flow for every marketplace.
pub struct OAuthFlowController {
    registry: Arc<MarketplaceRegistry>,
    http: HttpClient,
    vault: Arc<CredentialVault>,
    connections: Arc<dyn ConnectionRepository>,
    flows: Arc<dyn FlowStateStore>,
    redirect_uri: String,
}

/// Result of a successful initiate: where to send the user, and the state
/// value the provider will echo back.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub authorize_url: String,
    pub state: String,
}

impl OAuthFlowController {
    pub fn new(
        registry: Arc<MarketplaceRegistry>,
        http: HttpClient,
        vault: Arc<CredentialVault>,
        connections: Arc<dyn ConnectionRepository>,
        flows: Arc<dyn FlowStateStore>,
        redirect_uri: impl Into<String>,
    ) -> Self {
        Self { registry, http, vault, connections, flows, redirect_uri: redirect_uri.into() }
    }

    /// Start a connect flow: build the provider authorization URL and park
    /// the anti-CSRF state.
    ///
    /// `connect_input` carries the shop domain / site URL / account name for
    /// marketplaces with templated URLs; it is stored with the flow so the
    /// callback can resolve the same URLs.
    pub async fn initiate(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        connect_input: Option<&str>,
    ) -> Result<AuthorizationRequest> {
        let config = self.registry.get(marketplace)?;
        if config.client_id.is_empty() {
            return Err(MarketplaceError::Config(format!(
                "{marketplace}: no OAuth client registered"
            )));
        }

        let resolved = config.resolved(connect_input)?;
        let state = generate_state();

        let mut authorize_url = Url::parse(&resolved.auth_url).map_err(|e| {
            MarketplaceError::Config(format!("{marketplace}: invalid auth URL: {e}"))
        })?;
        authorize_url
            .query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &resolved.client_id)
            .append_pair("redirect_uri", &self.redirect_uri)
            .append_pair("scope", &resolved.scope_string())
            .append_pair("state", &state);

        self.flows
            .put(PendingFlow {
                user_id: user_id.to_string(),
                marketplace,
                state: state.clone(),
                connect_input: connect_input.map(str::to_string),
                created_at: Utc::now(),
            })
            .await?;

        info!(user_id, %marketplace, "oauth flow initiated");
        Ok(AuthorizationRequest { authorize_url: authorize_url.into(), state })
    }

    /// Complete a connect flow from the provider callback.
    ///
    /// Validates and consumes the pending flow, exchanges the authorization
    /// code, encrypts the credentials, and upserts the connection. A second
    /// connect for the same (user, marketplace) replaces stored credentials.
    pub async fn complete_callback(
        &self,
        user_id: &str,
        marketplace: MarketplaceId,
        code: &str,
        state: &str,
    ) -> Result<MarketplaceConnection> {
        let flow = self
            .flows
            .take(user_id, marketplace, state)
            .await?
            .ok_or_else(|| {
                MarketplaceError::InvalidState(format!(
                    "no pending flow matches state for {marketplace}"
                ))
            })?;

        let age = Utc::now() - flow.created_at;
        if age.num_seconds() > FLOW_TTL_SECS {
            return Err(MarketplaceError::InvalidState(format!(
                "flow for {marketplace} expired, restart the connection"
            )));
        }

        let config = self.registry.get(marketplace)?;
        let resolved = config.resolved(flow.connect_input.as_deref())?;

        let response = self
            .http
            .post_form_with_fallback(
                &resolved.token_url_chain(),
                &[
                    ("grant_type", "authorization_code"),
                    ("client_id", &resolved.client_id),
                    ("client_secret", &resolved.client_secret),
                    ("code", code),
                    ("redirect_uri", &self.redirect_uri),
                ],
            )
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(user_id, %marketplace, %status, "code exchange rejected");
            return Err(exchange_error(status.as_u16(), &body));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            MarketplaceError::Internal(format!("failed to parse token response: {e}"))
        })?;
        let credentials = Credentials::from_response(token, None);

        let plaintext = serde_json::to_string(&credentials)
            .map_err(|e| MarketplaceError::Internal(format!("credential serialization: {e}")))?;
        let encrypted = self
            .vault
            .encrypt_to_string(plaintext.as_bytes())
            .map_err(|e| MarketplaceError::Security(e.to_string()))?;

        let mut settings = default_settings(marketplace);
        if let Some(input) = &flow.connect_input {
            settings["connect_input"] = serde_json::Value::String(input.clone());
        }

        let connection =
            MarketplaceConnection::new_enabled(user_id, marketplace, encrypted, settings);
        self.connections.upsert(&connection).await?;

        info!(user_id, %marketplace, "marketplace connected");
        Ok(connection)
    }
}

/// Per-connection settings seeded on first connect.
fn default_settings(marketplace: MarketplaceId) -> serde_json::Value {
    match marketplace {
        MarketplaceId::MercadoLivre => serde_json::json!({
            "site_id": "MLB",
            "auto_sync": true,
            "sync_interval": 30,
        }),
        _ => serde_json::json!({}),
    }
}

fn generate_state() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(STATE_LEN)
        .map(char::from)
        .collect()
}

/// Map a token endpoint rejection to an auth error, using the RFC 6749 error
/// body when one parses.
fn exchange_error(status: u16, body: &str) -> MarketplaceError {
    let message = match serde_json::from_str::<OAuthErrorBody>(body) {
        Ok(oauth) => oauth.to_string(),
        Err(_) => {
            let snippet: String = body.chars().take(200).collect();
            format!("token endpoint returned {status}: {snippet}")
        }
    };
    MarketplaceError::Auth { message, status: Some(status) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flow(state: &str) -> PendingFlow {
        PendingFlow {
            user_id: "user-1".into(),
            marketplace: MarketplaceId::MercadoLivre,
            state: state.into(),
            connect_input: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn take_is_single_use() {
        let store = InMemoryFlowStateStore::new();
        store.put(flow("abc123")).await.unwrap();

        let first = store.take("user-1", MarketplaceId::MercadoLivre, "abc123").await.unwrap();
        assert!(first.is_some());

        let second = store.take("user-1", MarketplaceId::MercadoLivre, "abc123").await.unwrap();
        assert!(second.is_none());
    }

    #[tokio::test]
    async fn wrong_state_consumes_the_flow() {
        let store = InMemoryFlowStateStore::new();
        store.put(flow("real-state")).await.unwrap();

        let guessed =
            store.take("user-1", MarketplaceId::MercadoLivre, "guessed").await.unwrap();
        assert!(guessed.is_none());

        let real = store.take("user-1", MarketplaceId::MercadoLivre, "real-state").await.unwrap();
        assert!(real.is_none());
    }

    #[tokio::test]
    async fn second_initiate_replaces_the_first() {
        let store = InMemoryFlowStateStore::new();
        store.put(flow("first")).await.unwrap();
        store.put(flow("second")).await.unwrap();

        assert!(store
            .take("user-1", MarketplaceId::MercadoLivre, "first")
            .await
            .unwrap()
            .is_none());
        store.put(flow("third")).await.unwrap();
        assert!(store
            .take("user-1", MarketplaceId::MercadoLivre, "third")
            .await
            .unwrap()
            .is_some());
    }

    #[test]
    fn state_values_are_random_and_sized() {
        let a = generate_state();
        let b = generate_state();
        assert_eq!(a.len(), STATE_LEN);
        assert_ne!(a, b);
    }

    #[test]
    fn exchange_error_prefers_oauth_body() {
        let err = exchange_error(400, r#"{"error":"invalid_grant","error_description":"code used"}"#);
        match err {
            MarketplaceError::Auth { message, status } => {
                assert!(message.contains("invalid_grant"));
                assert!(message.contains("code used"));
                assert_eq!(status, Some(400));
            }
            other => panic!("expected auth error, got {:?}", other),
        }
    }

    #[test]
    fn exchange_error_falls_back_to_snippet() {
        let err = exchange_error(502, "<html>bad gateway</html>");
        match err {
            MarketplaceError::Auth { message, .. } => assert!(message.contains("502")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }
}
