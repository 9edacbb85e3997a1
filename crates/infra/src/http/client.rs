use std::time::Duration;

use mktsync_common::RetryPolicy;
use mktsync_domain::{MarketplaceError, Result};
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::errors::InfraError;

/// HTTP client with built-in retry, timeout, and auth-domain fallback
/// support.
///
/// Retry scope: connect/timeout failures, HTTP 429, and HTTP 5xx. Other 4xx
/// responses are returned to the caller on the first attempt.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    /// Execute the provided request builder with retry semantics.
    ///
    /// Error-status responses (including 4xx) are returned as `Ok`; status
    /// handling is the caller's concern.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let attempts = self.retry.max_attempts().max(1);

        for attempt in 0..attempts {
            let cloned_builder = builder.try_clone().ok_or_else(|| {
                MarketplaceError::Internal(
                    "request body cannot be cloned; buffer the body to enable retries".into(),
                )
            })?;

            let request = cloned_builder.build().map_err(|err| {
                let infra: InfraError = err.into();
                MarketplaceError::from(infra)
            })?;

            let method = request.method().clone();
            let url = request.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(request).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");

                    if should_retry_status(status) && attempt + 1 < attempts {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }

                    let infra: InfraError = err.into();
                    return Err(MarketplaceError::from(infra));
                }
            }
        }

        Err(MarketplaceError::Internal(
            "http client exhausted retries without producing a result".into(),
        ))
    }

    /// POST a form body against a chain of URLs, advancing to the next URL on
    /// connect-class failure.
    ///
    /// Used for token endpoints with fallback auth domains: each URL gets the
    /// full per-URL retry budget, and when the whole chain is dead the error
    /// from the primary URL is surfaced.
    pub async fn post_form_with_fallback(
        &self,
        urls: &[String],
        form: &[(&str, &str)],
    ) -> Result<Response> {
        let mut primary_error: Option<MarketplaceError> = None;

        for url in urls {
            match self.send(self.request(Method::POST, url).form(form)).await {
                Ok(response) => return Ok(response),
                Err(err @ MarketplaceError::Network(_)) => {
                    debug!(%url, error = %err, "auth domain unreachable, trying fallback");
                    primary_error.get_or_insert(err);
                }
                Err(err) => return Err(err),
            }
        }

        Err(primary_error
            .unwrap_or_else(|| MarketplaceError::Internal("no token URL configured".into())))
    }

    async fn sleep_with_backoff(&self, attempt: u32) {
        let delay = self.retry.delay_for(attempt);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    retry: RetryPolicy,
    user_agent: Option<String>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::new(3, Duration::from_millis(200), Duration::from_secs(10)),
            user_agent: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the retry policy (attempts + backoff schedule).
    pub fn retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        let client = builder.build().map_err(|err| {
            let infra: InfraError = err.into();
            MarketplaceError::from(infra)
        })?;

        Ok(HttpClient { client, retry: self.retry })
    }
}

fn should_retry_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

/// Authenticated client bound to one marketplace connection.
///
/// Wraps [`HttpClient`] with the resolved API base URL and the connection's
/// access token. Cached by the token refresh manager and handed to adapters.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: HttpClient,
    base_url: String,
    access_token: String,
    /// Header name for token auth; `None` means standard bearer auth.
    auth_header: Option<&'static str>,
}

impl ApiClient {
    pub fn new(http: HttpClient, base_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            auth_header: None,
        }
    }

    /// Send the token in a custom header instead of `Authorization: Bearer`
    /// (Shopify uses `X-Shopify-Access-Token`).
    #[must_use]
    pub fn with_header_auth(mut self, header: &'static str) -> Self {
        self.auth_header = Some(header);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else {
            format!("{}/{}", self.base_url, path.trim_start_matches('/'))
        }
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match self.auth_header {
            Some(header) => builder.header(header, &self.access_token),
            None => builder.bearer_auth(&self.access_token),
        }
    }

    /// GET a JSON resource relative to the connection's API base URL.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get_json_with_query::<T, &str>(path, &[]).await
    }

    /// GET a JSON resource with query parameters.
    pub async fn get_json_with_query<T, V>(&self, path: &str, query: &[(&str, V)]) -> Result<T>
    where
        T: DeserializeOwned,
        V: serde::Serialize,
    {
        let url = self.url_for(path);
        let mut builder = self.authorize(self.http.request(Method::GET, &url));
        if !query.is_empty() {
            builder = builder.query(query);
        }

        let response = self.http.send(builder).await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &url, &body));
        }

        response.json::<T>().await.map_err(|e| {
            MarketplaceError::Internal(format!("failed to parse response from {url}: {e}"))
        })
    }
}

fn error_for_status(status: StatusCode, url: &str, body: &str) -> MarketplaceError {
    let code = status.as_u16();
    let snippet: String = body.chars().take(200).collect();
    let message = format!("{url} returned {code}: {snippet}");

    match code {
        401 | 403 => MarketplaceError::Auth { message, status: Some(code) },
        429 => MarketplaceError::RateLimited(message),
        _ => MarketplaceError::Api { message, status: code },
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn client_with_defaults() -> HttpClient {
        HttpClient::builder()
            .retry_policy(
                RetryPolicy::new(3, Duration::from_millis(5), Duration::from_millis(20))
                    .with_jitter_factor(0.0),
            )
            .build()
            .expect("http client")
    }

    #[tokio::test]
    async fn returns_successful_response_without_retry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn does_not_retry_client_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 1);
    }

    #[tokio::test]
    async fn retries_429_responses() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_with_defaults();
        let response =
            client.send(client.request(Method::GET, server.uri())).await.expect("response");

        // All attempts rate limited; last response is surfaced.
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn api_client_uses_header_auth_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/products.json"))
            .and(header("X-Shopify-Access-Token", "shpat_token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let api = ApiClient::new(client_with_defaults(), server.uri(), "shpat_token")
            .with_header_auth("X-Shopify-Access-Token");

        let body: serde_json::Value = api.get_json("/admin/api/products.json").await.unwrap();
        assert_eq!(body["ok"], true);
    }

    #[tokio::test]
    async fn api_client_maps_401_to_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_string("token expired"))
            .mount(&server)
            .await;

        let api = ApiClient::new(client_with_defaults(), server.uri(), "stale");
        let err = api.get_json::<serde_json::Value>("/items").await.unwrap_err();

        match err {
            MarketplaceError::Auth { status, .. } => assert_eq!(status, Some(401)),
            other => panic!("expected auth error, got {:?}", other),
        }
    }
}
