//! HTTP client retry and auth-domain fallback behavior against a live mock
//! server.

mod support;

use mktsync_domain::MarketplaceError;
use reqwest::Method;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use support::fast_http_client;

fn three_attempt_client() -> mktsync_infra::HttpClient {
    mktsync_infra::HttpClient::builder()
        .retry_policy(
            mktsync_common::RetryPolicy::new(
                3,
                std::time::Duration::from_millis(2),
                std::time::Duration::from_millis(10),
            )
            .with_jitter_factor(0.0),
        )
        .build()
        .expect("http client")
}

#[tokio::test]
async fn two_server_errors_then_success_takes_three_requests() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(200).set_body_string("recovered"))
        .mount(&server)
        .await;

    let client = three_attempt_client();
    let url = format!("{}/flaky", server.uri());
    let response = client.send(client.request(Method::GET, &url)).await.expect("response");

    assert_eq!(response.status().as_u16(), 200);
    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 3);
}

#[tokio::test]
async fn fallback_chain_advances_past_dead_primary() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .and(body_string_contains("grant_type=authorization_code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "from-fallback",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    // Ports 9 and 19 have no listener; only the last URL is alive.
    let urls = vec![
        "http://127.0.0.1:9/oauth/token".to_string(),
        "http://127.0.0.1:19/oauth/token".to_string(),
        format!("{}/oauth/token", server.uri()),
    ];

    let client = fast_http_client();
    let response = client
        .post_form_with_fallback(&urls, &[("grant_type", "authorization_code"), ("code", "abc")])
        .await
        .expect("fallback response");

    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["access_token"], "from-fallback");
}

#[tokio::test]
async fn dead_chain_surfaces_primary_error() {
    let urls = vec![
        "http://127.0.0.1:9/oauth/token".to_string(),
        "http://127.0.0.1:19/oauth/token".to_string(),
    ];

    let client = fast_http_client();
    let err = client
        .post_form_with_fallback(&urls, &[("grant_type", "refresh_token")])
        .await
        .unwrap_err();

    assert!(matches!(err, MarketplaceError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn non_network_rejection_stops_the_chain() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/oauth/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant"
        })))
        .expect(1)
        .mount(&server)
        .await;

    // The 400 comes back as a response; the fallback URL must not be tried.
    let urls = vec![
        format!("{}/oauth/token", server.uri()),
        "http://127.0.0.1:9/oauth/token".to_string(),
    ];

    let client = fast_http_client();
    let response = client
        .post_form_with_fallback(&urls, &[("grant_type", "authorization_code")])
        .await
        .expect("response");

    assert_eq!(response.status().as_u16(), 400);
}
