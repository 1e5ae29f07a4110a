//! Retry, timeout and configuration behavior of the assembled client.

use std::time::Duration;

use polar_sdk::api::customers::CustomerCreate;
use polar_sdk::types::AccessToken;
use polar_sdk::{ErrorKind, Polar, PolarBuilder, PolarError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn builder(server: &MockServer) -> PolarBuilder {
    Polar::builder()
        .access_token(AccessToken::new("polar_oat_test_token").unwrap())
        .base_url(server.uri())
        .initial_retry_delay(Duration::from_millis(1))
}

fn customer_json() -> serde_json::Value {
    serde_json::json!({
        "id": "cus_1",
        "created_at": "2024-06-01T10:00:00Z",
        "email": "jane@example.com"
    })
}

#[tokio::test]
async fn test_get_is_retried_after_server_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_json()))
        .expect(1)
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(2).build().unwrap();
    let customer = polar.customers().get("cus_1").await.unwrap();
    assert_eq!(customer.id, "cus_1");
}

#[tokio::test]
async fn test_retry_budget_is_exhausted() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(2).build().unwrap();
    let err = polar.customers().get("cus_1").await.unwrap_err();
    assert!(matches!(err, PolarError::Server { status: 500, .. }));
}

#[tokio::test]
async fn test_client_errors_are_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(3).build().unwrap();
    let err = polar.customers().get("cus_1").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_post_is_not_retried_by_default() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/customers/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(3).build().unwrap();
    let err = polar
        .customers()
        .create(&CustomerCreate::new("jane@example.com"))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Server);
}

#[tokio::test]
async fn test_post_is_retried_when_enabled() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/customers/"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/customers/"))
        .respond_with(ResponseTemplate::new(201).set_body_json(customer_json()))
        .expect(1)
        .mount(&server)
        .await;

    let polar = builder(&server)
        .max_retries(1)
        .retry_non_idempotent(true)
        .build()
        .unwrap();
    let customer = polar
        .customers()
        .create(&CustomerCreate::new("jane@example.com"))
        .await
        .unwrap();
    assert_eq!(customer.id, "cus_1");
}

#[tokio::test]
async fn test_rate_limited_request_waits_and_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0.05"))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(customer_json()))
        .expect(1)
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(1).build().unwrap();
    let started = std::time::Instant::now();
    polar.customers().get("cus_1").await.unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
}

#[tokio::test]
async fn test_slow_response_times_out() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(customer_json())
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let polar = builder(&server)
        .max_retries(0)
        .timeout(Duration::from_millis(100))
        .build()
        .unwrap();
    let err = polar.customers().get("cus_1").await.unwrap_err();
    assert!(matches!(err, PolarError::Timeout(_)));
    assert!(err.is_transient());
}

#[tokio::test]
async fn test_dropping_the_future_cancels_the_call() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/customers/cus_1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(customer_json())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let polar = builder(&server).max_retries(0).build().unwrap();
    let customers = polar.customers();
    let result =
        tokio::time::timeout(Duration::from_millis(100), customers.get("cus_1")).await;
    assert!(result.is_err());
}

#[test]
fn test_build_rejects_bad_configuration() {
    let missing_token = Polar::builder().build().unwrap_err();
    assert_eq!(missing_token.kind(), ErrorKind::Config);

    let bad_url = Polar::builder()
        .access_token(AccessToken::new("polar_oat_test_token").unwrap())
        .base_url("ftp://api.polar.sh")
        .build()
        .unwrap_err();
    assert_eq!(bad_url.kind(), ErrorKind::Config);

    let zero_rpm = Polar::builder()
        .access_token(AccessToken::new("polar_oat_test_token").unwrap())
        .requests_per_minute(0)
        .build()
        .unwrap_err();
    assert_eq!(zero_rpm.kind(), ErrorKind::Config);
}
