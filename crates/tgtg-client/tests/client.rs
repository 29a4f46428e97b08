//! Integration tests for `TgtgClient` and `Discovery` using wiremock HTTP mocks.

use std::time::Duration;

use serde_json::json;
use tgtg_client::{ClientError, Discovery, Location, TgtgClient};
use tgtg_core::Credentials;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_client(base_url: &str) -> TgtgClient {
    TgtgClient::with_base_url(base_url, 5, "tgtg-test/0.1")
        .expect("client construction should not fail")
        .with_login_polling(Duration::ZERO, 3)
}

fn toronto() -> Location {
    Location {
        longitude: -79.38,
        latitude: 43.65,
        radius_km: 2.0,
    }
}

fn static_credentials() -> Credentials {
    Credentials::Static {
        user_id: "user-1".to_owned(),
        cookie: Some("datadome=abc".to_owned()),
        authorization: Some("Bearer static-token".to_owned()),
    }
}

fn discover_fixture() -> serde_json::Value {
    json!({
        "item_availability_status": "OK",
        "buckets": [
            { "bucket_type": "HEADER", "display_type": "SOLD_OUT", "title": "Sold out" },
            {
                "bucket_type": "ITEM",
                "display_type": "CLASSIC",
                "items": [{
                    "item": {
                        "item_id": "1001",
                        "name": "",
                        "item_price": { "code": "CAD", "minor_units": 599, "decimals": 2 },
                        "cover_picture": { "picture_id": "p1", "current_url": "https://img.example/1.jpg" },
                        "average_overall_rating": { "average_overall_rating": 4.3, "rating_count": 120, "month_count": 6 }
                    },
                    "store": { "store_id": "s1", "store_name": "Bagel Bros", "distance": 0.42 },
                    "display_name": "Bagel Bros (Bagels)",
                    "pickup_interval": { "start": "2024-05-06T21:00:00Z", "end": "2024-05-06T22:00:00Z" },
                    "items_available": 2,
                    "favorite": false
                }]
            },
            { "bucket_type": "STORE", "display_type": "LOGO_ONLY", "stores": [] }
        ]
    })
}

#[tokio::test]
async fn discover_sends_location_and_parses_buckets() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .and(header("authorization", "Bearer static-token"))
        .and(header("cookie", "datadome=abc"))
        .and(body_partial_json(json!({
            "user_id": "user-1",
            "origin": { "longitude": -79.38, "latitude": 43.65 },
            "radius": 2.0
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(discover_fixture()))
        .expect(1)
        .mount(&server)
        .await;

    let mut discovery = Discovery::new(test_client(&server.uri()), static_credentials(), toronto());
    let results = discovery.fetch().await.expect("discover should succeed");

    assert_eq!(results.buckets.len(), 3);
    let items = results.buckets[1].items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id(), "1001");
    assert_eq!(items[0].items_available, 2);
    assert!(results.buckets[0].items().is_empty());
}

#[tokio::test]
async fn undecodable_payload_is_a_contract_break() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let mut discovery = Discovery::new(test_client(&server.uri()), static_credentials(), toronto());
    let err = discovery.fetch().await.unwrap_err();

    assert!(matches!(err, ClientError::Payload(_)), "got {err:?}");
    assert!(err.is_contract_break());
}

#[tokio::test]
async fn null_buckets_decode_as_empty_results() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "item_availability_status": "OK", "buckets": null })),
        )
        .mount(&server)
        .await;

    let mut discovery = Discovery::new(test_client(&server.uri()), static_credentials(), toronto());
    let results = discovery.fetch().await.expect("null buckets are not a contract break");

    assert!(results.buckets.is_empty());
}

#[tokio::test]
async fn rate_limit_reports_retry_after() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&server)
        .await;

    let mut discovery = Discovery::new(test_client(&server.uri()), static_credentials(), toronto());
    let err = discovery.fetch().await.unwrap_err();

    assert!(
        matches!(err, ClientError::RateLimited { retry_after_secs: 30 }),
        "got {err:?}"
    );
    assert!(!err.is_contract_break());
}

#[tokio::test]
async fn server_error_is_retried_then_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(discover_fixture()))
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry(2, 0);
    let mut discovery = Discovery::new(client, static_credentials(), toronto());
    let results = discovery.fetch().await.expect("second attempt should succeed");

    assert_eq!(results.buckets.len(), 3);
}

#[tokio::test]
async fn forbidden_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .respond_with(ResponseTemplate::new(403))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server.uri()).with_retry(3, 0);
    let mut discovery = Discovery::new(client, static_credentials(), toronto());
    let err = discovery.fetch().await.unwrap_err();

    assert!(
        matches!(err, ClientError::UnexpectedStatus { status: 403, .. }),
        "got {err:?}"
    );
}

async fn mount_login_flow(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v3/authByEmail"))
        .and(body_partial_json(json!({ "email": "me@example.com", "device_type": "IOS" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": "WAIT", "polling_id": "poll-1" })),
        )
        .expect(1)
        .mount(server)
        .await;

    // First poll: user has not clicked the link yet.
    Mock::given(method("POST"))
        .and(path("/auth/v3/authByRequestPollingId"))
        .and(body_partial_json(json!({ "request_polling_id": "poll-1" })))
        .respond_with(ResponseTemplate::new(202))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v3/authByRequestPollingId"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-1",
            "access_token_ttl_seconds": 172_800,
            "refresh_token": "ref-1"
        })))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/app/v1/onStartup"))
        .and(header("authorization", "Bearer tok-1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "user": { "user_id": "user-77" } })),
        )
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_by_email_polls_until_confirmed() {
    let server = MockServer::start().await;
    mount_login_flow(&server).await;

    let session = test_client(&server.uri())
        .login_by_email("me@example.com")
        .await
        .expect("login should succeed");

    assert_eq!(session.user_id, "user-77");
    assert_eq!(session.authorization(), Some("Bearer tok-1"));
    assert_eq!(session.refresh_token(), Some("ref-1"));
    assert!(session.expires_at().is_some());
}

#[tokio::test]
async fn email_credentials_log_in_before_first_discover() {
    let server = MockServer::start().await;
    mount_login_flow(&server).await;

    Mock::given(method("POST"))
        .and(path("/discover/v1"))
        .and(header("authorization", "Bearer tok-1"))
        .and(body_partial_json(json!({ "user_id": "user-77" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(discover_fixture()))
        .expect(2)
        .mount(&server)
        .await;

    let credentials = Credentials::Email {
        email: "me@example.com".to_owned(),
    };
    let mut discovery = Discovery::new(test_client(&server.uri()), credentials, toronto());
    assert!(discovery.session().is_none());

    discovery.fetch().await.expect("first fetch logs in");
    // Second fetch reuses the session; authByEmail expects exactly one call.
    discovery.fetch().await.expect("second fetch reuses session");

    assert_eq!(discovery.session().map(|s| s.user_id.as_str()), Some("user-77"));
}

#[tokio::test]
async fn login_rejected_when_not_waiting() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v3/authByEmail"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "state": "TERMS" })))
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .login_by_email("me@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Auth(_)), "got {err:?}");
}

#[tokio::test]
async fn login_times_out_when_never_confirmed() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/v3/authByEmail"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "state": "WAIT", "polling_id": "p" })),
        )
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/auth/v3/authByRequestPollingId"))
        .respond_with(ResponseTemplate::new(202))
        .expect(3)
        .mount(&server)
        .await;

    let err = test_client(&server.uri())
        .login_by_email("me@example.com")
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClientError::LoginTimedOut { attempts: 3 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn refresh_replaces_tokens() {
    let server = MockServer::start().await;
    mount_login_flow(&server).await;

    Mock::given(method("POST"))
        .and(path("/auth/v3/token/refresh"))
        .and(body_partial_json(json!({ "refresh_token": "ref-1", "email": "me@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "tok-2",
            "access_token_ttl_seconds": 3600,
            "refresh_token": "ref-2"
        })))
        .mount(&server)
        .await;

    let client = test_client(&server.uri());
    let session = client.login_by_email("me@example.com").await.unwrap();
    let refreshed = client.refresh(&session, "me@example.com").await.unwrap();

    assert_eq!(refreshed.user_id, "user-77");
    assert_eq!(refreshed.authorization(), Some("Bearer tok-2"));
    assert_eq!(refreshed.refresh_token(), Some("ref-2"));
}
