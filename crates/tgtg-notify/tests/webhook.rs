//! Integration tests for `IftttWebhook` and `Notifier` using wiremock HTTP mocks.

use std::sync::Arc;

use serde_json::json;
use tgtg_notify::{
    IftttWebhook, Notification, Notifier, NotifyError, WebhookSender, MIN_INTERVAL,
};
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn webhook(base_url: &str) -> IftttWebhook {
    IftttWebhook::new(base_url, "toogoodtobot", "secret-key", 5)
        .expect("webhook construction should not fail")
}

#[tokio::test]
async fn posts_message_and_image_to_trigger_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger/toogoodtobot/with/key/secret-key"))
        .and(body_json(json!({
            "value1": "Bagels is on sale for $5 500m away",
            "value2": "https://img.example/bagels.jpg"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("Congratulations!"))
        .expect(1)
        .mount(&server)
        .await;

    let notification = Notification {
        message: "Bagels is on sale for $5 500m away".to_owned(),
        image_url: "https://img.example/bagels.jpg".to_owned(),
    };
    webhook(&server.uri())
        .send(&notification)
        .await
        .expect("delivery should succeed");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let err = webhook(&server.uri())
        .send(&Notification::test())
        .await
        .unwrap_err();

    assert!(
        matches!(err, NotifyError::UnexpectedStatus { status: 401 }),
        "got {err:?}"
    );
}

#[tokio::test]
async fn transport_error_does_not_leak_key() {
    // Nothing listens on port 9 of localhost.
    let hook = IftttWebhook::new("http://127.0.0.1:9", "toogoodtobot", "secret-key", 1).unwrap();
    let err = hook.send(&Notification::test()).await.unwrap_err();

    assert!(matches!(err, NotifyError::Http(_)), "got {err:?}");
    assert!(!format!("{err:?}").contains("secret-key"));
    assert!(!format!("{hook:?}").contains("secret-key"));
}

#[tokio::test]
async fn notifier_sends_test_then_failed_delivery_is_dropped() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/trigger/toogoodtobot/with/key/secret-key"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let notifier = Notifier::start(Arc::new(webhook(&server.uri())), MIN_INTERVAL);
    notifier.send_test();
    notifier.flush().await;
    // `expect(1)` verifies on drop that no retry happened.
}
