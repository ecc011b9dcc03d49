//! Config file driving a live coordinator

use std::fs;

use serde_json::{Value, json};
use verity_config::VerityConfig;
use verity_engine::field::EMAIL;
use verity_engine::{EntityKind, FieldSet, ValidationOutcome};
use wiremock::MockServer;

use crate::common::{RPC_PATH, bind_with, check_result, keep_original, mount_method};

#[tokio::test]
async fn configured_client_and_messages_reach_the_coordinator() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "emailCheck",
        check_result(&["email_not_correct", "email_syntax_error"], json!([])),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        format!(
            r#"
[client]
endpoint = "{}{RPC_PATH}"
api_key = "configured-key"
agent = "checkout-page/2.1"
https_only = false

[messages.email]
email_syntax_error = "An address needs an @."
"#,
            server.uri()
        ),
    )
    .unwrap();

    let config = VerityConfig::load_from(&path).unwrap();
    let mut settings = config.client_settings();
    // The environment may carry a key of its own.
    settings.api_key = Some("configured-key".into());

    let bound = bind_with(
        &settings,
        config.message_catalog(),
        EntityKind::Email,
        &FieldSet::from([(EMAIL, "jane.example.com")]),
        keep_original(),
    );
    let outcome = bound.coordinator.execute_validation_routine().await;
    assert!(matches!(outcome, ValidationOutcome::Settled(_)), "{outcome:?}");

    let view = bound.coordinator.status_messages(None);
    assert_eq!(view.leaves.errors, vec!["An address needs an @.".to_string()]);
    assert_eq!(
        bound.fields.snapshot().get("status"),
        Some("email_not_correct,email_syntax_error")
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests[0].headers["X-Agent"].to_str().unwrap(), "checkout-page/2.1");
    let body: Value = requests[0].body_json().unwrap();
    assert_eq!(body["params"]["email"], "jane.example.com");
}
