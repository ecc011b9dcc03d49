//! Address validation over HTTP

use std::sync::Arc;

use serde_json::{Value, json};
use verity_engine::field::{
    BUILDING_NUMBER, COUNTRY_CODE, LOCALITY, POSTAL_CODE, STREET_FULL, STREET_NAME,
};
use verity_engine::{EntityKind, FieldSet, Intent, ModalSelection, Tier, ValidationOutcome};
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::common::{
    FixedPrompts, bind, check_result, keep_original, mount_method, received_methods,
};

fn berlin() -> FieldSet {
    FieldSet::from([
        (COUNTRY_CODE, "de"),
        (POSTAL_CODE, "10115"),
        (LOCALITY, "Berln"),
        (STREET_FULL, "Hauptstr. 5"),
        (STREET_NAME, "Hauptstr."),
        (BUILDING_NUMBER, "5"),
    ])
}

fn prediction(post_code: &str) -> Value {
    json!({
        "country": "de",
        "postCode": post_code,
        "cityName": "Berlin",
        "street": "Hauptstr.",
        "houseNumber": "5",
    })
}

#[tokio::test]
async fn minor_correction_is_applied_over_http() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "addressCheck",
        check_result(
            &["address_needs_correction", "address_minor_correction"],
            json!([prediction("10115")]),
        ),
    )
    .await;
    let bound = bind(&server, EntityKind::Address, &berlin(), keep_original());

    let outcome = bound.coordinator.execute_validation_routine().await;
    assert!(matches!(outcome, ValidationOutcome::Settled(_)), "{outcome:?}");

    assert_eq!(bound.coordinator.data().get(LOCALITY), Some("Berlin"));
    assert_eq!(bound.fields.snapshot().get(LOCALITY), Some("Berlin"));
    assert!(
        bound
            .coordinator
            .meta()
            .has_status("address_selected_automatically")
    );

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    let session_id = bound.coordinator.session().id().unwrap();
    assert_eq!(request.headers["X-Transaction-Id"].to_str().unwrap(), session_id);
    assert_eq!(request.headers["X-Auth-Key"].to_str().unwrap(), "test-key");
    assert!(request.headers.contains_key("X-Agent"));

    let body: Value = request.body_json().unwrap();
    assert_eq!(body["jsonrpc"], "2.0");
    assert_eq!(body["params"]["postCode"], "10115");
    assert_eq!(body["params"]["cityName"], "Berln");
    assert_eq!(body["params"]["houseNumber"], "5");
    assert_eq!(body["params"]["language"], "de");
}

#[tokio::test]
async fn review_picks_the_chosen_variant() {
    let server = MockServer::start().await;
    mount_method(
        &server,
        "addressCheck",
        check_result(
            &["address_needs_correction", "address_multiple_variants"],
            json!([prediction("10115"), prediction("10117")]),
        ),
    )
    .await;
    let prompts = Arc::new(FixedPrompts::new(Ok(ModalSelection::Prediction(1))));
    let bound = bind(&server, EntityKind::Address, &berlin(), prompts.clone());

    bound.coordinator.execute_validation_routine().await;
    // Editing never prompts.
    assert!(prompts.seen.lock().unwrap().is_empty());

    bound.coordinator.set_intent(Intent::Review);
    bound
        .coordinator
        .run_pending_actions(Tier::Regular)
        .await
        .unwrap();

    let seen = prompts.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].predictions.len(), 2);
    let data = bound.coordinator.data();
    assert_eq!(data.get(POSTAL_CODE), Some("10117"));
    assert_eq!(data.get(LOCALITY), Some("Berlin"));
    assert!(
        bound
            .coordinator
            .meta()
            .has_status("address_selected_by_customer")
    );
    assert_eq!(received_methods(&server).await, vec!["addressCheck"]);
}

#[tokio::test]
async fn server_error_leaves_the_entity_unvalidated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;
    let bound = bind(&server, EntityKind::Address, &berlin(), keep_original());

    let outcome = bound.coordinator.execute_validation_routine().await;
    let ValidationOutcome::Failed(reason) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(reason.contains("503"), "{reason}");
    assert!(!bound.coordinator.is_signature_valid());
    assert!(bound.coordinator.meta().status.is_empty());
}

#[tokio::test]
async fn rpc_error_is_a_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": { "code": -32000, "message": "quota exceeded" },
        })))
        .mount(&server)
        .await;
    let bound = bind(&server, EntityKind::Address, &berlin(), keep_original());

    let outcome = bound.coordinator.execute_validation_routine().await;
    let ValidationOutcome::Failed(reason) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(reason.contains("quota exceeded"), "{reason}");
    assert_eq!(bound.coordinator.session().counter(), 0);
}
