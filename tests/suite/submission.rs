//! Submission sequencing over HTTP

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use verity_engine::field::{
    BUILDING_NUMBER, COUNTRY_CODE, EMAIL, LOCALITY, POSTAL_CODE, STREET_FULL, STREET_NAME,
};
use verity_engine::{
    DeclineReason, EntityKind, FieldSet, Intent, ModalDeclined, SubmissionSequencer,
    SubmitOutcome, SubmitTrigger, TriggerKind, TriggerReplay,
};
use wiremock::MockServer;

use crate::common::{
    FixedPrompts, bind, check_result, keep_original, mount_method, received_methods,
};

#[derive(Default)]
struct Replays(Mutex<Vec<SubmitTrigger>>);

impl TriggerReplay for Replays {
    fn replay(&self, trigger: &SubmitTrigger) {
        self.0.lock().unwrap().push(trigger.clone());
    }
}

fn address() -> FieldSet {
    FieldSet::from([
        (COUNTRY_CODE, "de"),
        (POSTAL_CODE, "10115"),
        (LOCALITY, "Berlin"),
        (STREET_FULL, "Hauptstr. 5"),
        (STREET_NAME, "Hauptstr."),
        (BUILDING_NUMBER, "5"),
    ])
}

#[tokio::test]
async fn concurrent_triggers_submit_once_and_account_each_entity() {
    let server = MockServer::start().await;
    mount_method(&server, "addressCheck", check_result(&["address_correct"], json!([]))).await;
    mount_method(&server, "emailCheck", check_result(&["email_correct"], json!([]))).await;
    mount_method(&server, "doAccounting", json!({})).await;

    let address = bind(&server, EntityKind::Address, &address(), keep_original());
    let email = bind(
        &server,
        EntityKind::Email,
        &FieldSet::from([(EMAIL, "jane@example.com")]),
        keep_original(),
    );

    let replays = Arc::new(Replays::default());
    let sequencer = SubmissionSequencer::new(replays.clone());
    sequencer.intercept("checkout");
    sequencer.subscribe(address.coordinator.clone());
    sequencer.subscribe(email.coordinator.clone());

    let (first, second) = tokio::join!(
        sequencer.handle_trigger(SubmitTrigger::new("checkout", TriggerKind::ButtonClick)),
        sequencer.handle_trigger(SubmitTrigger::new("checkout", TriggerKind::SubmitEvent)),
    );
    assert!(matches!(first, SubmitOutcome::Replayed), "{first:?}");
    assert!(matches!(second, SubmitOutcome::Ignored), "{second:?}");
    assert_eq!(
        *replays.0.lock().unwrap(),
        vec![SubmitTrigger::new("checkout", TriggerKind::ButtonClick)]
    );
    assert_eq!(address.coordinator.intent(), Intent::Review);

    let mut methods = received_methods(&server).await;
    methods.sort();
    assert_eq!(
        methods,
        vec!["addressCheck", "doAccounting", "doAccounting", "emailCheck"]
    );

    // Each session flushes its own counter under its own transaction.
    let session_id = address.coordinator.session().id().unwrap();
    let requests = server.received_requests().await.unwrap();
    let accounting = requests
        .iter()
        .filter_map(|req| req.body_json::<Value>().ok())
        .find(|body| {
            body["method"] == "doAccounting" && body["params"]["sessionId"] == session_id.as_str()
        })
        .expect("address accounting call");
    assert_eq!(accounting["params"]["sessionCounter"], 1);
    assert_eq!(address.coordinator.session().counter(), 0);
    assert_eq!(email.coordinator.session().counter(), 0);
    assert!(!sequencer.is_submitting());
}

#[tokio::test]
async fn declined_prompt_blocks_the_submission() {
    let server = MockServer::start().await;
    mount_method(&server, "addressCheck", check_result(&["address_not_found"], json!([]))).await;
    mount_method(&server, "doAccounting", json!({})).await;

    let prompts = Arc::new(FixedPrompts::new(Err(ModalDeclined {
        reason: DeclineReason::Edit,
    })));
    let address = bind(&server, EntityKind::Address, &address(), prompts.clone());

    let replays = Arc::new(Replays::default());
    let sequencer = SubmissionSequencer::new(replays.clone());
    sequencer.intercept("checkout");
    sequencer.subscribe(address.coordinator.clone());

    let outcome = sequencer
        .handle_trigger(SubmitTrigger::new("checkout", TriggerKind::EnterKey))
        .await;
    let SubmitOutcome::Aborted(err) = outcome else {
        panic!("expected abort, got {outcome:?}");
    };
    assert!(err.is_declined());
    assert_eq!(prompts.seen.lock().unwrap().len(), 1);
    assert!(replays.0.lock().unwrap().is_empty());
    assert_eq!(received_methods(&server).await, vec!["addressCheck"]);
    assert_eq!(address.coordinator.session().counter(), 1);
}
