//! Shared test utilities and fixtures
//!
//! A wiremock server standing in for the validation service, and
//! coordinators wired to it over real HTTP.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use serde_json::{Value, json};
use verity_engine::field::META_FIELDS;
use verity_engine::sink::MemoryFieldSink;
use verity_engine::{
    ClientSettings, DisplaySink, EntityCoordinator, EntityKind, FieldSet, MessageCatalog, Meta,
    ModalDeclined, ModalQueue, ModalRequest, ModalSelection, ModalSink, RemoteValidationClient,
    Session, StatusGraph, sink::ModalFut,
};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

pub const RPC_PATH: &str = "/rpc";

/// Answer `rpc_method` with `result`, echoing the request id.
pub async fn mount_method(server: &MockServer, rpc_method: &str, result: Value) {
    Mock::given(method("POST"))
        .and(path(RPC_PATH))
        .and(body_partial_json(json!({ "method": rpc_method })))
        .respond_with(move |req: &Request| {
            let id = req
                .body_json::<Value>()
                .ok()
                .and_then(|body| body.get("id").cloned())
                .unwrap_or(Value::Null);
            ResponseTemplate::new(200).set_body_json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "result": result,
            }))
        })
        .mount(server)
        .await;
}

/// Result of a check method.
pub fn check_result(status: &[&str], predictions: Value) -> Value {
    json!({ "status": status, "predictions": predictions })
}

/// Method names of every call the server received, in order.
pub async fn received_methods(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|req| req.body_json::<Value>().ok())
        .filter_map(|body| body["method"].as_str().map(ToString::to_string))
        .collect()
}

pub fn settings(server: &MockServer) -> ClientSettings {
    ClientSettings {
        endpoint: format!("{}{RPC_PATH}", server.uri()),
        api_key: Some("test-key".into()),
        https_only: false,
        ..ClientSettings::default()
    }
}

#[derive(Default)]
pub struct NoDisplay;

impl DisplaySink for NoDisplay {
    fn display(&self, _kind: EntityKind, _data: &FieldSet, _meta: &Meta) {}
}

/// Answers every prompt the same way and counts them.
pub struct FixedPrompts {
    answer: Result<ModalSelection, ModalDeclined>,
    pub seen: Mutex<Vec<ModalRequest>>,
}

impl FixedPrompts {
    pub fn new(answer: Result<ModalSelection, ModalDeclined>) -> Self {
        Self {
            answer,
            seen: Mutex::default(),
        }
    }
}

impl ModalSink for FixedPrompts {
    fn present(&self, request: ModalRequest) -> ModalFut<'_> {
        self.seen.lock().unwrap().push(request);
        let answer = self.answer;
        Box::pin(async move { answer })
    }
}

pub struct Bound {
    pub coordinator: Arc<EntityCoordinator>,
    pub fields: Arc<MemoryFieldSink>,
}

/// A coordinator talking to `server`, with its own session.
pub fn bind(
    server: &MockServer,
    kind: EntityKind,
    data: &FieldSet,
    prompts: Arc<dyn ModalSink>,
) -> Bound {
    bind_with(&settings(server), MessageCatalog::defaults(), kind, data, prompts)
}

pub fn bind_with(
    settings: &ClientSettings,
    messages: MessageCatalog,
    kind: EntityKind,
    data: &FieldSet,
    prompts: Arc<dyn ModalSink>,
) -> Bound {
    let client = RemoteValidationClient::http(settings, Arc::new(Session::start()))
        .expect("http client");
    let mut sink = MemoryFieldSink::with_values(data);
    for field in META_FIELDS {
        sink = sink.allow(field);
    }
    let fields = Arc::new(sink);
    let coordinator = EntityCoordinator::builder(kind)
        .client(client)
        .fields(fields.clone())
        .display(Arc::new(NoDisplay))
        .modals(Arc::new(ModalQueue::new(prompts)))
        .graph(Arc::new(StatusGraph::standard().expect("status graph")))
        .messages(Arc::new(messages))
        .build()
        .expect("coordinator");
    Bound {
        coordinator,
        fields,
    }
}

/// Prompts that keep the original input.
pub fn keep_original() -> Arc<dyn ModalSink> {
    Arc::new(FixedPrompts::new(Ok(ModalSelection::KeepOriginal)))
}
