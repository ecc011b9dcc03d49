//! Scripted collaborators for coordinator tests.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{Value, json};
use verity_client::protocol::RpcResponse;
use verity_client::{ClientError, Outgoing, RemoteValidationClient, Transport, TransportFut};
use verity_core::{MessageCatalog, StatusGraph};
use verity_types::field::{META_HASH, META_PREDICTIONS, META_STATUS, SESSION_COUNTER, SESSION_ID};
use verity_types::{EntityKind, FieldSet, Meta, Other, Session};

use crate::coordinator::{CoordinatorSettings, EntityCoordinator};
use crate::modal::ModalQueue;
use crate::sink::{
    DisplaySink, MemoryFieldSink, ModalDeclined, ModalFut, ModalRequest, ModalSelection, ModalSink,
};

pub(crate) fn check_reply(status: &[&str], predictions: Value) -> Value {
    json!({ "status": status, "predictions": predictions })
}

/// Replies queued per JSON-RPC method. Every reply echoes the request id.
#[derive(Default)]
pub(crate) struct MethodScript {
    replies: Mutex<HashMap<&'static str, VecDeque<(Value, Duration)>>>,
    sent: Mutex<Vec<Outgoing>>,
}

impl MethodScript {
    pub(crate) fn push(&self, method: &'static str, result: Value) {
        self.push_delayed(method, result, Duration::ZERO);
    }

    /// Queue a reply that arrives `delay` after the request.
    pub(crate) fn push_delayed(&self, method: &'static str, result: Value, delay: Duration) {
        self.replies
            .lock()
            .unwrap()
            .entry(method)
            .or_default()
            .push_back((result, delay));
    }

    pub(crate) fn calls(&self, method: &str) -> usize {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .filter(|o| o.request.method == method)
            .count()
    }

    pub(crate) fn sent(&self) -> Vec<Outgoing> {
        self.sent.lock().unwrap().clone()
    }
}

impl Transport for MethodScript {
    fn send<'a>(&'a self, outgoing: &'a Outgoing) -> TransportFut<'a> {
        self.sent.lock().unwrap().push(outgoing.clone());
        let method = outgoing.request.method;
        let next = self
            .replies
            .lock()
            .unwrap()
            .get_mut(method)
            .and_then(VecDeque::pop_front);
        let id = outgoing.request.id;
        Box::pin(async move {
            let (result, delay) = next.ok_or_else(|| {
                ClientError::Transport(format!("no scripted reply for {method}"))
            })?;
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            Ok(RpcResponse {
                id: Some(id),
                result: Some(result),
                error: None,
            })
        })
    }
}

#[derive(Default)]
pub(crate) struct ScriptedModals {
    answers: Mutex<VecDeque<(Result<ModalSelection, ModalDeclined>, Duration)>>,
    pub(crate) requests: Mutex<Vec<ModalRequest>>,
}

impl ScriptedModals {
    pub(crate) fn answer(&self, answer: Result<ModalSelection, ModalDeclined>) {
        self.answer_after(answer, Duration::ZERO);
    }

    /// Queue an answer the user gives `delay` after the prompt opens.
    pub(crate) fn answer_after(
        &self,
        answer: Result<ModalSelection, ModalDeclined>,
        delay: Duration,
    ) {
        self.answers.lock().unwrap().push_back((answer, delay));
    }

    pub(crate) fn presented(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl ModalSink for ScriptedModals {
    fn present(&self, request: ModalRequest) -> ModalFut<'_> {
        self.requests.lock().unwrap().push(request);
        let (answer, delay) = self
            .answers
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or((Ok(ModalSelection::KeepOriginal), Duration::ZERO));
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            answer
        })
    }
}

#[derive(Default)]
pub(crate) struct RecordingDisplay {
    pub(crate) frames: Mutex<Vec<Meta>>,
}

impl DisplaySink for RecordingDisplay {
    fn display(&self, _kind: EntityKind, _data: &FieldSet, meta: &Meta) {
        self.frames.lock().unwrap().push(meta.clone());
    }
}

pub(crate) struct Harness {
    pub(crate) coordinator: Arc<EntityCoordinator>,
    pub(crate) transport: Arc<MethodScript>,
    pub(crate) fields: Arc<MemoryFieldSink>,
    pub(crate) modals: Arc<ScriptedModals>,
    pub(crate) display: Arc<RecordingDisplay>,
}

impl Harness {
    /// Coordinator whose sink is seeded with `data` plus the meta mirrors.
    pub(crate) fn new(kind: EntityKind, data: FieldSet, other: Other) -> Self {
        let fields = MemoryFieldSink::with_values(&data)
            .allow(META_STATUS)
            .allow(META_PREDICTIONS)
            .allow(META_HASH)
            .allow(SESSION_ID)
            .allow(SESSION_COUNTER);
        Self::with_sink(kind, fields, other)
    }

    pub(crate) fn with_sink(kind: EntityKind, fields: MemoryFieldSink, other: Other) -> Self {
        let transport = Arc::new(MethodScript::default());
        let fields = Arc::new(fields);
        let modals = Arc::new(ScriptedModals::default());
        let display = Arc::new(RecordingDisplay::default());
        let client = RemoteValidationClient::new(transport.clone(), Arc::new(Session::start()));
        let coordinator = EntityCoordinator::builder(kind)
            .client(client)
            .fields(fields.clone())
            .display(display.clone())
            .modals(Arc::new(ModalQueue::new(modals.clone())))
            .graph(Arc::new(StatusGraph::standard().unwrap()))
            .messages(Arc::new(MessageCatalog::defaults()))
            .other(other)
            .settings(CoordinatorSettings::default())
            .build()
            .unwrap();
        Self {
            coordinator,
            transport,
            fields,
            modals,
            display,
        }
    }

    pub(crate) fn address(data: FieldSet) -> Self {
        Self::new(EntityKind::Address, data, Other::default())
    }

    pub(crate) fn email(data: FieldSet) -> Self {
        Self::new(EntityKind::Email, data, Other::default())
    }
}
