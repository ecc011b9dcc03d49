//! Collaborators the coordinators talk to.
//!
//! The form binding implements these: reading and writing field values,
//! drawing statuses, and presenting correction prompts.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use verity_core::StatusMessages;
use verity_types::{DeclineReason, EntityKind, FieldSet, Meta};

/// Field values of one form region.
pub trait FieldSink: Send + Sync {
    fn read(&self, field: &str) -> Option<String>;
    fn write(&self, field: &str, value: &str);
    /// Names of the fields this region can currently write.
    fn writable_fields(&self) -> Vec<String>;
}

/// Status rendering. Redrawing is entirely up to the implementation.
pub trait DisplaySink: Send + Sync {
    fn display(&self, kind: EntityKind, data: &FieldSet, meta: &Meta);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalKind {
    /// Pick one of several corrected variants, or keep the input.
    SelectPrediction,
    /// Confirm an input the service could not find.
    ConfirmInput,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalRequest {
    pub entity: EntityKind,
    /// Coordinator name, for hosts with several regions of one kind.
    pub source: String,
    pub kind: ModalKind,
    pub original: FieldSet,
    pub predictions: Vec<FieldSet>,
    pub messages: StatusMessages,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalSelection {
    Prediction(usize),
    KeepOriginal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("prompt declined ({reason})")]
pub struct ModalDeclined {
    pub reason: DeclineReason,
}

pub type ModalFut<'a> =
    Pin<Box<dyn Future<Output = Result<ModalSelection, ModalDeclined>> + Send + 'a>>;

pub trait ModalSink: Send + Sync {
    fn present(&self, request: ModalRequest) -> ModalFut<'_>;
}

/// How a submission was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    SubmitEvent,
    SubmitCall,
    EnterKey,
    ButtonClick,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitTrigger {
    pub form: String,
    pub kind: TriggerKind,
}

impl SubmitTrigger {
    pub fn new(form: impl Into<String>, kind: TriggerKind) -> Self {
        Self {
            form: form.into(),
            kind,
        }
    }
}

/// Re-dispatches a held-back submission so the host's own submit proceeds.
pub trait TriggerReplay: Send + Sync {
    fn replay(&self, trigger: &SubmitTrigger);
}

/// In-memory field sink.
#[derive(Debug, Default)]
pub struct MemoryFieldSink {
    values: Mutex<BTreeMap<String, String>>,
    writable: BTreeSet<String>,
}

impl MemoryFieldSink {
    /// Sink whose writable fields are `writable`, all initially empty.
    pub fn new<'a>(writable: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            values: Mutex::default(),
            writable: writable.into_iter().map(ToString::to_string).collect(),
        }
    }

    /// Sink seeded with `values`. Every seeded field is writable.
    #[must_use]
    pub fn with_values(values: &FieldSet) -> Self {
        Self {
            values: Mutex::new(values.as_map().clone()),
            writable: values.keys().map(ToString::to_string).collect(),
        }
    }

    /// Make an extra field writable.
    pub fn allow(mut self, field: &str) -> Self {
        self.writable.insert(field.to_string());
        self
    }

    #[must_use]
    pub fn snapshot(&self) -> FieldSet {
        self.lock().iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, String>> {
        self.values
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl FieldSink for MemoryFieldSink {
    fn read(&self, field: &str) -> Option<String> {
        self.lock().get(field).cloned()
    }

    fn write(&self, field: &str, value: &str) {
        if self.writable.contains(field) {
            self.lock().insert(field.to_string(), value.to_string());
        }
    }

    fn writable_fields(&self) -> Vec<String> {
        self.writable.iter().cloned().collect()
    }
}
