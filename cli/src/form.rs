//! Form files and the collaborators the CLI plays host with.
//!
//! A form file lists the entities of one form:
//!
//! ```json
//! {
//!   "form": "checkout",
//!   "entities": [
//!     { "name": "billing", "kind": "address",
//!       "fields": { "countryCode": "de", "postalCode": "10115", "locality": "Berlin" } },
//!     { "kind": "email", "fields": { "email": "jane@example.com" } }
//!   ]
//! }
//! ```

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use verity_engine::{
    DeclineReason, DisplaySink, EntityKind, FieldSet, Meta, ModalDeclined, ModalRequest,
    ModalSelection, ModalSink, Other, SubmitTrigger, TriggerReplay, sink::ModalFut,
};

fn default_form() -> String {
    "form".to_string()
}

#[derive(Debug, Deserialize)]
pub struct FormFile {
    #[serde(default = "default_form")]
    pub form: String,
    pub entities: Vec<EntitySpec>,
}

#[derive(Debug, Deserialize)]
pub struct EntitySpec {
    pub name: Option<String>,
    pub kind: EntityKind,
    #[serde(default)]
    pub fields: FieldSet,
    #[serde(default)]
    pub other: Other,
}

impl FormFile {
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading form file {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parsing form file {}", path.display()))
    }
}

/// How correction prompts are answered without a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ModalAnswer {
    /// Take the first offered prediction.
    AcceptFirst,
    /// Keep what was entered.
    Keep,
    /// Close every prompt, aborting the submission.
    Decline,
}

pub struct ScriptedPrompts {
    answer: ModalAnswer,
}

impl ScriptedPrompts {
    pub fn new(answer: ModalAnswer) -> Self {
        Self { answer }
    }
}

impl ModalSink for ScriptedPrompts {
    fn present(&self, request: ModalRequest) -> ModalFut<'_> {
        tracing::info!(
            entity = %request.entity,
            source = %request.source,
            kind = ?request.kind,
            predictions = request.predictions.len(),
            errors = ?request.messages.errors,
            "correction prompt"
        );
        let answer = match self.answer {
            ModalAnswer::AcceptFirst if !request.predictions.is_empty() => {
                Ok(ModalSelection::Prediction(0))
            }
            ModalAnswer::AcceptFirst | ModalAnswer::Keep => Ok(ModalSelection::KeepOriginal),
            ModalAnswer::Decline => Err(ModalDeclined {
                reason: DeclineReason::Close,
            }),
        };
        Box::pin(async move { answer })
    }
}

/// Status display through the log.
pub struct LogDisplay;

impl DisplaySink for LogDisplay {
    fn display(&self, kind: EntityKind, _data: &FieldSet, meta: &Meta) {
        tracing::info!(entity = %kind, status = ?meta.status, predictions = meta.predictions.len(), "status");
    }
}

/// Records whether the held-back submission was released.
#[derive(Default)]
pub struct ReleaseFlag(AtomicBool);

impl ReleaseFlag {
    pub fn released(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl TriggerReplay for ReleaseFlag {
    fn replay(&self, trigger: &SubmitTrigger) {
        tracing::info!(form = %trigger.form, "submission released");
        self.0.store(true, Ordering::SeqCst);
    }
}
