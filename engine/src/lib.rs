//! Orchestration engine for Verity.
//!
//! Entity coordinators own the live state of one form region each and drive
//! validation through their rules; the submission sequencer holds a submit
//! back until every coordinator has settled. The host binds them to its
//! forms through the collaborator traits in [`sink`].

mod autocomplete;
mod coordinator;
mod entity;
mod events;
mod modal;
mod sequencer;
pub mod sink;

pub use autocomplete::{AddressAutocomplete, AutocompleteEvent, AutocompleteField, NotAnAddress};
pub use coordinator::{
    BuildError, Commit, CoordinatorBuilder, CoordinatorSettings, DEFAULT_DEBOUNCE,
    DEFAULT_MAX_CHECKS_PER_SIGNATURE, EntityCoordinator, FieldEvent, PromptAnswer, StatusView,
    ValidationOutcome, entity_fields, is_validation_meaningful, relevant_fields,
};
pub use entity::CorrectionError;
pub use events::{EventBus, Listener, ListenerFut};
pub use modal::ModalQueue;
pub use sequencer::{SubmissionSequencer, SubmitError, SubmitOutcome};
pub use sink::{
    DisplaySink, FieldSink, MemoryFieldSink, ModalDeclined, ModalKind, ModalRequest,
    ModalSelection, ModalSink, SubmitTrigger, TriggerKind, TriggerReplay,
};

// Re-export from crates for public API
pub use verity_client::{ClientError, ClientSettings, RemoteValidationClient};
pub use verity_core::{
    EngineError, MessageCatalog, MessageLookup, RunReport, StatusGraph, StatusMessages, Tier,
};
pub use verity_types::field;
pub use verity_types::{DeclineReason, EntityKind, FieldSet, Intent, Meta, Other, Session};
