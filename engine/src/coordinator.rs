//! Per-entity validation coordinator.
//!
//! An [`EntityCoordinator`] owns the live state of one form region: the
//! entered `data`, the last accepted verdict `meta`, request shaping hints in
//! `other`, the user's intent and, for addresses, the street mode. Its rules
//! and actions run on the two-tier fixed-point engine with the coordinator
//! itself as context.
//!
//! State sits behind a synchronous mutex that is never held across an await.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use thiserror::Error;
use verity_client::{CheckResult, ClientError, RemoteValidationClient, Reply};
use verity_core::street::build_street_full;
use verity_core::{
    ActionError, EngineError, MessageLookup, RegistrationError, RuleActionEngine, RunReport, StatusGraph,
    StatusMessages, Tier, signature,
};
use verity_types::field::{
    ADDRESS_ALL, ADDRESS_BASE, BUILDING_NUMBER, COUNTRY_CODE, EMAIL, EMAIL_ALL, FIRST_NAME,
    LAST_NAME, LOCALITY, META_HASH, META_PREDICTIONS, META_STATUS, PERSON_ALL, PHONE, PHONE_ALL,
    POSTAL_CODE, SESSION_COUNTER, SESSION_ID, STREET_FULL, STREET_NAME,
};
use verity_types::{
    DeclineReason, EntityKind, FieldSet, Intent, Meta, Other, Session, StreetMode, codec,
};

use crate::entity;
use crate::events::{EventBus, Listener};
use crate::modal::ModalQueue;
use crate::sink::{
    DisplaySink, FieldSink, ModalDeclined, ModalKind, ModalRequest, ModalSelection,
};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);
pub const DEFAULT_MAX_CHECKS_PER_SIGNATURE: u32 = 2;

const BLUR_EVENT: &str = "blur";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinatorSettings {
    /// Quiet period before a burst of blurs triggers validation.
    pub debounce: Duration,
    /// Attempts a capped corrective rule gets per data signature.
    pub max_checks_per_signature: u32,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            max_checks_per_signature: DEFAULT_MAX_CHECKS_PER_SIGNATURE,
        }
    }
}

/// What the user picked and what they were picking from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAnswer {
    pub selection: ModalSelection,
    /// Predictions as the prompt showed them.
    pub shown: Vec<FieldSet>,
    /// False when `data` or the verdict moved on while the prompt was open.
    pub current: bool,
}

/// Raw value events reported by the field binding.
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FieldEvent {
    Input { field: String, value: String },
    Change { field: String, value: String },
    Blur { field: String },
}

/// What a validation routine ended with.
#[derive(Debug)]
pub enum ValidationOutcome {
    /// Not enough data to validate; meta was reset.
    Skipped,
    /// A newer request superseded this one; nothing was committed.
    Stale,
    /// Verdict committed and the regular tier settled.
    Settled(RunReport),
    /// The user dismissed a prompt; intent is back to edit.
    Declined(DeclineReason),
    /// Transport or engine failure, logged and discarded.
    Failed(String),
}

/// Whether a validation reply was committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    Stale,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
}

/// Root and leaf error messages of one view.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusView {
    pub roots: StatusMessages,
    pub leaves: StatusMessages,
}

#[derive(Debug)]
struct EntityState {
    data: FieldSet,
    meta: Meta,
    other: Other,
    intent: Intent,
    street_mode: StreetMode,
    /// Attempts per (rule, data signature).
    checks: HashMap<(&'static str, String), u32>,
}

pub struct EntityCoordinator {
    kind: EntityKind,
    name: String,
    state: Mutex<EntityState>,
    client: Arc<RemoteValidationClient>,
    fields: Arc<dyn FieldSink>,
    display: Arc<dyn DisplaySink>,
    modals: Arc<ModalQueue>,
    graph: Arc<StatusGraph>,
    messages: Arc<dyn MessageLookup>,
    engine: RuleActionEngine<EntityCoordinator>,
    events: EventBus,
    settings: CoordinatorSettings,
}

impl std::fmt::Debug for EntityCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityCoordinator")
            .field("kind", &self.kind)
            .field("name", &self.name)
            .field("state", &self.lock())
            .field("engine", &self.engine)
            .finish_non_exhaustive()
    }
}

impl EntityCoordinator {
    pub fn builder(kind: EntityKind) -> CoordinatorBuilder {
        CoordinatorBuilder::new(kind)
    }

    #[must_use]
    pub fn kind(&self) -> EntityKind {
        self.kind
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn settings(&self) -> CoordinatorSettings {
        self.settings
    }

    #[must_use]
    pub fn client(&self) -> &RemoteValidationClient {
        &self.client
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    #[must_use]
    pub fn data(&self) -> FieldSet {
        self.lock().data.clone()
    }

    #[must_use]
    pub fn meta(&self) -> Meta {
        self.lock().meta.clone()
    }

    #[must_use]
    pub fn other(&self) -> Other {
        self.lock().other.clone()
    }

    #[must_use]
    pub fn intent(&self) -> Intent {
        self.lock().intent
    }

    pub fn set_intent(&self, intent: Intent) {
        self.lock().intent = intent;
    }

    #[must_use]
    pub fn street_mode(&self) -> StreetMode {
        self.lock().street_mode
    }

    // ------------------------------------------------------------------
    // Field events
    // ------------------------------------------------------------------

    pub fn handle_field_event(&self, event: FieldEvent) {
        match event {
            FieldEvent::Input { field, value } | FieldEvent::Change { field, value } => {
                self.set_field(&field, &value);
            }
            FieldEvent::Blur { field } => {
                let value = self.lock().data.value(&field).to_string();
                self.events
                    .emit(BLUR_EVENT, &FieldSet::from([(field, value)]));
            }
        }
    }

    /// Update `data` only. The binding already shows the value.
    pub fn set_field(&self, field: &str, value: &str) {
        self.lock().data.set(field, value);
    }

    /// Update `data` and the field sink together.
    pub fn write_field(&self, field: &str, value: &str) {
        self.lock().data.set(field, value);
        if self.is_writable(field) {
            self.fields.write(field, value);
        }
    }

    // ------------------------------------------------------------------
    // Signatures
    // ------------------------------------------------------------------

    /// Projection of `data` to the fields that take part in validation.
    #[must_use]
    pub fn filter_out_relevant_fields(&self, data: &FieldSet) -> FieldSet {
        let mode = self.street_mode();
        data.project(&relevant_fields(self.kind, mode))
    }

    #[must_use]
    pub fn current_hash(&self) -> String {
        let data = self.data();
        signature::hash(&self.filter_out_relevant_fields(&data))
    }

    #[must_use]
    pub fn is_signature_valid(&self) -> bool {
        let expected = self.lock().meta.hash.clone();
        signature::compare(&expected, &self.filter_out_relevant_fields(&self.data()))
    }

    #[must_use]
    pub fn is_validation_meaningful(&self) -> bool {
        is_validation_meaningful(self.kind, &self.data())
    }

    // ------------------------------------------------------------------
    // Validation
    // ------------------------------------------------------------------

    /// Validate the current data, commit the verdict and settle the regular
    /// tier. Failures are logged and reported in the outcome, never raised.
    pub async fn execute_validation_routine(&self) -> ValidationOutcome {
        self.refresh_street_mode();

        if !self.is_validation_meaningful() {
            let hash = self.current_hash();
            {
                let mut state = self.lock();
                state.meta = Meta::empty(self.kind);
                state.meta.hash = hash;
            }
            self.refresh_display();
            return ValidationOutcome::Skipped;
        }

        match self.validate_and_commit().await {
            Ok(Commit::Applied) => {}
            Ok(Commit::Stale) => return ValidationOutcome::Stale,
            Err(e) => {
                tracing::info!(entity = %self.kind, name = %self.name, error = %e, "validation failed");
                return ValidationOutcome::Failed(e.to_string());
            }
        }

        match self.run_pending_actions(Tier::Regular).await {
            Ok(report) => ValidationOutcome::Settled(report),
            Err(EngineError::Action {
                source: ActionError::Declined(reason),
                ..
            }) => {
                self.set_intent(Intent::Edit);
                ValidationOutcome::Declined(reason)
            }
            Err(e) => {
                tracing::info!(entity = %self.kind, name = %self.name, error = %e, "corrections aborted");
                ValidationOutcome::Failed(e.to_string())
            }
        }
    }

    /// Send the relevant data to the service and replace `meta` with the
    /// verdict if the reply is still current.
    pub async fn validate_and_commit(&self) -> Result<Commit, ClientError> {
        let relevant = self.filter_out_relevant_fields(&self.data());
        let hash = signature::hash(&relevant);
        let reply = self.validate_data(&relevant).await?;

        let Some(check) = reply.into_current() else {
            tracing::debug!(entity = %self.kind, name = %self.name, "stale verdict dropped");
            return Ok(Commit::Stale);
        };

        tracing::debug!(
            entity = %self.kind,
            name = %self.name,
            status = ?check.status,
            predictions = check.predictions.len(),
            "verdict committed"
        );
        self.lock().meta = Meta {
            kind: self.kind,
            status: check.status,
            predictions: check.predictions,
            hash,
        };
        self.refresh_display();
        self.sync_to_sink();
        Ok(Commit::Applied)
    }

    async fn validate_data(&self, relevant: &FieldSet) -> Result<Reply<CheckResult>, ClientError> {
        match self.kind {
            EntityKind::Address => self.client.address_check(relevant).await,
            EntityKind::Person => self.client.person_check(relevant).await,
            EntityKind::Phone => {
                let other = self.other();
                self.client.phone_check(relevant, &other).await
            }
            EntityKind::Email => self.client.email_check(relevant).await,
        }
    }

    /// Mark `copied` as confirmed without asking the service.
    ///
    /// Success codes are synthesized for the fields present in `copied`,
    /// `markers` are appended, and meta is bound to the current signature.
    pub fn assign_fake_status_codes(&self, copied: &FieldSet, markers: &[&str]) {
        let mut status = self
            .graph
            .synthesize_success_codes(copied, self.kind.namespace());
        for marker in markers {
            if !status.iter().any(|s| s == marker) {
                status.push((*marker).to_string());
            }
        }
        let hash = self.current_hash();
        {
            let mut state = self.lock();
            state.meta.status = status;
            state.meta.predictions.clear();
            state.meta.hash = hash;
        }
        self.refresh_display();
        self.sync_to_sink();
    }

    /// Write the entity's fields of `prediction` into data and the sink.
    pub fn apply_prediction(&self, prediction: &FieldSet) {
        for (field, value) in prediction.iter() {
            if entity_fields(self.kind).iter().any(|f| *f == field) {
                self.write_field(field, value);
            }
        }
        let touches_street = prediction.contains(STREET_NAME) || prediction.contains(BUILDING_NUMBER);
        if self.kind == EntityKind::Address && touches_street && !prediction.contains(STREET_FULL) {
            let data = self.data();
            let full = build_street_full(
                data.value(STREET_NAME),
                data.value(BUILDING_NUMBER),
                data.value(COUNTRY_CODE),
            );
            self.write_field(STREET_FULL, &full);
        }
    }

    /// Append a status code to meta and redraw.
    pub fn push_status(&self, code: &str) {
        self.lock().meta.push_status(code);
        self.refresh_display();
        self.sync_to_sink();
    }

    /// Put the current verdict in front of the user.
    ///
    /// The answer carries the predictions the prompt showed. It is marked
    /// stale when `data` or the verdict changed while the prompt was open.
    pub async fn present_modal(&self, kind: ModalKind) -> Result<PromptAnswer, ModalDeclined> {
        let (original, predictions, verdict) = {
            let state = self.lock();
            (
                state.data.clone(),
                state.meta.predictions.clone(),
                state.meta.hash.clone(),
            )
        };
        let original = self.filter_out_relevant_fields(&original);
        let shown_for = signature::hash(&original);
        let request = ModalRequest {
            entity: self.kind,
            source: self.name.clone(),
            kind,
            original,
            predictions: predictions.clone(),
            messages: self.status_messages(None).roots,
        };
        let result = self.modals.present(request).await;
        if let Err(declined) = &result {
            tracing::debug!(entity = %self.kind, name = %self.name, reason = %declined.reason, "prompt declined");
            self.set_intent(Intent::Edit);
        }
        let selection = result?;
        let current = self.current_hash() == shown_for && self.lock().meta.hash == verdict;
        Ok(PromptAnswer {
            selection,
            shown: predictions,
            current,
        })
    }

    // ------------------------------------------------------------------
    // Attempt ledger
    // ------------------------------------------------------------------

    /// Attempts of `rule` against the current signature.
    #[must_use]
    pub fn check_count(&self, rule: &'static str) -> u32 {
        let hash = self.current_hash();
        self.lock()
            .checks
            .get(&(rule, hash))
            .copied()
            .unwrap_or(0)
    }

    /// Count one attempt of `rule` against the current signature. Counts for
    /// earlier signatures are forgotten.
    pub fn record_check(&self, rule: &'static str) -> u32 {
        let hash = self.current_hash();
        let mut state = self.lock();
        state.checks.retain(|(_, seen), _| *seen == hash);
        let count = state.checks.entry((rule, hash)).or_insert(0);
        *count += 1;
        *count
    }

    // ------------------------------------------------------------------
    // Engine
    // ------------------------------------------------------------------

    #[must_use]
    pub fn has_pending_actions(&self, tier: Tier) -> bool {
        self.engine.has_pending_actions(tier, self)
    }

    #[must_use]
    pub fn pending_rules(&self, tier: Tier) -> Vec<&'static str> {
        self.engine.pending_rules(tier, self)
    }

    pub async fn run_pending_actions(&self, tier: Tier) -> Result<RunReport, EngineError> {
        self.engine.run_pending_actions(tier, self).await
    }

    // ------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------

    pub fn refresh_display(&self) {
        let (data, meta) = {
            let state = self.lock();
            (state.data.clone(), state.meta.clone())
        };
        self.display.display(self.kind, &data, &meta);
    }

    /// Mirror meta and session into the sink fields that exist for them.
    pub fn sync_to_sink(&self) {
        let writable = self.fields.writable_fields();
        let has = |name: &str| writable.iter().any(|w| w == name);
        let meta = self.meta();

        if has(META_STATUS) {
            self.fields.write(META_STATUS, &codec::encode_list(&meta.status));
        }
        if has(META_PREDICTIONS) {
            match codec::encode_json(&meta.predictions) {
                Ok(encoded) => self.fields.write(META_PREDICTIONS, &encoded),
                Err(e) => tracing::warn!(error = %e, "cannot encode predictions"),
            }
        }
        if has(META_HASH) {
            self.fields.write(META_HASH, &meta.hash);
        }
        let session = self.session();
        if has(SESSION_ID)
            && let Some(id) = session.id()
        {
            self.fields.write(SESSION_ID, &id);
        }
        if has(SESSION_COUNTER) {
            self.fields
                .write(SESSION_COUNTER, &session.counter().to_string());
        }
    }

    /// Root and leaf error messages, optionally for one field.
    #[must_use]
    pub fn status_messages(&self, field: Option<&str>) -> StatusView {
        let status = self.lock().meta.status.clone();
        let ns = self.kind.namespace();
        let messages = self.messages.as_ref();
        StatusView {
            roots: self.graph.root_error_messages(&status, ns, field, messages),
            leaves: self.graph.leaf_error_messages(&status, ns, field, messages),
        }
    }

    /// Pick the street mode from what the sink can write.
    pub fn refresh_street_mode(&self) {
        if self.kind != EntityKind::Address {
            return;
        }
        let mode = if self.is_writable(STREET_NAME) && self.is_writable(BUILDING_NUMBER) {
            StreetMode::Split
        } else {
            StreetMode::Full
        };
        self.lock().street_mode = mode;
    }

    fn is_writable(&self, field: &str) -> bool {
        self.fields.writable_fields().iter().any(|w| w == field)
    }

    fn lock(&self) -> MutexGuard<'_, EntityState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Fields that take part in the signature for `kind` in `mode`.
#[must_use]
pub fn relevant_fields(kind: EntityKind, mode: StreetMode) -> Vec<&'static str> {
    match kind {
        EntityKind::Address => {
            let mut fields = ADDRESS_BASE.to_vec();
            match mode {
                StreetMode::Full => fields.push(STREET_FULL),
                StreetMode::Split => fields.extend([STREET_NAME, BUILDING_NUMBER]),
            }
            fields
        }
        EntityKind::Person => PERSON_ALL.to_vec(),
        EntityKind::Phone => PHONE_ALL.to_vec(),
        EntityKind::Email => EMAIL_ALL.to_vec(),
    }
}

/// Every field an entity kind knows about.
#[must_use]
pub fn entity_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Address => ADDRESS_ALL,
        EntityKind::Person => PERSON_ALL,
        EntityKind::Phone => PHONE_ALL,
        EntityKind::Email => EMAIL_ALL,
    }
}

#[must_use]
pub fn is_validation_meaningful(kind: EntityKind, data: &FieldSet) -> bool {
    match kind {
        EntityKind::Address => {
            !data.is_blank(COUNTRY_CODE)
                && [POSTAL_CODE, LOCALITY, STREET_FULL, STREET_NAME]
                    .iter()
                    .any(|f| !data.is_blank(f))
        }
        EntityKind::Person => !data.is_blank(FIRST_NAME) || !data.is_blank(LAST_NAME),
        EntityKind::Phone => !data.is_blank(PHONE),
        EntityKind::Email => !data.is_blank(EMAIL),
    }
}

/// Builds an [`EntityCoordinator`]. Every collaborator is required.
pub struct CoordinatorBuilder {
    kind: EntityKind,
    name: Option<String>,
    client: Option<RemoteValidationClient>,
    fields: Option<Arc<dyn FieldSink>>,
    display: Option<Arc<dyn DisplaySink>>,
    modals: Option<Arc<ModalQueue>>,
    graph: Option<Arc<StatusGraph>>,
    messages: Option<Arc<dyn MessageLookup>>,
    other: Other,
    settings: CoordinatorSettings,
}

impl CoordinatorBuilder {
    fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            name: None,
            client: None,
            fields: None,
            display: None,
            modals: None,
            graph: None,
            messages: None,
            other: Other::default(),
            settings: CoordinatorSettings::default(),
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The client, with the session this coordinator accounts under.
    pub fn client(mut self, client: RemoteValidationClient) -> Self {
        self.client = Some(client);
        self
    }

    pub fn fields(mut self, fields: Arc<dyn FieldSink>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn display(mut self, display: Arc<dyn DisplaySink>) -> Self {
        self.display = Some(display);
        self
    }

    pub fn modals(mut self, modals: Arc<ModalQueue>) -> Self {
        self.modals = Some(modals);
        self
    }

    pub fn graph(mut self, graph: Arc<StatusGraph>) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn messages(mut self, messages: Arc<dyn MessageLookup>) -> Self {
        self.messages = Some(messages);
        self
    }

    pub fn other(mut self, other: Other) -> Self {
        self.other = other;
        self
    }

    pub fn settings(mut self, settings: CoordinatorSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Seed data from the field sink, register the entity's rules and hook
    /// blur events to the validation routine.
    pub fn build(self) -> Result<Arc<EntityCoordinator>, BuildError> {
        let client = self.client.ok_or(BuildError::MissingCollaborator("client"))?;
        let fields = self.fields.ok_or(BuildError::MissingCollaborator("fields"))?;
        let display = self.display.ok_or(BuildError::MissingCollaborator("display"))?;
        let modals = self.modals.ok_or(BuildError::MissingCollaborator("modals"))?;
        let graph = self.graph.ok_or(BuildError::MissingCollaborator("graph"))?;
        let messages = self
            .messages
            .ok_or(BuildError::MissingCollaborator("messages"))?;

        let mut engine = RuleActionEngine::new();
        entity::register(self.kind, &mut engine)?;

        let data: FieldSet = entity_fields(self.kind)
            .iter()
            .filter_map(|field| fields.read(field).map(|value| (*field, value)))
            .collect();

        let kind = self.kind;
        let name = self.name.unwrap_or_else(|| kind.as_str().to_string());
        let events = EventBus::new(self.settings.debounce);
        let state = EntityState {
            data,
            meta: Meta::empty(kind),
            other: self.other,
            intent: Intent::Edit,
            street_mode: StreetMode::default(),
            checks: HashMap::new(),
        };

        let coordinator = Arc::new_cyclic(|weak: &Weak<EntityCoordinator>| {
            events.subscribe(BLUR_EVENT, blur_listener(weak.clone()));
            EntityCoordinator {
                kind,
                name,
                state: Mutex::new(state),
                client: Arc::new(client),
                fields,
                display,
                modals,
                graph,
                messages,
                engine,
                events,
                settings: self.settings,
            }
        });
        coordinator.refresh_street_mode();
        tracing::debug!(entity = %kind, name = %coordinator.name, "coordinator ready");
        Ok(coordinator)
    }
}

fn blur_listener(coordinator: Weak<EntityCoordinator>) -> Listener {
    Arc::new(move |changes: FieldSet| {
        let coordinator = coordinator.clone();
        Box::pin(async move {
            let Some(coordinator) = coordinator.upgrade() else {
                return;
            };
            tracing::trace!(name = %coordinator.name, fields = changes.len(), "blur burst");
            let outcome = coordinator.execute_validation_routine().await;
            tracing::debug!(name = %coordinator.name, outcome = ?outcome, "blur validation done");
        })
    })
}
