//! Verity CLI - validate form data against the remote validation service.
//!
//! The CLI plays the host page: it reads a form file, binds every entity to
//! an in-memory field sink, answers correction prompts as told on the
//! command line, and prints the resulting data and verdicts as JSON.
//!
//! ```text
//! verity check  form.json      validate each entity once
//! verity submit form.json      hold a submission until every entity settles
//! verity suggest --field postal-code form.json
//! ```

mod form;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use verity_config::VerityConfig;
use verity_engine::field::META_FIELDS;
use verity_engine::sink::MemoryFieldSink;
use verity_engine::{
    AddressAutocomplete, AutocompleteEvent, AutocompleteField, ClientSettings,
    CoordinatorSettings, EntityCoordinator, EntityKind, Intent, MessageCatalog, ModalQueue,
    RemoteValidationClient, Session, StatusGraph, SubmissionSequencer, SubmitOutcome,
    SubmitTrigger, Tier, TriggerKind, ValidationOutcome,
};

use form::{FormFile, LogDisplay, ModalAnswer, ReleaseFlag, ScriptedPrompts};

#[derive(Debug, Parser)]
#[command(name = "verity", version, about = "Validate form data against a remote validation service")]
struct Cli {
    /// Config file. Defaults to $VERITY_CONFIG, then ~/.verity/config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Service endpoint, overriding the config.
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// How correction prompts are answered.
    #[arg(long, value_enum, default_value_t = ModalAnswer::Keep, global = true)]
    prompts: ModalAnswer,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Validate every entity of the form once and print the verdicts.
    Check {
        file: PathBuf,
        /// Run the review-only corrections as well.
        #[arg(long)]
        review: bool,
    },
    /// Submit the form: settle every entity, account, and release.
    Submit { file: PathBuf },
    /// Print autocomplete suggestions for the first address of the form.
    Suggest {
        #[arg(long, value_enum)]
        field: SuggestField,
        file: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SuggestField {
    PostalCode,
    Locality,
    StreetName,
    StreetFull,
}

impl From<SuggestField> for AutocompleteField {
    fn from(field: SuggestField) -> Self {
        match field {
            SuggestField::PostalCode => AutocompleteField::PostalCode,
            SuggestField::Locality => AutocompleteField::Locality,
            SuggestField::StreetName => AutocompleteField::StreetName,
            SuggestField::StreetFull => AutocompleteField::StreetFull,
        }
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    // Stdout carries the JSON result; logs go to stderr.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(env_filter)
        .init();
}

/// Everything the coordinators of one run share.
struct Host {
    settings: ClientSettings,
    coordinator: CoordinatorSettings,
    graph: Arc<StatusGraph>,
    messages: Arc<MessageCatalog>,
    modals: Arc<ModalQueue>,
}

impl Host {
    fn new(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => Some(VerityConfig::load_from(path)?),
            None => VerityConfig::load()?,
        }
        .unwrap_or_default();

        let mut settings = config.client_settings();
        if let Some(endpoint) = &cli.endpoint {
            settings.endpoint.clone_from(endpoint);
        }
        tracing::debug!(?settings, "client settings");

        Ok(Self {
            settings,
            coordinator: config.coordinator_settings(),
            graph: Arc::new(StatusGraph::standard()?),
            messages: Arc::new(config.message_catalog()),
            modals: Arc::new(ModalQueue::new(Arc::new(ScriptedPrompts::new(cli.prompts)))),
        })
    }

    fn coordinators(&self, form: &FormFile) -> Result<Vec<Arc<EntityCoordinator>>> {
        form.entities
            .iter()
            .enumerate()
            .map(|(i, spec)| {
                let name = spec
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("{}-{i}", spec.kind));
                let client = RemoteValidationClient::http(&self.settings, Arc::new(Session::start()))
                    .with_context(|| format!("creating client for {name}"))?;
                let mut fields = MemoryFieldSink::with_values(&spec.fields);
                for field in META_FIELDS {
                    fields = fields.allow(field);
                }
                let coordinator = EntityCoordinator::builder(spec.kind)
                    .name(name)
                    .client(client)
                    .fields(Arc::new(fields))
                    .display(Arc::new(LogDisplay))
                    .modals(self.modals.clone())
                    .graph(self.graph.clone())
                    .messages(self.messages.clone())
                    .other(spec.other.clone())
                    .settings(self.coordinator)
                    .build()?;
                Ok(coordinator)
            })
            .collect()
    }
}

fn report(coordinator: &EntityCoordinator) -> Value {
    json!({
        "name": coordinator.name(),
        "kind": coordinator.kind(),
        "data": coordinator.data(),
        "meta": coordinator.meta(),
        "errors": coordinator.status_messages(None).roots.errors,
    })
}

async fn check(host: &Host, form: &FormFile, review: bool) -> Result<Value> {
    let coordinators = host.coordinators(form)?;
    let mut results = Vec::with_capacity(coordinators.len());
    for coordinator in &coordinators {
        let outcome = coordinator.execute_validation_routine().await;
        if let ValidationOutcome::Failed(reason) = &outcome {
            tracing::warn!(name = %coordinator.name(), %reason, "validation failed");
        }
        if review {
            coordinator.set_intent(Intent::Review);
            if let Err(e) = coordinator.run_pending_actions(Tier::Regular).await {
                tracing::warn!(name = %coordinator.name(), error = %e, "review aborted");
            }
        }
        let mut entry = report(coordinator);
        entry["outcome"] = json!(format!("{outcome:?}"));
        results.push(entry);
    }
    Ok(json!({ "form": form.form, "entities": results }))
}

async fn submit(host: &Host, form: &FormFile) -> Result<Value> {
    let coordinators = host.coordinators(form)?;
    let released = Arc::new(ReleaseFlag::default());
    let sequencer = SubmissionSequencer::new(released.clone());
    sequencer.intercept(form.form.clone());
    for coordinator in &coordinators {
        sequencer.subscribe(coordinator.clone());
    }

    let outcome = sequencer
        .handle_trigger(SubmitTrigger::new(form.form.clone(), TriggerKind::SubmitCall))
        .await;
    let error = match &outcome {
        SubmitOutcome::Aborted(e) => Some(e.to_string()),
        _ => None,
    };
    Ok(json!({
        "form": form.form,
        "released": released.released(),
        "error": error,
        "entities": coordinators.iter().map(|c| report(c)).collect::<Vec<_>>(),
    }))
}

async fn suggest(host: &Host, form: &FormFile, field: AutocompleteField) -> Result<Value> {
    let coordinators = host.coordinators(form)?;
    let Some(address) = coordinators
        .into_iter()
        .find(|c| c.kind() == EntityKind::Address)
    else {
        bail!("form has no address entity");
    };
    let autocomplete = AddressAutocomplete::new(address)?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    autocomplete.suggest(field, &tx).await?;
    drop(tx);

    let mut suggestions = Vec::new();
    while let Some(event) = rx.recv().await {
        if let AutocompleteEvent::Fresh { predictions, .. } = event {
            suggestions.extend(predictions);
        }
    }
    Ok(json!({ "field": field.field(), "suggestions": suggestions }))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let host = Host::new(&cli)?;

    let result = match &cli.command {
        Command::Check { file, review } => check(&host, &FormFile::read(file)?, *review).await?,
        Command::Submit { file } => submit(&host, &FormFile::read(file)?).await?,
        Command::Suggest { field, file } => {
            suggest(&host, &FormFile::read(file)?, (*field).into()).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
