//! Submission sequencing.
//!
//! A submission is held back while every subscribed coordinator settles its
//! regular tier, then its final tier. Only then is the original trigger
//! replayed so the host's own submit goes through. While a submission is
//! running further triggers are swallowed.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::future::try_join_all;
use thiserror::Error;
use verity_core::{EngineError, Tier};
use verity_types::{EntityKind, Intent};

use crate::coordinator::EntityCoordinator;
use crate::sink::{SubmitTrigger, TriggerReplay};

#[derive(Debug, Error)]
#[error("{entity} ({kind}) blocked the submission: {source}")]
pub struct SubmitError {
    pub entity: String,
    pub kind: EntityKind,
    #[source]
    pub source: EngineError,
}

impl SubmitError {
    #[must_use]
    pub fn is_declined(&self) -> bool {
        self.source.is_declined()
    }
}

#[derive(Debug)]
pub enum SubmitOutcome {
    /// The trigger was held back, every coordinator settled and the trigger
    /// was replayed.
    Replayed,
    /// Another submission of this sequencer is in flight.
    Ignored,
    /// Not ours to hold back: the host handles it unchanged.
    PassThrough,
    /// A coordinator failed or the user declined; the trigger was dropped.
    Aborted(SubmitError),
}

#[derive(Default)]
struct SequencerState {
    subscribers: Vec<Arc<EntityCoordinator>>,
    forms: HashSet<String>,
    saved: Option<SubmitTrigger>,
}

pub struct SubmissionSequencer {
    state: Mutex<SequencerState>,
    in_flight: AtomicBool,
    replaying: AtomicBool,
    replay: Arc<dyn TriggerReplay>,
}

impl std::fmt::Debug for SubmissionSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("SubmissionSequencer")
            .field("subscribers", &state.subscribers.len())
            .field("forms", &state.forms)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

impl SubmissionSequencer {
    pub fn new(replay: Arc<dyn TriggerReplay>) -> Self {
        Self {
            state: Mutex::default(),
            in_flight: AtomicBool::new(false),
            replaying: AtomicBool::new(false),
            replay,
        }
    }

    pub fn subscribe(&self, coordinator: Arc<EntityCoordinator>) {
        self.lock().subscribers.push(coordinator);
    }

    /// Hold back submissions of `form` from now on.
    pub fn intercept(&self, form: impl Into<String>) {
        self.lock().forms.insert(form.into());
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Handle one submit trigger of the host.
    pub async fn handle_trigger(&self, trigger: SubmitTrigger) -> SubmitOutcome {
        if self.replaying.load(Ordering::SeqCst) || !self.lock().forms.contains(&trigger.form) {
            return SubmitOutcome::PassThrough;
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(form = %trigger.form, kind = ?trigger.kind, "submission already running");
            return SubmitOutcome::Ignored;
        }

        tracing::info!(form = %trigger.form, kind = ?trigger.kind, "submission held back");
        self.lock().saved = Some(trigger);

        let result = self.submit().await;
        let saved = self.lock().saved.take();
        let outcome = match result {
            Ok(()) => {
                if let Some(trigger) = saved {
                    self.replaying.store(true, Ordering::SeqCst);
                    self.replay.replay(&trigger);
                    self.replaying.store(false, Ordering::SeqCst);
                }
                SubmitOutcome::Replayed
            }
            Err(e) => {
                tracing::info!(error = %e, "submission aborted");
                SubmitOutcome::Aborted(e)
            }
        };
        self.in_flight.store(false, Ordering::SeqCst);
        outcome
    }

    /// Put every subscriber in review and settle both tiers across all of
    /// them. Intents are left as they are on failure.
    pub async fn submit(&self) -> Result<(), SubmitError> {
        let subscribers = self.lock().subscribers.clone();
        for coordinator in &subscribers {
            coordinator.set_intent(Intent::Review);
        }
        run_tier(&subscribers, Tier::Regular).await?;
        run_tier(&subscribers, Tier::Final).await?;
        tracing::debug!(subscribers = subscribers.len(), "all coordinators settled");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, SequencerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

async fn run_tier(subscribers: &[Arc<EntityCoordinator>], tier: Tier) -> Result<(), SubmitError> {
    let pending = subscribers
        .iter()
        .filter(|coordinator| coordinator.has_pending_actions(tier));
    try_join_all(pending.map(|coordinator| async move {
        coordinator
            .run_pending_actions(tier)
            .await
            .map_err(|source| SubmitError {
                entity: coordinator.name().to_string(),
                kind: coordinator.kind(),
                source,
            })
    }))
    .await?;
    Ok(())
}
