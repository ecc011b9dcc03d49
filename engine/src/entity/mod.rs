//! Rules and actions of the four entity kinds.
//!
//! Every rule type here is both the predicate and its action, registered
//! once in each role. Shared rules (revalidation and accounting) are added
//! for every kind.

mod address;
mod person;
mod phone;
mod shared;

use thiserror::Error;
use verity_core::{Action, RegistrationError, Rule, RuleActionEngine, Tier};
use verity_types::EntityKind;

use crate::coordinator::EntityCoordinator;

pub(crate) type Engine = RuleActionEngine<EntityCoordinator>;

pub(crate) fn register(kind: EntityKind, engine: &mut Engine) -> Result<(), RegistrationError> {
    shared::register(engine)?;
    match kind {
        EntityKind::Address => address::register(engine),
        EntityKind::Person => person::register(engine),
        EntityKind::Phone => phone::register(engine),
        // Revalidation and accounting only.
        EntityKind::Email => Ok(()),
    }
}

/// Register `rule` as its own action.
fn add<R>(engine: &mut Engine, tier: Tier, rule: R) -> Result<(), RegistrationError>
where
    R: Rule<EntityCoordinator> + Action<EntityCoordinator> + Copy + 'static,
{
    engine.add_rule_and_action(tier, Box::new(rule), Box::new(rule))
}

#[derive(Debug, Error)]
pub enum CorrectionError {
    #[error("prediction {index} selected, but only {available} offered")]
    PredictionOutOfRange { index: usize, available: usize },
}

#[cfg(test)]
pub(crate) mod testing;
