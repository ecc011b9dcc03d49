use verity_core::{Action, ActionError, ActionFut, RegistrationError, Rule, Tier};

use super::{Engine, add};
use crate::coordinator::EntityCoordinator;

pub(super) fn register(engine: &mut Engine) -> Result<(), RegistrationError> {
    add(engine, Tier::Regular, SignatureInvalid)?;
    add(engine, Tier::Final, Accounting)
}

/// The verdict in meta was computed for other data.
#[derive(Debug, Clone, Copy)]
pub(super) struct SignatureInvalid;

impl Rule<EntityCoordinator> for SignatureInvalid {
    fn name(&self) -> &'static str {
        "signature_invalid"
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        ctx.is_validation_meaningful() && !ctx.is_signature_valid()
    }
}

impl Action<EntityCoordinator> for SignatureInvalid {
    fn name(&self) -> &'static str {
        "signature_invalid"
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            ctx.refresh_street_mode();
            ctx.validate_and_commit()
                .await
                .map(|_| ())
                .map_err(|e| ActionError::failed("signature_invalid", e))
        })
    }
}

/// Billable calls were made since the last flush.
#[derive(Debug, Clone, Copy)]
pub(super) struct Accounting;

impl Rule<EntityCoordinator> for Accounting {
    fn name(&self) -> &'static str {
        "accounting"
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        let session = ctx.session();
        session.id().is_some() && session.counter() > 0
    }
}

impl Action<EntityCoordinator> for Accounting {
    fn name(&self) -> &'static str {
        "accounting"
    }

    fn tier(&self) -> Option<Tier> {
        Some(Tier::Final)
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            let sent = ctx
                .client()
                .do_accounting()
                .await
                .map_err(|e| ActionError::failed("accounting", e))?;
            ctx.session().mark_accounted(sent);
            tracing::debug!(name = %ctx.name(), sent, "session accounted");
            ctx.sync_to_sink();
            Ok(())
        })
    }
}
