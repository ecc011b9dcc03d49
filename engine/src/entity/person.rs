use verity_core::status::codes::NAME_NEEDS_CORRECTION;
use verity_core::{Action, ActionFut, RegistrationError, Rule, Tier};

use super::{Engine, add};
use crate::coordinator::EntityCoordinator;

pub(super) fn register(engine: &mut Engine) -> Result<(), RegistrationError> {
    add(engine, Tier::Regular, NameNeedsCorrection)
}

/// Accept the service's spelling of the name. Once per signature.
#[derive(Debug, Clone, Copy)]
struct NameNeedsCorrection;

impl NameNeedsCorrection {
    const NAME: &'static str = "name_needs_correction";
}

impl Rule<EntityCoordinator> for NameNeedsCorrection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        meta.has_status(NAME_NEEDS_CORRECTION)
            && !meta.predictions.is_empty()
            && ctx.check_count(Self::NAME) < 1
    }
}

impl Action<EntityCoordinator> for NameNeedsCorrection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            ctx.record_check(Self::NAME);
            if let Some(prediction) = ctx.meta().predictions.into_iter().next() {
                ctx.apply_prediction(&prediction);
                ctx.assign_fake_status_codes(&prediction, &[]);
            }
            Ok(())
        })
    }
}
