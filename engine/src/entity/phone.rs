use verity_core::status::codes::{
    PHONE_IS_FIXED_LINE, PHONE_IS_MOBILE, PHONE_NEEDS_CORRECTION, PHONE_SHOULD_BE_FIXED_LINE,
    PHONE_SHOULD_BE_MOBILE,
};
use verity_core::{Action, ActionFut, RegistrationError, Rule, Tier};
use verity_types::Meta;

use super::{Engine, add};
use crate::coordinator::EntityCoordinator;

const TYPE_MARKERS: &[&str] = &[PHONE_IS_MOBILE, PHONE_IS_FIXED_LINE];

pub(super) fn register(engine: &mut Engine) -> Result<(), RegistrationError> {
    add(engine, Tier::Regular, FormatNeedsCorrection)?;
    add(engine, Tier::Regular, WrongFieldType)
}

/// Take over the service's formatting of the number. Once per signature.
#[derive(Debug, Clone, Copy)]
struct FormatNeedsCorrection;

impl FormatNeedsCorrection {
    const NAME: &'static str = "format_needs_correction";
}

impl Rule<EntityCoordinator> for FormatNeedsCorrection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        meta.has_status(PHONE_NEEDS_CORRECTION)
            && !meta.predictions.is_empty()
            && ctx.check_count(Self::NAME) < 1
    }
}

impl Action<EntityCoordinator> for FormatNeedsCorrection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            ctx.record_check(Self::NAME);
            let meta = ctx.meta();
            let Some(prediction) = meta.predictions.first() else {
                return Ok(());
            };
            // The line type survives the reformat.
            let markers: Vec<&str> = TYPE_MARKERS
                .iter()
                .copied()
                .filter(|code| meta.has_status(code))
                .collect();
            ctx.apply_prediction(prediction);
            ctx.assign_fake_status_codes(prediction, &markers);
            Ok(())
        })
    }
}

/// The number is of another line type than the field expects.
#[derive(Debug, Clone, Copy)]
struct WrongFieldType;

impl WrongFieldType {
    fn mismatch(expected: Option<&str>, meta: &Meta) -> Option<&'static str> {
        match expected? {
            "mobile" if meta.has_status(PHONE_IS_FIXED_LINE) => Some(PHONE_SHOULD_BE_MOBILE),
            "fixed_line" if meta.has_status(PHONE_IS_MOBILE) => Some(PHONE_SHOULD_BE_FIXED_LINE),
            _ => None,
        }
    }
}

impl Rule<EntityCoordinator> for WrongFieldType {
    fn name(&self) -> &'static str {
        "wrong_field_type"
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        Self::mismatch(ctx.other().data_type.as_deref(), &meta)
            .is_some_and(|code| !meta.has_status(code))
    }
}

impl Action<EntityCoordinator> for WrongFieldType {
    fn name(&self) -> &'static str {
        "wrong_field_type"
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            let meta = ctx.meta();
            if let Some(code) = Self::mismatch(ctx.other().data_type.as_deref(), &meta) {
                ctx.push_status(code);
            }
            Ok(())
        })
    }
}
