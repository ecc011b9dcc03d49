//! Address corrections.
//!
//! Street integrity keeps `streetFull` and its parts in agreement. The
//! selection rules resolve a verdict that came with predictions: minor
//! corrections with a single candidate are applied silently, anything else
//! is put in front of the user once they are reviewing.

use verity_core::status::codes::{
    ADDRESS_MINOR_CORRECTION, ADDRESS_MULTIPLE_VARIANTS, ADDRESS_NEEDS_CORRECTION,
    ADDRESS_NOT_FOUND, ADDRESS_SELECTED_AUTOMATICALLY, ADDRESS_SELECTED_BY_CUSTOMER,
};
use verity_core::street::{build_street_full, is_street_integrity_maintained};
use verity_core::{Action, ActionError, ActionFut, RegistrationError, Rule, Tier};
use verity_types::field::{
    ADDITIONAL_INFO, BUILDING_NUMBER, COUNTRY_CODE, STREET_FULL, STREET_NAME,
};
use verity_types::{Intent, Meta, StreetMode};

use super::{CorrectionError, Engine, add};
use crate::coordinator::EntityCoordinator;
use crate::sink::{ModalKind, ModalSelection};

const SELECTION_MARKERS: &[&str] = &[ADDRESS_SELECTED_BY_CUSTOMER, ADDRESS_SELECTED_AUTOMATICALLY];

pub(super) fn register(engine: &mut Engine) -> Result<(), RegistrationError> {
    add(engine, Tier::Regular, StreetIntegrity)?;
    add(engine, Tier::Regular, ManualSelectionNeeded)?;
    add(engine, Tier::Regular, ManualConfirmationNeeded)?;
    add(engine, Tier::Regular, AutomaticSelectionPossible)
}

fn selection_settled(meta: &Meta) -> bool {
    meta.has_any_status(SELECTION_MARKERS)
}

#[derive(Debug, Clone, Copy)]
struct StreetIntegrity;

impl StreetIntegrity {
    const NAME: &'static str = "street_integrity";
}

impl Rule<EntityCoordinator> for StreetIntegrity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        !is_street_integrity_maintained(&ctx.data())
            && ctx.check_count(Self::NAME) < ctx.settings().max_checks_per_signature
    }
}

impl Action<EntityCoordinator> for StreetIntegrity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            ctx.record_check(Self::NAME);
            let data = ctx.data();
            match ctx.street_mode() {
                StreetMode::Split => {
                    let full = build_street_full(
                        data.value(STREET_NAME),
                        data.value(BUILDING_NUMBER),
                        data.value(COUNTRY_CODE),
                    );
                    ctx.write_field(STREET_FULL, &full);
                }
                StreetMode::Full => {
                    let reply = ctx
                        .client()
                        .split_street(data.trimmed(STREET_FULL), data.value(COUNTRY_CODE))
                        .await
                        .map_err(|e| ActionError::failed(Self::NAME, e))?;
                    let Some(split) = reply.into_current() else {
                        return Ok(());
                    };
                    ctx.write_field(STREET_NAME, &split.street_name);
                    ctx.write_field(BUILDING_NUMBER, &split.building_number);
                    if let Some(info) = split.additional_info
                        && data.is_blank(ADDITIONAL_INFO)
                    {
                        ctx.write_field(ADDITIONAL_INFO, &info);
                    }
                }
            }
            Ok(())
        })
    }
}

/// Several variants, or a major correction, while reviewing.
#[derive(Debug, Clone, Copy)]
struct ManualSelectionNeeded;

impl Rule<EntityCoordinator> for ManualSelectionNeeded {
    fn name(&self) -> &'static str {
        "manual_selection_needed"
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if ctx.intent() != Intent::Review || !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        let needs_choice = meta.has_status(ADDRESS_MULTIPLE_VARIANTS)
            || (meta.has_status(ADDRESS_NEEDS_CORRECTION)
                && !meta.has_status(ADDRESS_MINOR_CORRECTION));
        needs_choice && !meta.predictions.is_empty() && !selection_settled(&meta)
    }
}

impl Action<EntityCoordinator> for ManualSelectionNeeded {
    fn name(&self) -> &'static str {
        "manual_selection_needed"
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            let answer = ctx
                .present_modal(ModalKind::SelectPrediction)
                .await
                .map_err(|declined| ActionError::Declined(declined.reason))?;
            if !answer.current {
                tracing::debug!(name = %ctx.name(), "selection dropped, verdict changed during prompt");
                return Ok(());
            }

            match answer.selection {
                ModalSelection::Prediction(index) => {
                    let prediction = answer.shown.get(index).ok_or_else(|| {
                        ActionError::failed(
                            "manual_selection_needed",
                            CorrectionError::PredictionOutOfRange {
                                index,
                                available: answer.shown.len(),
                            },
                        )
                    })?;
                    ctx.apply_prediction(prediction);
                    ctx.assign_fake_status_codes(prediction, &[ADDRESS_SELECTED_BY_CUSTOMER]);
                }
                ModalSelection::KeepOriginal => ctx.push_status(ADDRESS_SELECTED_BY_CUSTOMER),
            }
            Ok(())
        })
    }
}

/// The service found nothing; the user confirms their input.
#[derive(Debug, Clone, Copy)]
struct ManualConfirmationNeeded;

impl Rule<EntityCoordinator> for ManualConfirmationNeeded {
    fn name(&self) -> &'static str {
        "manual_confirmation_needed"
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if ctx.intent() != Intent::Review || !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        meta.has_status(ADDRESS_NOT_FOUND) && !selection_settled(&meta)
    }
}

impl Action<EntityCoordinator> for ManualConfirmationNeeded {
    fn name(&self) -> &'static str {
        "manual_confirmation_needed"
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            let answer = ctx
                .present_modal(ModalKind::ConfirmInput)
                .await
                .map_err(|declined| ActionError::Declined(declined.reason))?;
            if answer.current {
                ctx.push_status(ADDRESS_SELECTED_BY_CUSTOMER);
            }
            Ok(())
        })
    }
}

/// A minor correction with exactly one candidate. Applied once per
/// signature.
#[derive(Debug, Clone, Copy)]
struct AutomaticSelectionPossible;

impl AutomaticSelectionPossible {
    const NAME: &'static str = "automatic_selection_possible";
}

impl Rule<EntityCoordinator> for AutomaticSelectionPossible {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn evaluate(&self, ctx: &EntityCoordinator) -> bool {
        if !ctx.is_signature_valid() {
            return false;
        }
        let meta = ctx.meta();
        meta.has_status(ADDRESS_MINOR_CORRECTION)
            && !meta.has_status(ADDRESS_MULTIPLE_VARIANTS)
            && meta.predictions.len() == 1
            && !selection_settled(&meta)
            && ctx.check_count(Self::NAME) < 1
    }
}

impl Action<EntityCoordinator> for AutomaticSelectionPossible {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn execute<'a>(&'a self, ctx: &'a EntityCoordinator) -> ActionFut<'a> {
        Box::pin(async move {
            ctx.record_check(Self::NAME);
            let Some(prediction) = ctx.meta().predictions.into_iter().next() else {
                return Ok(());
            };
            ctx.apply_prediction(&prediction);
            ctx.assign_fake_status_codes(&prediction, &[ADDRESS_SELECTED_AUTOMATICALLY]);
            tracing::debug!(name = %ctx.name(), "minor correction applied");
            Ok(())
        })
    }
}
