use verity_types::StatusKind::{Error, Success};
use verity_types::field::{
    ADDRESS_ALL, BUILDING_NUMBER, COUNTRY_CODE, EMAIL, FIRST_NAME, LAST_NAME, LOCALITY,
    PERSON_ALL, PHONE, POSTAL_CODE, SALUTATION, STREET_FULL, STREET_NAME,
};

use super::codes::{
    ADDRESS_CORRECT, ADDRESS_MINOR_CORRECTION, ADDRESS_MULTIPLE_VARIANTS,
    ADDRESS_NEEDS_CORRECTION, ADDRESS_NOT_FOUND, ADDRESS_OF_NOT_SUPPORTED_TYPE,
    ADDRESS_SELECTED_AUTOMATICALLY, ADDRESS_SELECTED_BY_CUSTOMER, BUILDING_NUMBER_CORRECT,
    BUILDING_NUMBER_IS_MISSING, BUILDING_NUMBER_NEEDS_CORRECTION, BUILDING_NUMBER_NOT_FOUND,
    COUNTRY_CODE_CORRECT, COUNTRY_CODE_NEEDS_CORRECTION, EMAIL_CANT_RECEIVE, EMAIL_CORRECT,
    EMAIL_DISPOSABLE, EMAIL_NO_MX, EMAIL_NOT_CORRECT, EMAIL_SYNTAX_ERROR,
    FIRST_NAME_NEEDS_CORRECTION, LAST_NAME_NEEDS_CORRECTION, LOCALITY_CORRECT,
    LOCALITY_NEEDS_CORRECTION, NAME_CORRECT, NAME_NEEDS_CORRECTION, NAME_NOT_FOUND,
    PHONE_CORRECT, PHONE_INVALID, PHONE_IS_FIXED_LINE, PHONE_IS_MOBILE, PHONE_NEEDS_CORRECTION,
    PHONE_SHOULD_BE_FIXED_LINE, PHONE_SHOULD_BE_MOBILE, POSTAL_CODE_CORRECT,
    POSTAL_CODE_NEEDS_CORRECTION, SALUTATION_CORRECT, SALUTATION_NEEDS_CORRECTION,
    STREET_NAME_CORRECT, STREET_NAME_NEEDS_CORRECTION,
};
use super::{StatusGraph, StatusGraphError};

const STREET_NAME_FIELDS: &[&str] = &[STREET_NAME, STREET_FULL];
const BUILDING_NUMBER_FIELDS: &[&str] = &[BUILDING_NUMBER, STREET_FULL];
const NAME_FIELDS: &[&str] = &[FIRST_NAME, LAST_NAME];

pub(super) fn register(graph: &mut StatusGraph) -> Result<(), StatusGraphError> {
    address(graph)?;
    person(graph)?;
    phone(graph)?;
    email(graph)
}

fn address(graph: &mut StatusGraph) -> Result<(), StatusGraphError> {
    let ns = "address";

    graph.define(ns, Success, ADDRESS_CORRECT, ADDRESS_ALL, &[])?;
    graph.define(ns, Success, COUNTRY_CODE_CORRECT, &[COUNTRY_CODE], &[])?;
    graph.define(ns, Success, POSTAL_CODE_CORRECT, &[POSTAL_CODE], &[])?;
    graph.define(ns, Success, LOCALITY_CORRECT, &[LOCALITY], &[])?;
    graph.define(ns, Success, STREET_NAME_CORRECT, STREET_NAME_FIELDS, &[])?;
    graph.define(ns, Success, BUILDING_NUMBER_CORRECT, BUILDING_NUMBER_FIELDS, &[])?;
    // Markers carry no fields, so they are never synthesized from data.
    graph.define(ns, Success, ADDRESS_SELECTED_BY_CUSTOMER, &[], &[])?;
    graph.define(ns, Success, ADDRESS_SELECTED_AUTOMATICALLY, &[], &[])?;

    graph.define(ns, Error, ADDRESS_NEEDS_CORRECTION, ADDRESS_ALL, &[])?;
    graph.define(ns, Error, ADDRESS_MULTIPLE_VARIANTS, ADDRESS_ALL, &[ADDRESS_NEEDS_CORRECTION])?;
    graph.define(ns, Error, ADDRESS_MINOR_CORRECTION, ADDRESS_ALL, &[ADDRESS_NEEDS_CORRECTION])?;
    graph.define(ns, Error, ADDRESS_NOT_FOUND, ADDRESS_ALL, &[])?;
    graph.define(ns, Error, ADDRESS_OF_NOT_SUPPORTED_TYPE, ADDRESS_ALL, &[])?;

    let parent = &[ADDRESS_NEEDS_CORRECTION];
    graph.define(ns, Error, COUNTRY_CODE_NEEDS_CORRECTION, &[COUNTRY_CODE], parent)?;
    graph.define(ns, Error, POSTAL_CODE_NEEDS_CORRECTION, &[POSTAL_CODE], parent)?;
    graph.define(ns, Error, LOCALITY_NEEDS_CORRECTION, &[LOCALITY], parent)?;
    graph.define(ns, Error, STREET_NAME_NEEDS_CORRECTION, STREET_NAME_FIELDS, parent)?;
    graph.define(ns, Error, BUILDING_NUMBER_NEEDS_CORRECTION, BUILDING_NUMBER_FIELDS, parent)?;

    graph.define(ns, Error, BUILDING_NUMBER_IS_MISSING, BUILDING_NUMBER_FIELDS, &[])?;
    graph.define(
        ns,
        Error,
        BUILDING_NUMBER_NOT_FOUND,
        BUILDING_NUMBER_FIELDS,
        &[ADDRESS_NOT_FOUND],
    )?;
    Ok(())
}

fn person(graph: &mut StatusGraph) -> Result<(), StatusGraphError> {
    let ns = "person";

    graph.define(ns, Success, NAME_CORRECT, NAME_FIELDS, &[])?;
    graph.define(ns, Success, SALUTATION_CORRECT, &[SALUTATION], &[])?;

    graph.define(ns, Error, NAME_NEEDS_CORRECTION, PERSON_ALL, &[])?;
    graph.define(ns, Error, FIRST_NAME_NEEDS_CORRECTION, &[FIRST_NAME], &[NAME_NEEDS_CORRECTION])?;
    graph.define(ns, Error, LAST_NAME_NEEDS_CORRECTION, &[LAST_NAME], &[NAME_NEEDS_CORRECTION])?;
    graph.define(ns, Error, NAME_NOT_FOUND, NAME_FIELDS, &[])?;
    graph.define(ns, Error, SALUTATION_NEEDS_CORRECTION, &[SALUTATION], &[])?;
    Ok(())
}

fn phone(graph: &mut StatusGraph) -> Result<(), StatusGraphError> {
    let ns = "phone";

    graph.define(ns, Success, PHONE_CORRECT, &[PHONE], &[])?;
    graph.define(ns, Success, PHONE_IS_MOBILE, &[], &[])?;
    graph.define(ns, Success, PHONE_IS_FIXED_LINE, &[], &[])?;

    graph.define(ns, Error, PHONE_INVALID, &[PHONE], &[])?;
    graph.define(ns, Error, PHONE_NEEDS_CORRECTION, &[PHONE], &[])?;
    graph.define(ns, Error, PHONE_SHOULD_BE_MOBILE, &[PHONE], &[])?;
    graph.define(ns, Error, PHONE_SHOULD_BE_FIXED_LINE, &[PHONE], &[])?;
    Ok(())
}

fn email(graph: &mut StatusGraph) -> Result<(), StatusGraphError> {
    let ns = "email";

    graph.define(ns, Success, EMAIL_CORRECT, &[EMAIL], &[])?;

    graph.define(ns, Error, EMAIL_NOT_CORRECT, &[EMAIL], &[])?;
    graph.define(ns, Error, EMAIL_SYNTAX_ERROR, &[EMAIL], &[EMAIL_NOT_CORRECT])?;
    graph.define(ns, Error, EMAIL_NO_MX, &[EMAIL], &[EMAIL_NOT_CORRECT])?;
    graph.define(ns, Error, EMAIL_CANT_RECEIVE, &[EMAIL], &[EMAIL_NOT_CORRECT])?;
    graph.define(ns, Error, EMAIL_DISPOSABLE, &[EMAIL], &[])?;
    Ok(())
}
