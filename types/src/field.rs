//! Canonical domain field names.
//!
//! These are the names the coordinators use internally. Translation to the
//! remote service's vocabulary happens in the client's field mapping.

pub const COUNTRY_CODE: &str = "countryCode";
pub const SUBDIVISION_CODE: &str = "subdivisionCode";
pub const POSTAL_CODE: &str = "postalCode";
pub const LOCALITY: &str = "locality";
pub const STREET_FULL: &str = "streetFull";
pub const STREET_NAME: &str = "streetName";
pub const BUILDING_NUMBER: &str = "buildingNumber";
pub const ADDITIONAL_INFO: &str = "additionalInfo";

pub const SALUTATION: &str = "salutation";
pub const TITLE: &str = "title";
pub const FIRST_NAME: &str = "firstName";
pub const LAST_NAME: &str = "lastName";

pub const PHONE: &str = "phone";

pub const EMAIL: &str = "email";

// Mirrored meta/session fields, written back to the field sink when writable.
pub const META_STATUS: &str = "status";
pub const META_PREDICTIONS: &str = "predictions";
pub const META_HASH: &str = "hash";
pub const SESSION_ID: &str = "sessionId";
pub const SESSION_COUNTER: &str = "sessionCounter";

pub const META_FIELDS: &[&str] = &[
    META_STATUS,
    META_PREDICTIONS,
    META_HASH,
    SESSION_ID,
    SESSION_COUNTER,
];

/// Address fields independent of the street mode.
pub const ADDRESS_BASE: &[&str] = &[
    COUNTRY_CODE,
    SUBDIVISION_CODE,
    POSTAL_CODE,
    LOCALITY,
    ADDITIONAL_INFO,
];

/// Every address field, regardless of mode.
pub const ADDRESS_ALL: &[&str] = &[
    COUNTRY_CODE,
    SUBDIVISION_CODE,
    POSTAL_CODE,
    LOCALITY,
    STREET_FULL,
    STREET_NAME,
    BUILDING_NUMBER,
    ADDITIONAL_INFO,
];

pub const PERSON_ALL: &[&str] = &[SALUTATION, TITLE, FIRST_NAME, LAST_NAME];

pub const PHONE_ALL: &[&str] = &[PHONE, COUNTRY_CODE];

pub const EMAIL_ALL: &[&str] = &[EMAIL];
