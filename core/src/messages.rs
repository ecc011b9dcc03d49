//! Key→string message lookup.
//!
//! Keys are `namespace.code`, e.g. `address.address_needs_correction`.
//! A status is only displayed when a message exists for its key, so one
//! status vocabulary can serve several namespaces.

use std::collections::HashMap;

use crate::status::codes;

/// Lookup of user-facing messages.
pub trait MessageLookup: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
}

#[must_use]
pub fn message_key(namespace: &str, code: &str) -> String {
    format!("{namespace}.{code}")
}

/// In-memory message table.
#[derive(Debug, Clone, Default)]
pub struct MessageCatalog {
    entries: HashMap<String, String>,
}

impl MessageCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// English messages for the standard status catalogue.
    #[must_use]
    pub fn defaults() -> Self {
        let mut catalog = Self::new();
        for (namespace, code, text) in DEFAULT_MESSAGES {
            catalog.insert(message_key(namespace, code), *text);
        }
        catalog
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.entries.insert(key.into(), text.into());
    }

    /// Add or replace every entry of `overrides`.
    pub fn extend<K, V>(&mut self, overrides: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        for (key, text) in overrides {
            self.insert(key, text);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl MessageLookup for MessageCatalog {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

const DEFAULT_MESSAGES: &[(&str, &str, &str)] = &[
    ("address", codes::ADDRESS_CORRECT, "The address is correct."),
    ("address", codes::ADDRESS_NEEDS_CORRECTION, "The address seems to be incorrect."),
    ("address", codes::ADDRESS_MULTIPLE_VARIANTS, "Several addresses match your input."),
    ("address", codes::ADDRESS_MINOR_CORRECTION, "The address was slightly corrected."),
    ("address", codes::ADDRESS_NOT_FOUND, "The address could not be found."),
    ("address", codes::ADDRESS_OF_NOT_SUPPORTED_TYPE, "This type of address is not supported."),
    ("address", codes::COUNTRY_CODE_NEEDS_CORRECTION, "Please check the country."),
    ("address", codes::POSTAL_CODE_NEEDS_CORRECTION, "Please check the postal code."),
    ("address", codes::LOCALITY_NEEDS_CORRECTION, "Please check the city."),
    ("address", codes::STREET_NAME_NEEDS_CORRECTION, "Please check the street name."),
    ("address", codes::BUILDING_NUMBER_NEEDS_CORRECTION, "Please check the house number."),
    ("address", codes::BUILDING_NUMBER_IS_MISSING, "The house number is missing."),
    ("address", codes::BUILDING_NUMBER_NOT_FOUND, "The house number could not be found."),
    ("person", codes::NAME_CORRECT, "The name is correct."),
    ("person", codes::NAME_NEEDS_CORRECTION, "Please check the name."),
    ("person", codes::FIRST_NAME_NEEDS_CORRECTION, "Please check the first name."),
    ("person", codes::LAST_NAME_NEEDS_CORRECTION, "Please check the last name."),
    ("person", codes::NAME_NOT_FOUND, "The name is unknown."),
    ("person", codes::SALUTATION_NEEDS_CORRECTION, "Please check the salutation."),
    ("phone", codes::PHONE_CORRECT, "The phone number is correct."),
    ("phone", codes::PHONE_INVALID, "The phone number is invalid."),
    ("phone", codes::PHONE_NEEDS_CORRECTION, "The phone number format was corrected."),
    ("phone", codes::PHONE_SHOULD_BE_MOBILE, "Please enter a mobile number."),
    ("phone", codes::PHONE_SHOULD_BE_FIXED_LINE, "Please enter a landline number."),
    ("email", codes::EMAIL_CORRECT, "The email address is correct."),
    ("email", codes::EMAIL_NOT_CORRECT, "The email address is not correct."),
    ("email", codes::EMAIL_SYNTAX_ERROR, "The email address has a syntax error."),
    ("email", codes::EMAIL_NO_MX, "The email domain cannot receive mail."),
    ("email", codes::EMAIL_CANT_RECEIVE, "The mailbox cannot receive mail."),
    ("email", codes::EMAIL_DISPOSABLE, "Disposable email addresses are not accepted."),
];
