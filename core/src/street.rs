//! Street composition.
//!
//! A street is either one full string ("Hauptstr. 5", "5 Main Street") or a
//! name plus a building number. Which part comes first depends on the
//! country.

use verity_types::FieldSet;
use verity_types::field::{BUILDING_NUMBER, STREET_FULL, STREET_NAME};

/// Countries that write the building number before the street name.
pub const NUMBER_FIRST_COUNTRIES: &[&str] = &[
    "fr", "gb", "ie", "us", "ca", "au", "nz", "lu", "il", "sg", "za", "ph", "in", "my", "th",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreetOrder {
    NameFirst,
    NumberFirst,
}

#[must_use]
pub fn order_for_country(country: &str) -> StreetOrder {
    let country = country.trim().to_ascii_lowercase();
    if NUMBER_FIRST_COUNTRIES.contains(&country.as_str()) {
        StreetOrder::NumberFirst
    } else {
        StreetOrder::NameFirst
    }
}

/// Join name and number in `order` with single spaces, skipping blank parts.
#[must_use]
pub fn compose(name: &str, number: &str, order: StreetOrder) -> String {
    let (first, second) = match order {
        StreetOrder::NameFirst => (name.trim(), number.trim()),
        StreetOrder::NumberFirst => (number.trim(), name.trim()),
    };
    [first, second]
        .into_iter()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[must_use]
pub fn build_street_full(name: &str, number: &str, country: &str) -> String {
    compose(name, number, order_for_country(country))
}

/// Guess the order the user typed by locating both parts in `input`.
///
/// Number-first only when both parts are found and the number starts first.
#[must_use]
pub fn infer_order(input: &str, name: &str, number: &str) -> StreetOrder {
    let input = input.to_lowercase();
    let name = name.trim().to_lowercase();
    let number = number.trim().to_lowercase();
    if name.is_empty() || number.is_empty() {
        return StreetOrder::NameFirst;
    }
    match (input.find(&number), input.find(&name)) {
        (Some(number_at), Some(name_at)) if number_at < name_at => StreetOrder::NumberFirst,
        _ => StreetOrder::NameFirst,
    }
}

/// Whether the full street and its split parts describe the same street.
///
/// An empty full street requires empty parts. A non-empty one requires a
/// street name and must contain both parts verbatim.
#[must_use]
pub fn is_street_integrity_maintained(data: &FieldSet) -> bool {
    let full = data.trimmed(STREET_FULL);
    let name = data.trimmed(STREET_NAME);
    let number = data.trimmed(BUILDING_NUMBER);

    if full.is_empty() {
        return name.is_empty() && number.is_empty();
    }
    !name.is_empty() && full.contains(name) && full.contains(number)
}
