//! Address autocomplete.
//!
//! Postal code and locality suggestions are cached per country. A query
//! first emits the cached suggestions matching the typed prefix, then the
//! fresh ones once the service answers. Street suggestions are not cached.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use verity_client::ClientError;
use verity_types::field::{COUNTRY_CODE, LOCALITY, POSTAL_CODE, STREET_FULL, STREET_NAME};
use verity_types::{EntityKind, FieldSet, StreetMode};

use crate::coordinator::EntityCoordinator;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AutocompleteField {
    PostalCode,
    Locality,
    StreetName,
    StreetFull,
}

impl AutocompleteField {
    #[must_use]
    pub fn field(self) -> &'static str {
        match self {
            AutocompleteField::PostalCode => POSTAL_CODE,
            AutocompleteField::Locality => LOCALITY,
            AutocompleteField::StreetName => STREET_NAME,
            AutocompleteField::StreetFull => STREET_FULL,
        }
    }

    fn is_cached(self) -> bool {
        matches!(self, AutocompleteField::PostalCode | AutocompleteField::Locality)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AutocompleteEvent {
    /// Earlier suggestions that match what is typed now.
    Cached {
        field: AutocompleteField,
        predictions: Vec<FieldSet>,
    },
    Fresh {
        field: AutocompleteField,
        predictions: Vec<FieldSet>,
    },
    /// A newer query of the same field is in flight; this one was dropped.
    Stale { field: AutocompleteField },
}

#[derive(Debug, Error)]
#[error("autocomplete needs an address coordinator, got {0}")]
pub struct NotAnAddress(pub EntityKind);

type CacheKey = (AutocompleteField, String);

/// Autocomplete front of an address coordinator.
#[derive(Debug)]
pub struct AddressAutocomplete {
    coordinator: Arc<EntityCoordinator>,
    cache: Mutex<HashMap<CacheKey, Vec<FieldSet>>>,
}

impl AddressAutocomplete {
    pub fn new(coordinator: Arc<EntityCoordinator>) -> Result<Self, NotAnAddress> {
        if coordinator.kind() != EntityKind::Address {
            return Err(NotAnAddress(coordinator.kind()));
        }
        Ok(Self {
            coordinator,
            cache: Mutex::default(),
        })
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<EntityCoordinator> {
        &self.coordinator
    }

    /// Suggest values for `field` from the coordinator's current data.
    ///
    /// Events go to `events`; a dropped receiver is not an error.
    pub async fn suggest(
        &self,
        field: AutocompleteField,
        events: &UnboundedSender<AutocompleteEvent>,
    ) -> Result<(), ClientError> {
        let data = self.coordinator.data();
        let key = (field, data.trimmed(COUNTRY_CODE).to_lowercase());

        if field.is_cached() {
            let cached = self.cached(&key, data.trimmed(field.field()));
            if !cached.is_empty() {
                let _ = events.send(AutocompleteEvent::Cached {
                    field,
                    predictions: cached,
                });
            }
        }

        let client = self.coordinator.client();
        let reply = match field {
            AutocompleteField::PostalCode => client.postal_code_autocomplete(&data).await?,
            AutocompleteField::Locality => client.locality_autocomplete(&data).await?,
            AutocompleteField::StreetName => {
                client.street_autocomplete(&data, StreetMode::Split).await?
            }
            AutocompleteField::StreetFull => {
                client.street_autocomplete(&data, StreetMode::Full).await?
            }
        };

        let Some(check) = reply.into_current() else {
            let _ = events.send(AutocompleteEvent::Stale { field });
            return Ok(());
        };
        if field.is_cached() {
            self.remember(key, &check.predictions);
        }
        tracing::trace!(field = field.field(), count = check.predictions.len(), "suggestions");
        let _ = events.send(AutocompleteEvent::Fresh {
            field,
            predictions: check.predictions,
        });
        Ok(())
    }

    /// Write the picked suggestion into the address.
    pub fn accept_suggestion(&self, prediction: &FieldSet) {
        self.coordinator.apply_prediction(prediction);
    }

    fn cached(&self, key: &CacheKey, typed: &str) -> Vec<FieldSet> {
        let typed = typed.to_lowercase();
        let field = key.0.field();
        self.lock()
            .get(key)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|p| p.value(field).to_lowercase().starts_with(&typed))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    fn remember(&self, key: CacheKey, predictions: &[FieldSet]) {
        let mut cache = self.lock();
        let entries = cache.entry(key).or_default();
        for prediction in predictions {
            if !entries.contains(prediction) {
                entries.push(prediction.clone());
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<CacheKey, Vec<FieldSet>>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;
    use verity_types::field::BUILDING_NUMBER;

    use super::*;
    use crate::entity::testing::{Harness, check_reply};

    fn harness(postal: &str) -> Harness {
        Harness::address(FieldSet::from([
            (COUNTRY_CODE, "de"),
            (POSTAL_CODE, postal),
            (LOCALITY, ""),
            (STREET_NAME, ""),
            (BUILDING_NUMBER, ""),
        ]))
    }

    fn berlin_codes() -> serde_json::Value {
        json!([
            { "postCode": "10115", "cityName": "Berlin" },
            { "postCode": "10117", "cityName": "Berlin" },
        ])
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AutocompleteEvent>) -> Vec<AutocompleteEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn cached_suggestions_come_before_fresh_ones() {
        let harness = harness("101");
        let autocomplete = AddressAutocomplete::new(harness.coordinator.clone()).unwrap();
        harness
            .transport
            .push("postCodeAutocomplete", check_reply(&[], berlin_codes()));
        harness
            .transport
            .push("postCodeAutocomplete", check_reply(&[], berlin_codes()));
        let (tx, mut rx) = mpsc::unbounded_channel();

        autocomplete.suggest(AutocompleteField::PostalCode, &tx).await.unwrap();
        let first = drain(&mut rx);
        assert!(matches!(first.as_slice(), [AutocompleteEvent::Fresh { predictions, .. }] if predictions.len() == 2));

        harness.coordinator.set_field(POSTAL_CODE, "10117");
        autocomplete.suggest(AutocompleteField::PostalCode, &tx).await.unwrap();
        let second = drain(&mut rx);
        assert_eq!(second.len(), 2);
        let AutocompleteEvent::Cached { predictions, .. } = &second[0] else {
            panic!("expected cached suggestions first: {second:?}");
        };
        assert_eq!(predictions.len(), 1);
        assert_eq!(predictions[0].get(POSTAL_CODE), Some("10117"));

        // Repeated answers are not cached twice.
        assert_eq!(autocomplete.cached(&(AutocompleteField::PostalCode, "de".into()), "").len(), 2);
    }

    #[tokio::test]
    async fn cache_is_keyed_by_country() {
        let harness = harness("101");
        let autocomplete = AddressAutocomplete::new(harness.coordinator.clone()).unwrap();
        harness
            .transport
            .push("postCodeAutocomplete", check_reply(&[], berlin_codes()));
        harness
            .transport
            .push("postCodeAutocomplete", check_reply(&[], json!([])));
        let (tx, mut rx) = mpsc::unbounded_channel();

        autocomplete.suggest(AutocompleteField::PostalCode, &tx).await.unwrap();
        drain(&mut rx);

        harness.coordinator.set_field(COUNTRY_CODE, "AT");
        autocomplete.suggest(AutocompleteField::PostalCode, &tx).await.unwrap();
        let events = drain(&mut rx);
        assert!(matches!(events.as_slice(), [AutocompleteEvent::Fresh { predictions, .. }] if predictions.is_empty()));
    }

    #[tokio::test]
    async fn street_suggestions_carry_the_full_street() {
        let harness = harness("10115");
        harness.coordinator.set_field(STREET_NAME, "Haupt");
        let autocomplete = AddressAutocomplete::new(harness.coordinator.clone()).unwrap();
        harness.transport.push(
            "streetAutocomplete",
            check_reply(&[], json!([{ "street": "Hauptstr.", "houseNumber": "" }])),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        autocomplete.suggest(AutocompleteField::StreetName, &tx).await.unwrap();
        let events = drain(&mut rx);
        let [AutocompleteEvent::Fresh { predictions, .. }] = events.as_slice() else {
            panic!("unexpected events: {events:?}");
        };
        assert_eq!(predictions[0].get(STREET_FULL), Some("Hauptstr."));
        assert!(autocomplete.lock().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn outdated_answers_are_reported_stale() {
        let harness = harness("1");
        let autocomplete = AddressAutocomplete::new(harness.coordinator.clone()).unwrap();
        harness.transport.push_delayed(
            "postCodeAutocomplete",
            check_reply(&[], berlin_codes()),
            Duration::from_millis(100),
        );
        harness.transport.push_delayed(
            "postCodeAutocomplete",
            check_reply(&[], berlin_codes()),
            Duration::from_millis(10),
        );
        let (tx, mut rx) = mpsc::unbounded_channel();

        let (a, b) = tokio::join!(
            autocomplete.suggest(AutocompleteField::PostalCode, &tx),
            autocomplete.suggest(AutocompleteField::PostalCode, &tx),
        );
        a.unwrap();
        b.unwrap();

        let events = drain(&mut rx);
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], AutocompleteEvent::Fresh { .. }));
        assert_eq!(
            events[1],
            AutocompleteEvent::Stale {
                field: AutocompleteField::PostalCode
            }
        );
    }

    #[tokio::test]
    async fn accepted_suggestion_is_written_to_the_form() {
        let harness = harness("101");
        let autocomplete = AddressAutocomplete::new(harness.coordinator.clone()).unwrap();
        autocomplete.accept_suggestion(&FieldSet::from([
            (POSTAL_CODE, "10115"),
            (LOCALITY, "Berlin"),
        ]));
        let sink = harness.fields.snapshot();
        assert_eq!(sink.get(POSTAL_CODE), Some("10115"));
        assert_eq!(sink.get(LOCALITY), Some("Berlin"));
    }

    #[test]
    fn only_address_coordinators_autocomplete() {
        let harness = Harness::email(FieldSet::from([("email", "")]));
        let err = AddressAutocomplete::new(harness.coordinator.clone()).unwrap_err();
        assert_eq!(err.0, EntityKind::Email);
    }
}
