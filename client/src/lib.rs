//! Client for the remote validation service.
//!
//! # Request sequencing
//!
//! Every logical operation owns a monotonic request counter. A call bumps the
//! counter before it is dispatched and tags the envelope with the new id. When
//! the reply arrives its echoed id is compared with the counter's *current*
//! value: if a newer call of the same operation was issued in the meantime
//! the reply is marked stale ([`Reply::is_current`] is false) and callers must
//! not commit it. Obsolete calls are never cancelled.
//!
//! # Accounting
//!
//! Successful billable calls made under a session id bump the session
//! counter. `doAccounting` reports the counter and is itself free.
//!
//! # Errors
//!
//! Transport, status, timeout, remote and decode failures are reported to the
//! [`ErrorSink`] and then returned.

mod error;
mod mapping;
mod operation;
pub mod protocol;
mod transport;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use verity_core::street::{build_street_full, compose, infer_order};
use verity_types::field::{
    BUILDING_NUMBER, COUNTRY_CODE, EMAIL, FIRST_NAME, LAST_NAME, LOCALITY, PHONE,
    POSTAL_CODE, SALUTATION, STREET_FULL, STREET_NAME, TITLE,
};
use verity_types::{FieldSet, Other, RequestId, Session, StreetMode};

pub use error::{ClientError, ErrorSink, TracingErrorSink};
pub use mapping::{DefaultFieldMapping, FieldMapping, from_wire_object, to_wire_params};
pub use operation::{Operation, RequestCounters};
pub use transport::{
    ClientSettings, DEFAULT_AGENT, DEFAULT_ENDPOINT, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT,
    HttpTransport, NO_TRANSACTION, Outgoing, Transport, TransportFut,
};

use protocol::{RpcRequest, RpcResponse, WireCheck, WireSplit};

/// A reply tagged with the request id it answers.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply<T> {
    pub id: RequestId,
    /// False when a newer call of the same operation was issued meanwhile.
    pub current: bool,
    pub value: T,
}

impl<T> Reply<T> {
    #[must_use]
    pub fn is_current(&self) -> bool {
        self.current
    }

    /// The value, if the reply is still current.
    pub fn into_current(self) -> Option<T> {
        self.current.then_some(self.value)
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Reply<U> {
        Reply {
            id: self.id,
            current: self.current,
            value: f(self.value),
        }
    }
}

/// Verdict of a check or autocomplete call, in domain field names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckResult {
    pub status: Vec<String>,
    pub predictions: Vec<FieldSet>,
    pub score: Option<f64>,
}

/// Street parts returned by `splitStreet`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitStreet {
    pub street_name: String,
    pub building_number: String,
    pub additional_info: Option<String>,
}

pub struct RemoteValidationClient {
    transport: Arc<dyn Transport>,
    session: Arc<Session>,
    counters: RequestCounters,
    mapping: Arc<dyn FieldMapping>,
    errors: Arc<dyn ErrorSink>,
    language: String,
    timeout: Duration,
}

impl std::fmt::Debug for RemoteValidationClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteValidationClient")
            .field("session", &self.session)
            .field("counters", &self.counters)
            .field("language", &self.language)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl RemoteValidationClient {
    pub fn new(transport: Arc<dyn Transport>, session: Arc<Session>) -> Self {
        Self {
            transport,
            session,
            counters: RequestCounters::new(),
            mapping: Arc::new(DefaultFieldMapping),
            errors: Arc::new(TracingErrorSink),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Client over HTTP using `settings`.
    pub fn http(settings: &ClientSettings, session: Arc<Session>) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(settings)?;
        Ok(Self::new(Arc::new(transport), session)
            .with_language(settings.language.clone())
            .with_timeout(settings.timeout))
    }

    pub fn with_mapping(mut self, mapping: Arc<dyn FieldMapping>) -> Self {
        self.mapping = mapping;
        self
    }

    pub fn with_error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    #[must_use]
    pub fn counters(&self) -> &RequestCounters {
        &self.counters
    }

    #[must_use]
    pub fn mapping(&self) -> &dyn FieldMapping {
        self.mapping.as_ref()
    }

    pub async fn address_check(&self, data: &FieldSet) -> Result<Reply<CheckResult>, ClientError> {
        let mut params = to_wire_params(self.mapping.as_ref(), data);
        self.insert_language(&mut params);
        let reply = self.call(Operation::AddressCheck, Some(Value::Object(params))).await?;
        let input = street_input(data);
        self.decode_check(Operation::AddressCheck, reply).map(|reply| {
            reply.map(|mut check| {
                for prediction in &mut check.predictions {
                    enrich_with_street_full(prediction, &input);
                }
                check
            })
        })
    }

    pub async fn person_check(&self, data: &FieldSet) -> Result<Reply<CheckResult>, ClientError> {
        let person = data.project(&[SALUTATION, TITLE, FIRST_NAME, LAST_NAME]);
        let mut params = to_wire_params(self.mapping.as_ref(), &person);
        self.insert_language(&mut params);
        let reply = self.call(Operation::PersonCheck, Some(Value::Object(params))).await?;
        self.decode_check(Operation::PersonCheck, reply)
    }

    /// Check a phone number. `other.data_format` selects the output format.
    pub async fn phone_check(
        &self,
        data: &FieldSet,
        other: &Other,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let phone = data.project(&[PHONE, COUNTRY_CODE]);
        let mut params = to_wire_params(self.mapping.as_ref(), &phone);
        if let Some(format) = &other.data_format {
            params.insert("format".into(), Value::String(format.clone()));
        }
        let reply = self.call(Operation::PhoneCheck, Some(Value::Object(params))).await?;
        self.decode_check(Operation::PhoneCheck, reply)
    }

    pub async fn email_check(&self, data: &FieldSet) -> Result<Reply<CheckResult>, ClientError> {
        let params = to_wire_params(self.mapping.as_ref(), &data.project(&[EMAIL]));
        let reply = self.call(Operation::EmailCheck, Some(Value::Object(params))).await?;
        self.decode_check(Operation::EmailCheck, reply)
    }

    pub async fn postal_code_autocomplete(
        &self,
        data: &FieldSet,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let query = data.project_filled(&[COUNTRY_CODE, POSTAL_CODE]);
        self.autocomplete(Operation::PostalCodeAutocomplete, &query).await
    }

    pub async fn locality_autocomplete(
        &self,
        data: &FieldSet,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let query = data.project_filled(&[COUNTRY_CODE, POSTAL_CODE, LOCALITY]);
        self.autocomplete(Operation::LocalityAutocomplete, &query).await
    }

    /// Street suggestions. Split mode queries by street name, full mode by the
    /// whole street line; predictions always carry `streetFull`.
    pub async fn street_autocomplete(
        &self,
        data: &FieldSet,
        mode: StreetMode,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let (operation, street_field) = match mode {
            StreetMode::Split => (Operation::StreetNameAutocomplete, STREET_NAME),
            StreetMode::Full => (Operation::StreetFullAutocomplete, STREET_FULL),
        };
        let query = data.project_filled(&[COUNTRY_CODE, POSTAL_CODE, LOCALITY, street_field]);
        let input = street_input(data);
        let reply = self.autocomplete(operation, &query).await?;
        Ok(reply.map(|mut check| {
            for prediction in &mut check.predictions {
                enrich_with_street_full(prediction, &input);
            }
            check
        }))
    }

    pub async fn split_street(
        &self,
        street_full: &str,
        country: &str,
    ) -> Result<Reply<SplitStreet>, ClientError> {
        let params = serde_json::json!({
            "formatCountry": country,
            "language": self.language,
            "streetFull": street_full,
        });
        let reply = self.call(Operation::SplitStreet, Some(params)).await?;
        let split: WireSplit = self.decode_result(Operation::SplitStreet, reply.value)?;
        Ok(Reply {
            id: reply.id,
            current: reply.current,
            value: SplitStreet {
                street_name: split.street,
                building_number: split.house_number,
                additional_info: split.additional_info.filter(|s| !s.trim().is_empty()),
            },
        })
    }

    /// Report the session counter and return the value sent. Returns
    /// `Ok(0)` without a call when there is no session id or nothing to
    /// account.
    pub async fn do_accounting(&self) -> Result<u64, ClientError> {
        let Some(session_id) = self.session.id() else {
            return Ok(0);
        };
        let counter = self.session.counter();
        if counter == 0 {
            return Ok(0);
        }
        let params = serde_json::json!({
            "sessionId": session_id,
            "sessionCounter": counter,
        });
        self.call(Operation::DoAccounting, Some(params)).await?;
        Ok(counter)
    }

    async fn autocomplete(
        &self,
        operation: Operation,
        query: &FieldSet,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let mut params = to_wire_params(self.mapping.as_ref(), query);
        self.insert_language(&mut params);
        let reply = self.call(operation, Some(Value::Object(params))).await?;
        self.decode_check(operation, reply)
    }

    /// Dispatch one call and apply the race guard to its reply.
    async fn call(
        &self,
        operation: Operation,
        params: Option<Value>,
    ) -> Result<Reply<Value>, ClientError> {
        let id = self.counters.next(operation);
        let outgoing = Outgoing {
            request: RpcRequest::new(id.value(), operation.method(), params),
            transaction_id: self
                .session
                .id()
                .unwrap_or_else(|| NO_TRANSACTION.to_string()),
        };
        tracing::debug!(operation = %operation, id = %id, "dispatching");

        let result = match tokio::time::timeout(self.timeout, self.transport.send(&outgoing)).await
        {
            Ok(result) => result.and_then(unwrap_response),
            Err(_) => Err(ClientError::Timeout {
                operation,
                after: self.timeout,
            }),
        };

        let (echoed, value) = match result {
            Ok(ok) => ok,
            Err(e) => {
                self.errors.report(operation, &e);
                return Err(e);
            }
        };

        if operation.is_billable() {
            self.session.record_call();
        }

        let echoed = RequestId::new(echoed);
        let current = self.counters.is_latest(operation, echoed);
        if !current {
            tracing::debug!(
                operation = %operation,
                id = %echoed,
                latest = %self.counters.current(operation),
                "discarding stale reply"
            );
        }
        Ok(Reply {
            id: echoed,
            current,
            value,
        })
    }

    fn decode_check(
        &self,
        operation: Operation,
        reply: Reply<Value>,
    ) -> Result<Reply<CheckResult>, ClientError> {
        let Reply { id, current, value } = reply;
        let wire: WireCheck = self.decode_result(operation, value)?;
        let mapping = self.mapping.as_ref();
        Ok(Reply {
            id,
            current,
            value: CheckResult {
                status: wire.status,
                predictions: wire
                    .predictions
                    .iter()
                    .map(|p| from_wire_object(mapping, p))
                    .collect(),
                score: wire.score,
            },
        })
    }

    fn decode_result<T: serde::de::DeserializeOwned>(
        &self,
        operation: Operation,
        value: Value,
    ) -> Result<T, ClientError> {
        serde_json::from_value(value).map_err(|e| {
            let err = ClientError::from(e);
            self.errors.report(operation, &err);
            err
        })
    }

    fn insert_language(&self, params: &mut Map<String, Value>) {
        params.insert("language".into(), Value::String(self.language.clone()));
    }
}

fn unwrap_response(response: RpcResponse) -> Result<(u64, Value), ClientError> {
    if let Some(error) = response.error {
        return Err(ClientError::Remote {
            code: error.code,
            message: error.message,
        });
    }
    let id = response
        .id
        .ok_or_else(|| ClientError::Decode("response without id".into()))?;
    let result = response
        .result
        .ok_or_else(|| ClientError::Decode("response without result".into()))?;
    Ok((id, result))
}

/// The street as the user typed it, for order inference.
fn street_input(data: &FieldSet) -> String {
    if data.is_blank(STREET_FULL) {
        build_street_full(
            data.value(STREET_NAME),
            data.value(BUILDING_NUMBER),
            data.value(COUNTRY_CODE),
        )
    } else {
        data.trimmed(STREET_FULL).to_string()
    }
}

/// Fill in `streetFull` for a prediction that only has the street parts.
///
/// The order follows the user's own input when both parts can be found in
/// it; otherwise, blank input included, the name comes first.
pub fn enrich_with_street_full(prediction: &mut FieldSet, input: &str) {
    if prediction.contains(STREET_FULL) {
        return;
    }
    let name = prediction.value(STREET_NAME).to_string();
    let number = prediction.value(BUILDING_NUMBER).to_string();
    if name.trim().is_empty() && number.trim().is_empty() {
        return;
    }
    let order = infer_order(input, &name, &number);
    prediction.set(STREET_FULL, compose(&name, &number, order));
}
