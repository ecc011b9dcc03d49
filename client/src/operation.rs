use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use verity_types::RequestId;

const OPERATION_COUNT: usize = 10;

/// Logical remote operations. Each has its own request counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    PostalCodeAutocomplete,
    LocalityAutocomplete,
    StreetNameAutocomplete,
    StreetFullAutocomplete,
    AddressCheck,
    PersonCheck,
    PhoneCheck,
    EmailCheck,
    SplitStreet,
    DoAccounting,
}

impl Operation {
    pub const ALL: [Operation; OPERATION_COUNT] = [
        Operation::PostalCodeAutocomplete,
        Operation::LocalityAutocomplete,
        Operation::StreetNameAutocomplete,
        Operation::StreetFullAutocomplete,
        Operation::AddressCheck,
        Operation::PersonCheck,
        Operation::PhoneCheck,
        Operation::EmailCheck,
        Operation::SplitStreet,
        Operation::DoAccounting,
    ];

    /// Wire method name. Both street autocompletes share one method.
    #[must_use]
    pub fn method(self) -> &'static str {
        match self {
            Operation::PostalCodeAutocomplete => "postCodeAutocomplete",
            Operation::LocalityAutocomplete => "cityNameAutocomplete",
            Operation::StreetNameAutocomplete | Operation::StreetFullAutocomplete => {
                "streetAutocomplete"
            }
            Operation::AddressCheck => "addressCheck",
            Operation::PersonCheck => "nameCheck",
            Operation::PhoneCheck => "phoneCheck",
            Operation::EmailCheck => "emailCheck",
            Operation::SplitStreet => "splitStreet",
            Operation::DoAccounting => "doAccounting",
        }
    }

    /// Whether a successful call counts towards the session counter.
    #[must_use]
    pub fn is_billable(self) -> bool {
        !matches!(self, Operation::DoAccounting)
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Operation::PostalCodeAutocomplete => "postal_code_autocomplete",
            Operation::LocalityAutocomplete => "locality_autocomplete",
            Operation::StreetNameAutocomplete => "street_name_autocomplete",
            Operation::StreetFullAutocomplete => "street_full_autocomplete",
            Operation::AddressCheck => "address_check",
            Operation::PersonCheck => "person_check",
            Operation::PhoneCheck => "phone_check",
            Operation::EmailCheck => "email_check",
            Operation::SplitStreet => "split_street",
            Operation::DoAccounting => "do_accounting",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Monotonic per-operation request ids.
#[derive(Debug, Default)]
pub struct RequestCounters {
    counters: [AtomicU64; OPERATION_COUNT],
}

impl RequestCounters {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the id for a call about to be dispatched.
    pub fn next(&self, op: Operation) -> RequestId {
        RequestId::new(self.counters[op.index()].fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Id of the most recently dispatched call of `op`.
    #[must_use]
    pub fn current(&self, op: Operation) -> RequestId {
        RequestId::new(self.counters[op.index()].load(Ordering::SeqCst))
    }

    #[must_use]
    pub fn is_latest(&self, op: Operation, id: RequestId) -> bool {
        self.current(op) == id
    }
}
