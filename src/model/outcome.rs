use std::time::Duration;

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use super::errors::ClassificationResult;
use super::fault::Fault;

/// One HTTP attempt's worth of response data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
    /// Wall-clock time from send to fully read body
    pub elapsed: Duration,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Identity fields extracted from a verified document
///
/// Every field is optional since vendors omit fields the document does not carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Pii {
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub dob_year: Option<String>,
    pub dob_month: Option<String>,
    pub dob_day: Option<String>,
    /// `MM/DD/YYYY`
    pub dob: Option<String>,
    pub state_id_number: Option<String>,
    pub state_id_jurisdiction: Option<String>,
    pub state_id_type: Option<String>,
}

impl Pii {
    pub fn is_empty(&self) -> bool {
        *self == Pii::default()
    }
}

/// Caller-visible error shape
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutcomeErrors {
    #[default]
    None,
    /// Transport or vendor-availability problem: `{"network": true}`
    Network,
    /// Categorized message keys
    Classified(ClassificationResult),
    /// Vendor A dispositions: `{"results": [...]}`
    Dispositions(Vec<String>),
}

impl OutcomeErrors {
    pub fn is_empty(&self) -> bool {
        match self {
            OutcomeErrors::None => true,
            OutcomeErrors::Network => false,
            OutcomeErrors::Classified(result) => result.is_empty(),
            OutcomeErrors::Dispositions(results) => results.is_empty(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, OutcomeErrors::Network)
    }
}

impl Serialize for OutcomeErrors {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OutcomeErrors::None => serializer.serialize_map(Some(0))?.end(),
            OutcomeErrors::Network => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("network", &true)?;
                map.end()
            }
            OutcomeErrors::Classified(result) => result.serialize(serializer),
            OutcomeErrors::Dispositions(results) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("results", results)?;
                map.end()
            }
        }
    }
}

/// Uniform result of one verification call, whichever vendor answered
///
/// The `Serialize` impl is the log-safe view: `pii` is skipped so the
/// outcome can be written to event logs as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NormalizedOutcome {
    pub success: bool,
    pub errors: OutcomeErrors,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    #[serde(skip)]
    pub pii: Pii,
    pub exception: Option<Fault>,
}

impl NormalizedOutcome {
    /// Outcome for a call that never produced a usable vendor response
    pub fn network_failure(exception: Fault) -> Self {
        Self {
            success: false,
            errors: OutcomeErrors::Network,
            extra: Map::new(),
            pii: Pii::default(),
            exception: Some(exception),
        }
    }
}
