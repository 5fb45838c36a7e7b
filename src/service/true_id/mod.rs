//! TrueID (vendor B) client side: request building, decoding and normalization

mod decoder;

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value};

use crate::model::true_id::{DecodedRecord, PASSED};
use crate::model::{
    ConfigError, LexisNexisConfig, NormalizedOutcome, OutcomeErrors, RawResponse, TrueIdRecord,
};
use crate::request::PreparedRequest;
use crate::service::error_generator::ErrorGenerator;
use crate::service::notifier::FaultNotifier;
use crate::service::pii;

pub use decoder::{TrueIdDecoder, parse_alerts, pivot_image_metrics};
pub(crate) use decoder::value_to_string;

pub const TRUE_ID_CALLER: &str = "TrueIdRequest";

const TRANSACTION_PASSED: &str = "passed";
const PRODUCT_PASSED: &str = "pass";

/// Authentication-result keys that carry document holder data
const PII_EXCLUDES: &[&str] = &[
    "Age",
    "DocIssuerCode",
    "DocIssuerName",
    "DocIssue",
    "DocumentName",
    "DocSize",
    "DOB_Day",
    "DOB_Month",
    "DOB_Year",
    "DocIssueType",
    "ExpirationDate_Day",
    "ExpirationDate_Month",
    "ExpirationDate_Year",
    "FullName",
    "Portrait",
    "Sex",
];

/// Build the TrueID verification request
///
/// `body` is the already-assembled JSON payload (document images and settings).
pub fn true_id_request(
    config: &LexisNexisConfig,
    liveness_enabled: bool,
    body: impl Into<Vec<u8>>,
) -> Result<PreparedRequest, ConfigError> {
    let url = config.conversation_url(liveness_enabled)?;
    let username = config
        .trueid_username
        .as_deref()
        .ok_or(ConfigError::Missing("trueid_username"))?;
    let password = config
        .trueid_password
        .as_deref()
        .ok_or(ConfigError::Missing("trueid_password"))?;

    Ok(PreparedRequest::new(TRUE_ID_CALLER, Method::POST, url)
        .basic_auth(username, password)
        .body(body))
}

/// Whether TrueID verified the document
///
/// Requires a passed transaction, the TrueID product, a passed product
/// status and a passed doc-auth result. Anything missing counts as not passed.
pub fn successful_result(record: &TrueIdRecord) -> bool {
    match record {
        TrueIdRecord::Decoded(record) => is_passed(record),
        TrueIdRecord::Degraded(_) => false,
    }
}

fn is_passed(record: &DecodedRecord) -> bool {
    record.transaction_status.as_deref() == Some(TRANSACTION_PASSED)
        && record.product_status.as_deref() == Some(PRODUCT_PASSED)
        && record.doc_auth_result.as_deref() == Some(PASSED)
}

/// Turns TrueID responses into [`NormalizedOutcome`]s
pub struct TrueIdNormalizer {
    decoder: TrueIdDecoder,
    errors: ErrorGenerator,
}

impl TrueIdNormalizer {
    pub fn new(notifier: Arc<dyn FaultNotifier>) -> Self {
        Self {
            decoder: TrueIdDecoder::new(notifier.clone()),
            errors: ErrorGenerator::new(notifier),
        }
    }

    pub fn decode(&self, body: &str, liveness_enabled: bool) -> TrueIdRecord {
        self.decoder.decode(body, liveness_enabled)
    }

    pub fn normalize(&self, response: &RawResponse, liveness_enabled: bool) -> NormalizedOutcome {
        let record = self.decode(&response.body, liveness_enabled);
        self.outcome(&record, liveness_enabled)
    }

    /// Assemble the outcome for a decoded record
    pub fn outcome(&self, record: &TrueIdRecord, liveness_enabled: bool) -> NormalizedOutcome {
        let success = successful_result(record);

        let outcome = match record {
            TrueIdRecord::Decoded(decoded) => {
                let errors = if success {
                    OutcomeErrors::None
                } else {
                    OutcomeErrors::Classified(self.errors.generate(decoded, liveness_enabled))
                };
                NormalizedOutcome {
                    success,
                    errors,
                    extra: extra_attributes(decoded),
                    pii: pii::from_true_id(record),
                    exception: None,
                }
            }
            TrueIdRecord::Degraded(degraded) => NormalizedOutcome {
                success: false,
                errors: OutcomeErrors::Network,
                extra: degraded.attributes(),
                pii: Default::default(),
                exception: Some(degraded.fault()),
            },
        };

        tracing::info!(
            success = outcome.success,
            errors = %serde_json::to_string(&outcome.errors).unwrap_or_default(),
            "Normalized TrueID response"
        );
        outcome
    }
}

/// Response info merged with the authentication result, minus PII-bearing keys
fn extra_attributes(record: &DecodedRecord) -> Map<String, Value> {
    let mut attrs = match record.response_info() {
        Value::Object(info) => info,
        _ => Map::new(),
    };
    for (key, value) in &record.authentication_result {
        if !PII_EXCLUDES.contains(&key.as_str()) {
            attrs.insert(key.clone(), value.clone());
        }
    }
    attrs
}
