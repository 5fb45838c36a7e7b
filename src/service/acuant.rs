//! AssureID (vendor A) results normalization

use std::sync::Arc;

use reqwest::Method;
use serde_json::{Map, Value, json};

use crate::model::acuant::{RawAlert, ResultCode, ResultsBody};
use crate::model::{
    AcuantConfig, ConfigError, Fault, FaultContext, NormalizedOutcome, OutcomeErrors, RawResponse,
};
use crate::request::PreparedRequest;
use crate::service::notifier::FaultNotifier;
use crate::service::pii;

pub const GET_RESULTS_CALLER: &str = "GetResultsRequest";

/// The only attention disposition that still counts as a pass
pub const BARCODE_COULD_NOT_BE_READ: &str = "The 2D barcode could not be read";

/// Build the request fetching the results of a document instance
pub fn get_results_request(
    config: &AcuantConfig,
    instance_id: &str,
) -> Result<PreparedRequest, ConfigError> {
    let url = config.url_for(&format!("/AssureIDService/Document/{}", instance_id))?;
    let username = config
        .assure_id_username
        .as_deref()
        .ok_or(ConfigError::Missing("assure_id_username"))?;
    let password = config
        .assure_id_password
        .as_deref()
        .ok_or(ConfigError::Missing("assure_id_password"))?;

    let mut request =
        PreparedRequest::new(GET_RESULTS_CALLER, Method::GET, url).basic_auth(username, password);
    if let Some(subscription) = config.assure_id_subscription_id.as_deref() {
        request = request.header("Subscription", subscription);
    }
    Ok(request)
}

/// Whether AssureID verified the document
///
/// Passed, or Attention where every alert either passed or is the
/// unreadable-barcode attention.
pub fn successful_result(body: &ResultsBody) -> bool {
    match body.result.and_then(ResultCode::from_int) {
        Some(ResultCode::PASSED) => true,
        Some(ResultCode::ATTENTION) => body.alerts.iter().all(is_passed_or_barcode_attention),
        _ => false,
    }
}

fn is_passed_or_barcode_attention(alert: &RawAlert) -> bool {
    match alert.result_code() {
        Some(ResultCode::PASSED) => true,
        Some(ResultCode::ATTENTION) => {
            alert.disposition.as_deref() == Some(BARCODE_COULD_NOT_BE_READ)
        }
        _ => false,
    }
}

/// Deduplicated dispositions of every alert that did not pass
pub fn failed_dispositions(body: &ResultsBody) -> Vec<String> {
    let mut dispositions: Vec<String> = Vec::new();
    for alert in &body.alerts {
        if alert.result_code() == Some(ResultCode::PASSED) {
            continue;
        }
        let Some(disposition) = alert.disposition.as_ref() else {
            continue;
        };
        if !dispositions.contains(disposition) {
            dispositions.push(disposition.clone());
        }
    }
    dispositions
}

/// Turns AssureID results into [`NormalizedOutcome`]s
pub struct AcuantNormalizer {
    notifier: Arc<dyn FaultNotifier>,
}

impl AcuantNormalizer {
    pub fn new(notifier: Arc<dyn FaultNotifier>) -> Self {
        Self { notifier }
    }

    pub fn normalize(&self, response: &RawResponse) -> NormalizedOutcome {
        let body: ResultsBody = match serde_json::from_str(&response.body) {
            Ok(body) => body,
            Err(e) => {
                let fault = Fault::UnexpectedVendorShape(format!(
                    "AssureID results are not valid JSON: {}",
                    e
                ));
                tracing::warn!(error = %e, "Unparseable AssureID results");
                self.notifier.notify(&fault, FaultContext::None);
                return NormalizedOutcome::network_failure(fault);
            }
        };
        self.outcome(&body)
    }

    pub fn outcome(&self, body: &ResultsBody) -> NormalizedOutcome {
        let success = successful_result(body);
        let errors = if success {
            OutcomeErrors::None
        } else {
            OutcomeErrors::Dispositions(failed_dispositions(body))
        };

        if let Some(code) = body.result.filter(|code| ResultCode::from_int(*code).is_none()) {
            tracing::warn!(result = code, "AssureID result code has no mapping");
        }
        tracing::info!(
            success,
            result = ?body.result,
            alerts = body.alerts.len(),
            "Normalized AssureID results"
        );

        NormalizedOutcome {
            success,
            errors,
            extra: extra_attributes(body),
            pii: pii::from_acuant(body),
            exception: None,
        }
    }
}

/// `result`, `billed` and `raw_alerts`; the first two are null for an unmapped code
fn extra_attributes(body: &ResultsBody) -> Map<String, Value> {
    let code = body.result.and_then(ResultCode::from_int);
    let mut attrs = Map::new();
    attrs.insert("result".to_string(), json!(code.map(|c| c.name)));
    attrs.insert("billed".to_string(), json!(code.map(|c| c.billed)));
    attrs.insert(
        "raw_alerts".to_string(),
        serde_json::to_value(&body.alerts).unwrap_or(Value::Array(Vec::new())),
    );
    attrs
}
