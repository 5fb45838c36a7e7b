//! Error classification for failed TrueID verifications
//!
//! Turns the (possibly long) list of failed vendor alerts into a small set
//! of user-facing message keys, grouped by which part of the submission the
//! user should retry.

use std::sync::Arc;

use serde_json::Value;

use crate::model::true_id::DecodedRecord;
use crate::model::{Category, ClassificationResult, Fault, FaultContext, MessageKey, alert_message};
use crate::service::notifier::FaultNotifier;

const FACE_MATCH_PASS: &str = "Pass";

pub struct ErrorGenerator {
    notifier: Arc<dyn FaultNotifier>,
}

impl ErrorGenerator {
    pub fn new(notifier: Arc<dyn FaultNotifier>) -> Self {
        Self { notifier }
    }

    /// Classify the failures of a decoded record
    ///
    /// Never returns an empty result: when no single cause can be isolated
    /// the answer is the generic message for the liveness mode.
    pub fn generate(&self, record: &DecodedRecord, liveness_enabled: bool) -> ClassificationResult {
        let response_info = record.response_info();

        let unknown_failures = self.scan_for_unknown_alerts(record, &response_info);
        let mut errors = bucket_errors(record, liveness_enabled);

        let mut failure_count = record.alert_failure_count as i64 - unknown_failures as i64;
        if errors.contains_category(Category::Selfie) {
            failure_count += 1;
        }

        tracing::debug!(
            conversation_id = ?record.conversation_id,
            failure_count,
            unknown_failures,
            categories = ?errors.categories(),
            "Classifying TrueID failure"
        );

        if failure_count < 1 {
            return self.fallback(liveness_enabled, response_info);
        }
        if failure_count > 1 {
            errors = collapse(errors, liveness_enabled);
        }

        if errors.is_empty() {
            // vendor-reported count disagrees with the alerts it actually sent
            return self.fallback(liveness_enabled, response_info);
        }
        errors
    }

    /// Report alert names missing from the message table
    ///
    /// Returns how many of them are failures.
    fn scan_for_unknown_alerts(&self, record: &DecodedRecord, response_info: &Value) -> usize {
        let mut unknown = Vec::new();
        let mut unknown_failures = 0;

        for alert in record.alerts.iter() {
            if alert_message(&alert.name).is_some() {
                continue;
            }
            unknown.push(alert.name.clone());
            if !alert.passed() {
                unknown_failures += 1;
            }
        }

        if !unknown.is_empty() {
            tracing::warn!(alerts = ?unknown, "TrueID responded with unhandled alert names");
            self.notifier.notify(
                &Fault::UnknownCheck(unknown),
                FaultContext::ResponseInfo(response_info.clone()),
            );
        }

        unknown_failures
    }

    fn fallback(&self, liveness_enabled: bool, response_info: Value) -> ClassificationResult {
        self.notifier.notify(
            &Fault::ClassificationFallback,
            FaultContext::ResponseInfo(response_info),
        );
        ClassificationResult::single(Category::General, MessageKey::general(liveness_enabled))
    }
}

/// Known failed alerts by category, plus the selfie failure when liveness is on
fn bucket_errors(record: &DecodedRecord, liveness_enabled: bool) -> ClassificationResult {
    let mut errors = ClassificationResult::new();

    for alert in &record.alerts.failed {
        if let Some(mapped) = alert_message(&alert.name) {
            errors.add(mapped.category, mapped.message);
        }
    }

    if liveness_enabled && record.face_match_result() != Some(FACE_MATCH_PASS) {
        errors.add(Category::Selfie, MessageKey::SelfieFailure);
    }

    errors
}

/// Simplify multiple failures into one message
fn collapse(mut errors: ClassificationResult, liveness_enabled: bool) -> ClassificationResult {
    let categories = errors.categories();

    match categories.as_slice() {
        [] => errors,
        [Category::Id] => {
            errors.replace(Category::Id, MessageKey::general(liveness_enabled));
            errors
        }
        [Category::Front] => {
            errors.replace(Category::Front, MessageKey::MultipleFrontIdFailures);
            errors
        }
        [Category::Back] => {
            errors.replace(Category::Back, MessageKey::MultipleBackIdFailures);
            errors
        }
        [_] => errors,
        // a selfie failure mixed with anything else always suggests retaking the selfie
        spanned if spanned.contains(&Category::Selfie) => {
            ClassificationResult::single(Category::General, MessageKey::GeneralErrorLiveness)
        }
        _ => ClassificationResult::single(Category::General, MessageKey::general(liveness_enabled)),
    }
}
