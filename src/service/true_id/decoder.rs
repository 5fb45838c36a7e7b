//! TrueID response decoding
//!
//! The vendor flattens repeating groups into prefixed keys inside its
//! `ParameterDetails` list. Decoding regroups them into alert records and a
//! per-side image metric map.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{Map, Value};

use crate::model::true_id::{
    GROUP_AUTHENTICATION_RESULT, GROUP_FIELD_DATA, GROUP_IMAGE_METRICS, GROUP_PORTRAIT_MATCH,
    ParameterDetail, Product, TRUE_ID_PRODUCT, TrueIdBody,
};
use crate::model::{
    AlertRecord, Alerts, DecodedRecord, DegradedRecord, FaultContext, ImageMetrics, TrueIdRecord,
};
use crate::service::notifier::FaultNotifier;

/// `Alert_<ordinal>_<field>`
static ALERT_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^Alert_(\d+)_(\w+)$").expect("alert key pattern is valid"));

const SIDE_METRIC: &str = "Side";

/// Decodes raw TrueID bodies into [`TrueIdRecord`]s
pub struct TrueIdDecoder {
    notifier: Arc<dyn FaultNotifier>,
}

impl TrueIdDecoder {
    pub fn new(notifier: Arc<dyn FaultNotifier>) -> Self {
        Self { notifier }
    }

    /// Decode a response body
    ///
    /// Never fails: a body without the TrueID product section (typically an
    /// account or communications error) yields a degraded record, and the
    /// notifier hears about it exactly once.
    pub fn decode(&self, body: &str, liveness_enabled: bool) -> TrueIdRecord {
        let raw: Value = match serde_json::from_str(body) {
            Ok(raw) => raw,
            Err(e) => {
                return self.degraded(
                    TrueIdBody::default(),
                    format!("TrueID response is not valid JSON: {}", e),
                );
            }
        };
        let parsed: TrueIdBody = match serde_json::from_value(raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                return self.degraded(
                    TrueIdBody::default(),
                    format!("TrueID response has an unexpected shape: {}", e),
                );
            }
        };

        let Some(raw_product) = parsed.product(TRUE_ID_PRODUCT) else {
            return self.degraded(parsed, "TrueID response not found".to_string());
        };
        let product: Product = match serde_json::from_value(raw_product.clone()) {
            Ok(product) => product,
            Err(e) => {
                let reason = format!("TrueID product section has an unexpected shape: {}", e);
                return self.degraded(parsed, reason);
            }
        };

        let details =
            ParameterGroups::from_details(product.parameter_details.as_deref().unwrap_or_default());
        let Some(authentication_result) = details.groups.get(GROUP_AUTHENTICATION_RESULT) else {
            return self.degraded(parsed, "TrueID authentication result not found".to_string());
        };

        let alerts = parse_alerts(authentication_result);
        let status = parsed.status.as_ref();

        let record = DecodedRecord {
            conversation_id: status
                .and_then(|s| s.get("ConversationId"))
                .and_then(value_to_string),
            reference: status
                .and_then(|s| s.get("Reference"))
                .and_then(value_to_string),
            liveness_checking: liveness_enabled,
            product_type: TRUE_ID_PRODUCT,
            transaction_status: status
                .and_then(|s| s.get("TransactionStatus"))
                .and_then(value_to_string),
            transaction_reason_code: status
                .and_then(|s| s.pointer("/TransactionReasonCode/Code"))
                .and_then(value_to_string),
            product_status: product.product_status.clone(),
            doc_auth_result: authentication_result
                .get("DocAuthResult")
                .and_then(value_to_string),
            alert_failure_count: alerts.failed.len(),
            alerts,
            portrait_match_results: details
                .groups
                .get(GROUP_PORTRAIT_MATCH)
                .cloned()
                .unwrap_or_default(),
            image_metrics: pivot_image_metrics(&details.image_metrics),
            authentication_result: authentication_result.clone(),
            field_data: details
                .groups
                .get(GROUP_FIELD_DATA)
                .cloned()
                .unwrap_or_default(),
        };

        tracing::debug!(
            conversation_id = ?record.conversation_id,
            doc_auth_result = ?record.doc_auth_result,
            passed_alerts = record.alerts.passed.len(),
            failed_alerts = record.alerts.failed.len(),
            "Decoded TrueID response"
        );

        TrueIdRecord::Decoded(record)
    }

    fn degraded(&self, body: TrueIdBody, reason: String) -> TrueIdRecord {
        let record = DegradedRecord {
            status: body.status,
            information: body.information,
            reason,
        };
        tracing::warn!(reason = %record.reason, "Unexpected TrueID response shape");
        self.notifier.notify(
            &record.fault(),
            FaultContext::ResponseInfo(Value::Object(record.attributes())),
        );
        TrueIdRecord::Degraded(record)
    }
}

/// `ParameterDetails` regrouped by their `Group` tag
#[derive(Debug, Default)]
struct ParameterGroups {
    /// Group to name to value; single-element value lists collapse to the element
    groups: HashMap<String, Map<String, Value>>,
    /// Image metric name to its per-side value list
    image_metrics: BTreeMap<String, Vec<Value>>,
}

impl ParameterGroups {
    fn from_details(details: &[ParameterDetail]) -> Self {
        let mut parsed = Self::default();

        for detail in details {
            let values: Option<Vec<Value>> = detail
                .values
                .as_ref()
                .map(|values| values.iter().map(|v| v.value.clone()).collect());

            if detail.group == GROUP_IMAGE_METRICS {
                parsed
                    .image_metrics
                    .insert(detail.name.clone(), values.unwrap_or_default());
                continue;
            }

            let value = match values.map(<[Value; 1]>::try_from) {
                None => Value::Null,
                Some(Ok([single])) => single,
                Some(Err(values)) => Value::Array(values),
            };
            parsed
                .groups
                .entry(detail.group.clone())
                .or_default()
                .insert(detail.name.clone(), value);
        }

        parsed
    }
}

#[derive(Debug, Default)]
struct PartialAlert {
    name: Option<String>,
    result: Option<String>,
    region: Option<String>,
}

/// Rebuild alert records from `Alert_<n>_*` keys in a single pass
pub fn parse_alerts(authentication_result: &Map<String, Value>) -> Alerts {
    let mut partials: BTreeMap<u32, PartialAlert> = BTreeMap::new();

    for (key, value) in authentication_result {
        let Some(captures) = ALERT_KEY.captures(key) else {
            continue;
        };
        let Ok(ordinal) = captures[1].parse::<u32>() else {
            tracing::warn!(key = %key, "Alert ordinal out of range");
            continue;
        };

        let partial = partials.entry(ordinal).or_default();
        match &captures[2] {
            "AlertName" => partial.name = value_to_string(value),
            "AuthenticationResult" => partial.result = value_to_string(value),
            "Regions" => partial.region = value_to_string(value),
            _ => {}
        }
    }

    let mut alerts = Alerts::default();
    for (ordinal, partial) in partials {
        let Some(name) = partial.name else {
            tracing::warn!(ordinal, "Alert group without an AlertName, skipping");
            continue;
        };
        let alert = AlertRecord {
            ordinal,
            name,
            result: partial.result,
            region: partial.region,
        };
        if alert.passed() {
            alerts.passed.push(alert);
        } else {
            alerts.failed.push(alert);
        }
    }

    alerts
}

/// Pivot metric-major lists into side-major maps, keyed by the `Side` metric
///
/// Without a `Side` metric there is nothing to key on and the result is empty.
pub fn pivot_image_metrics(metrics: &BTreeMap<String, Vec<Value>>) -> ImageMetrics {
    let mut pivoted = ImageMetrics::default();
    let Some(sides) = metrics.get(SIDE_METRIC) else {
        return pivoted;
    };

    for (idx, side) in sides.iter().enumerate() {
        let Some(side_name) = value_to_string(side) else {
            continue;
        };
        let per_side = metrics
            .iter()
            .map(|(name, values)| (name.clone(), values.get(idx).cloned().unwrap_or(Value::Null)))
            .collect();
        pivoted.insert(side_name, per_side);
    }

    pivoted
}

/// Render a scalar (or a list of scalars) as text
pub(crate) fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(value_to_string).collect();
            (!parts.is_empty()).then(|| parts.join(", "))
        }
        Value::Object(_) => Some(value.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, ClassificationResult, Fault, MessageKey};
    use crate::service::error_generator::ErrorGenerator;
    use crate::service::notifier::RecordingNotifier;
    use serde_json::json;

    fn auth_result(entries: &[(&str, &str)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), Value::from(*v)))
            .collect()
    }

    #[test]
    fn test_parse_alerts_merges_keys_by_ordinal() {
        let auth = auth_result(&[
            ("DocAuthResult", "Failed"),
            ("Alert_1_AlertName", "Visible Pattern"),
            ("Alert_1_AuthenticationResult", "Failed"),
            ("Alert_1_Regions", "Background"),
            ("Alert_2_AuthenticationResult", "Passed"),
            ("Alert_2_AlertName", "Birth Date Valid"),
            ("Alert_10_AlertName", "Layout Valid"),
            ("Alert_10_AuthenticationResult", "Attention"),
        ]);

        let alerts = parse_alerts(&auth);

        assert_eq!(alerts.passed.len(), 1);
        assert_eq!(alerts.passed[0].name, "Birth Date Valid");
        assert_eq!(alerts.failed.len(), 2);
        assert_eq!(alerts.failed[0].ordinal, 1);
        assert_eq!(alerts.failed[0].region.as_deref(), Some("Background"));
        assert_eq!(alerts.failed[1].ordinal, 10);
        assert_eq!(alerts.failed[1].result.as_deref(), Some("Attention"));
    }

    #[test]
    fn test_parse_alerts_missing_result_is_failure() {
        let auth = auth_result(&[("Alert_3_AlertName", "Sex Crosscheck")]);
        let alerts = parse_alerts(&auth);
        assert!(alerts.passed.is_empty());
        assert_eq!(alerts.failed[0].result, None);
    }

    #[test]
    fn test_parse_alerts_skips_nameless_groups() {
        let auth = auth_result(&[("Alert_4_AuthenticationResult", "Failed")]);
        let alerts = parse_alerts(&auth);
        assert!(alerts.passed.is_empty() && alerts.failed.is_empty());
    }

    #[test]
    fn test_pivot_image_metrics_by_side() {
        let mut metrics = BTreeMap::new();
        metrics.insert("Side".to_string(), vec![json!("Front"), json!("Back")]);
        metrics.insert("GlareMetric".to_string(), vec![json!("100"), json!("98")]);
        metrics.insert("SharpnessMetric".to_string(), vec![json!("65"), json!("60")]);

        let pivoted = pivot_image_metrics(&metrics);

        assert_eq!(pivoted.sides().collect::<Vec<_>>(), vec!["Front", "Back"]);
        let front = pivoted.get("Front").unwrap();
        assert_eq!(front["GlareMetric"], "100");
        assert_eq!(front["SharpnessMetric"], "65");
        assert_eq!(front["Side"], "Front");
        let back = pivoted.get("Back").unwrap();
        assert_eq!(back["GlareMetric"], "98");
        assert_eq!(back["SharpnessMetric"], "60");
    }

    #[test]
    fn test_pivot_without_side_metric_is_empty() {
        let mut metrics = BTreeMap::new();
        metrics.insert("GlareMetric".to_string(), vec![json!("100")]);
        assert!(pivot_image_metrics(&metrics).is_empty());
    }

    #[test]
    fn test_pivot_short_metric_list_fills_null() {
        let mut metrics = BTreeMap::new();
        metrics.insert("Side".to_string(), vec![json!("Front"), json!("Back")]);
        metrics.insert("GlareMetric".to_string(), vec![json!("100")]);

        let pivoted = pivot_image_metrics(&metrics);
        assert_eq!(pivoted.get("Back").unwrap()["GlareMetric"], Value::Null);
    }

    #[test]
    fn test_decode_groups_parameter_details() {
        let body = json!({
            "Status": {
                "ConversationId": 31000406181234u64,
                "Reference": "Reference1",
                "TransactionStatus": "passed",
                "TransactionReasonCode": { "Code": "trueid_pass" }
            },
            "Products": [{
                "ProductType": "TrueID",
                "ProductStatus": "pass",
                "ParameterDetails": [
                    { "Group": "AUTHENTICATION_RESULT", "Name": "DocAuthResult", "Values": [{ "Value": "Passed" }] },
                    { "Group": "AUTHENTICATION_RESULT", "Name": "Alert_1_AlertName", "Values": [{ "Value": "Visible Pattern" }] },
                    { "Group": "AUTHENTICATION_RESULT", "Name": "Alert_1_AuthenticationResult", "Values": [{ "Value": "Passed" }] },
                    { "Group": "PORTRAIT_MATCH_RESULT", "Name": "FaceMatchResult", "Values": [{ "Value": "Pass" }] },
                    { "Group": "IDAUTH_FIELD_DATA", "Name": "Fields_FirstName", "Values": [{ "Value": "JANE" }] },
                    { "Group": "IMAGE_METRICS_RESULT", "Name": "Side", "Values": [{ "Value": "Front" }, { "Value": "Back" }] },
                    { "Group": "IMAGE_METRICS_RESULT", "Name": "HorizontalResolution", "Values": [{ "Value": 600 }, { "Value": 598 }] }
                ]
            }]
        });
        let notifier = RecordingNotifier::new();

        let record = TrueIdDecoder::new(notifier.clone()).decode(&body.to_string(), true);

        let TrueIdRecord::Decoded(record) = record else {
            panic!("expected a decoded record");
        };
        assert_eq!(record.conversation_id.as_deref(), Some("31000406181234"));
        assert_eq!(record.transaction_reason_code.as_deref(), Some("trueid_pass"));
        assert_eq!(record.product_status.as_deref(), Some("pass"));
        assert_eq!(record.doc_auth_result.as_deref(), Some("Passed"));
        assert_eq!(record.face_match_result(), Some("Pass"));
        assert!(record.liveness_checking);
        assert_eq!(record.alerts.passed.len(), 1);
        assert_eq!(record.alert_failure_count, 0);
        assert_eq!(record.field_data["Fields_FirstName"], "JANE");
        assert_eq!(
            record.image_metrics.get("Back").unwrap()["HorizontalResolution"],
            598
        );
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_decode_without_product_is_degraded_and_notifies_once() {
        let body = json!({
            "Status": {
                "TransactionStatus": "error",
                "TransactionReasonCode": { "Code": "communications_error" }
            },
            "Information": { "InformationType": "Communications Error" }
        });
        let notifier = RecordingNotifier::new();

        let record = TrueIdDecoder::new(notifier.clone()).decode(&body.to_string(), false);

        let TrueIdRecord::Degraded(degraded) = record else {
            panic!("expected a degraded record");
        };
        assert_eq!(degraded.transaction_status(), Some("error"));
        assert_eq!(
            degraded.information,
            Some(json!({ "InformationType": "Communications Error" }))
        );

        let faults = notifier.faults();
        assert_eq!(faults.len(), 1);
        assert_eq!(
            faults[0].0,
            Fault::UnexpectedVendorShape("TrueID response not found".to_string())
        );
    }

    #[test]
    fn test_decode_ignores_shape_of_other_products() {
        let body = json!({
            "Status": { "TransactionStatus": "failed" },
            "Products": [
                {
                    "ProductType": "Other",
                    "ProductStatus": 3,
                    "ParameterDetails": [{ "Group": "X", "Name": "Y" }, { "Group": "Z" }]
                },
                {
                    "ProductType": "TrueID",
                    "ProductStatus": "fail",
                    "ParameterDetails": [
                        { "Group": "AUTHENTICATION_RESULT", "Name": "DocAuthResult", "Values": [{ "Value": "Failed" }] },
                        { "Group": "AUTHENTICATION_RESULT", "Name": "Alert_1_AlertName", "Values": [{ "Value": "Visible Pattern" }] },
                        { "Group": "AUTHENTICATION_RESULT", "Name": "Alert_1_AuthenticationResult", "Values": [{ "Value": "Failed" }] }
                    ]
                }
            ]
        });
        let notifier = RecordingNotifier::new();

        let record = TrueIdDecoder::new(notifier.clone()).decode(&body.to_string(), false);

        let TrueIdRecord::Decoded(record) = record else {
            panic!("expected a decoded record");
        };
        assert_eq!(record.product_status.as_deref(), Some("fail"));
        assert_eq!(record.alert_failure_count, 1);
        assert_eq!(
            ErrorGenerator::new(notifier.clone()).generate(&record, false),
            ClassificationResult::single(Category::Id, MessageKey::IdNotVerified)
        );
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_decode_accepts_null_values() {
        let body = json!({
            "Status": { "TransactionStatus": "passed" },
            "Products": [{
                "ProductType": "TrueID",
                "ProductStatus": "pass",
                "ParameterDetails": [
                    { "Group": "AUTHENTICATION_RESULT", "Name": "DocAuthResult", "Values": [{ "Value": "Passed" }] },
                    { "Group": "AUTHENTICATION_RESULT", "Name": "DocIssueType", "Values": null },
                    { "Group": "IMAGE_METRICS_RESULT", "Name": "Side", "Values": null }
                ]
            }]
        });
        let notifier = RecordingNotifier::new();

        let record = TrueIdDecoder::new(notifier.clone()).decode(&body.to_string(), false);

        let TrueIdRecord::Decoded(record) = record else {
            panic!("expected a decoded record");
        };
        assert_eq!(record.doc_auth_result.as_deref(), Some("Passed"));
        assert_eq!(record.authentication_result["DocIssueType"], Value::Null);
        assert!(record.image_metrics.is_empty());
        assert_eq!(notifier.count(), 0);
    }

    #[test]
    fn test_decode_malformed_true_id_product_is_degraded() {
        let body = json!({
            "Status": { "TransactionStatus": "passed" },
            "Products": [{
                "ProductType": "TrueID",
                "ParameterDetails": [{ "Group": "AUTHENTICATION_RESULT" }]
            }]
        });
        let notifier = RecordingNotifier::new();

        let record = TrueIdDecoder::new(notifier.clone()).decode(&body.to_string(), false);

        let TrueIdRecord::Degraded(degraded) = record else {
            panic!("expected a degraded record");
        };
        assert!(degraded.reason.starts_with("TrueID product section has an unexpected shape"));
        assert_eq!(degraded.transaction_status(), Some("passed"));
        assert_eq!(notifier.count(), 1);
    }

    #[test]
    fn test_decode_invalid_json_is_degraded() {
        let notifier = RecordingNotifier::new();
        let record = TrueIdDecoder::new(notifier.clone()).decode("<html>oops</html>", false);
        let TrueIdRecord::Degraded(degraded) = record else {
            panic!("expected a degraded record");
        };
        assert!(degraded.reason.starts_with("TrueID response is not valid JSON"));
        assert_eq!(notifier.count(), 1);
    }
}
