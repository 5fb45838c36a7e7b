//! TrueID (vendor B) wire model and decoded record

use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::fault::Fault;

pub const TRUE_ID_PRODUCT: &str = "TrueID";

pub const GROUP_AUTHENTICATION_RESULT: &str = "AUTHENTICATION_RESULT";
pub const GROUP_FIELD_DATA: &str = "IDAUTH_FIELD_DATA";
pub const GROUP_PORTRAIT_MATCH: &str = "PORTRAIT_MATCH_RESULT";
pub const GROUP_IMAGE_METRICS: &str = "IMAGE_METRICS_RESULT";

/// Outcome string the vendor uses for a passing alert or doc-auth result
pub const PASSED: &str = "Passed";

/// Top-level response body
///
/// Kept loose: products other than TrueID may carry any shape, so only the
/// TrueID entry is parsed into [`Product`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrueIdBody {
    #[serde(rename = "Status", default)]
    pub status: Option<Value>,
    #[serde(rename = "Information", default)]
    pub information: Option<Value>,
    #[serde(rename = "Products", default)]
    pub products: Option<Value>,
}

impl TrueIdBody {
    /// The raw `Products` entry whose `ProductType` is `product_type`
    pub fn product(&self, product_type: &str) -> Option<&Value> {
        self.products.as_ref()?.as_array()?.iter().find(|product| {
            product.get("ProductType").and_then(Value::as_str) == Some(product_type)
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Product {
    #[serde(rename = "ProductType")]
    pub product_type: String,
    #[serde(rename = "ProductStatus", default)]
    pub product_status: Option<String>,
    #[serde(rename = "ParameterDetails", default)]
    pub parameter_details: Option<Vec<ParameterDetail>>,
}

/// One `{Group, Name, Values:[{Value}]}` entry
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterDetail {
    #[serde(rename = "Group")]
    pub group: String,
    #[serde(rename = "Name")]
    pub name: String,
    /// `null` when the vendor has no value for the parameter
    #[serde(rename = "Values", default)]
    pub values: Option<Vec<DetailValue>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetailValue {
    #[serde(rename = "Value", default)]
    pub value: Value,
}

/// One vendor check, reassembled from `Alert_<n>_*` keys
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertRecord {
    pub ordinal: u32,
    pub name: String,
    /// `None` when the vendor sent no `AuthenticationResult` for the alert
    pub result: Option<String>,
    pub region: Option<String>,
}

impl AlertRecord {
    pub fn passed(&self) -> bool {
        self.result.as_deref() == Some(PASSED)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Alerts {
    pub passed: Vec<AlertRecord>,
    pub failed: Vec<AlertRecord>,
}

impl Alerts {
    pub fn iter(&self) -> impl Iterator<Item = &AlertRecord> {
        self.failed.iter().chain(self.passed.iter())
    }
}

/// Per-side image metrics, in the order the vendor listed the sides
///
/// Serializes as a map from side name (e.g. `Front`) to metric name to value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageMetrics(Vec<(String, BTreeMap<String, Value>)>);

impl ImageMetrics {
    /// Insert or replace the metrics of one side
    pub fn insert(&mut self, side: String, metrics: BTreeMap<String, Value>) {
        match self.0.iter_mut().find(|(existing, _)| *existing == side) {
            Some((_, slot)) => *slot = metrics,
            None => self.0.push((side, metrics)),
        }
    }

    pub fn get(&self, side: &str) -> Option<&BTreeMap<String, Value>> {
        self.0
            .iter()
            .find(|(existing, _)| existing == side)
            .map(|(_, metrics)| metrics)
    }

    pub fn sides(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(side, _)| side.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for ImageMetrics {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (side, metrics) in &self.0 {
            map.serialize_entry(side, metrics)?;
        }
        map.end()
    }
}

/// A TrueID response with its product section present
///
/// The `Serialize` impl produces the response info used for logging and
/// fault context; it leaves out the document field data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DecodedRecord {
    pub conversation_id: Option<String>,
    pub reference: Option<String>,
    pub liveness_checking: bool,
    pub product_type: &'static str,
    #[serde(skip)]
    pub transaction_status: Option<String>,
    pub transaction_reason_code: Option<String>,
    #[serde(skip)]
    pub product_status: Option<String>,
    pub doc_auth_result: Option<String>,
    pub alerts: Alerts,
    pub alert_failure_count: usize,
    pub portrait_match_results: Map<String, Value>,
    pub image_metrics: ImageMetrics,
    #[serde(skip)]
    pub authentication_result: Map<String, Value>,
    #[serde(skip)]
    pub field_data: Map<String, Value>,
}

impl DecodedRecord {
    pub fn face_match_result(&self) -> Option<&str> {
        self.portrait_match_results
            .get("FaceMatchResult")
            .and_then(Value::as_str)
    }

    pub fn response_info(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// What is left when the vendor answered without a product section
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DegradedRecord {
    pub status: Option<Value>,
    pub information: Option<Value>,
    /// What was missing or malformed
    pub reason: String,
}

impl DegradedRecord {
    pub fn fault(&self) -> Fault {
        Fault::UnexpectedVendorShape(self.reason.clone())
    }

    /// Diagnostic attributes: the vendor's own status and information blocks
    pub fn attributes(&self) -> Map<String, Value> {
        let mut attrs = Map::new();
        attrs.insert(
            "lexis_nexis_status".to_string(),
            self.status.clone().unwrap_or(Value::Null),
        );
        attrs.insert(
            "lexis_nexis_info".to_string(),
            self.information.clone().unwrap_or(Value::Null),
        );
        attrs
    }

    pub fn transaction_status(&self) -> Option<&str> {
        self.status
            .as_ref()
            .and_then(|status| status.get("TransactionStatus"))
            .and_then(Value::as_str)
    }
}

/// A decoded TrueID response
#[derive(Debug, Clone, PartialEq)]
pub enum TrueIdRecord {
    Decoded(DecodedRecord),
    Degraded(DegradedRecord),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alert(ordinal: u32, name: &str, result: Option<&str>) -> AlertRecord {
        AlertRecord {
            ordinal,
            name: name.to_string(),
            result: result.map(str::to_string),
            region: None,
        }
    }

    #[test]
    fn test_alert_without_result_is_not_passed() {
        assert!(alert(1, "Visible Pattern", Some("Passed")).passed());
        assert!(!alert(2, "Visible Pattern", Some("Attention")).passed());
        assert!(!alert(3, "Visible Pattern", None).passed());
    }

    #[test]
    fn test_image_metrics_keep_side_order() {
        let mut metrics = ImageMetrics::default();
        metrics.insert("Front".to_string(), BTreeMap::new());
        metrics.insert("Back".to_string(), BTreeMap::new());

        assert_eq!(metrics.sides().collect::<Vec<_>>(), vec!["Front", "Back"]);
        assert_eq!(
            serde_json::to_string(&metrics).unwrap(),
            r#"{"Front":{},"Back":{}}"#
        );
    }

    #[test]
    fn test_response_info_excludes_field_data() {
        let mut record = DecodedRecord {
            conversation_id: Some("31000406181234".to_string()),
            product_type: TRUE_ID_PRODUCT,
            ..DecodedRecord::default()
        };
        record
            .field_data
            .insert("Fields_FirstName".to_string(), Value::from("JANE"));

        let info = record.response_info();
        assert_eq!(info["ConversationId"], "31000406181234");
        assert_eq!(info["ProductType"], "TrueID");
        assert!(!info.to_string().contains("JANE"));
    }
}
