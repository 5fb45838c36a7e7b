//! AssureID (vendor A) wire model and result codes

use serde::{Deserialize, Serialize};

/// A vendor-defined result code and whether the vendor bills for it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResultCode {
    pub code: i64,
    pub name: &'static str,
    pub billed: bool,
}

impl ResultCode {
    pub const UNKNOWN: ResultCode = ResultCode { code: 0, name: "Unknown", billed: false };
    pub const PASSED: ResultCode = ResultCode { code: 1, name: "Passed", billed: true };
    pub const FAILED: ResultCode = ResultCode { code: 2, name: "Failed", billed: true };
    pub const SKIPPED: ResultCode = ResultCode { code: 3, name: "Skipped", billed: false };
    pub const CAUTION: ResultCode = ResultCode { code: 4, name: "Caution", billed: true };
    pub const ATTENTION: ResultCode = ResultCode { code: 5, name: "Attention", billed: true };

    const ALL: [ResultCode; 6] = [
        Self::UNKNOWN,
        Self::PASSED,
        Self::FAILED,
        Self::SKIPPED,
        Self::CAUTION,
        Self::ATTENTION,
    ];

    /// Look up a code; `None` means the vendor sent a code we have no mapping for
    pub fn from_int(code: i64) -> Option<ResultCode> {
        Self::ALL.into_iter().find(|known| known.code == code)
    }
}

/// One alert in a results response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAlert {
    #[serde(rename = "Result", default, skip_serializing_if = "Option::is_none")]
    pub result: Option<i64>,
    #[serde(rename = "Disposition", default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
    /// Everything else the vendor sent for this alert, kept for logging
    #[serde(flatten)]
    pub other: serde_json::Map<String, serde_json::Value>,
}

impl RawAlert {
    pub fn result_code(&self) -> Option<ResultCode> {
        self.result.and_then(ResultCode::from_int)
    }
}

/// A named data field read off the document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawField {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

/// Body of a "get results" response
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ResultsBody {
    #[serde(rename = "Result", default)]
    pub result: Option<i64>,
    #[serde(rename = "Alerts", default)]
    pub alerts: Vec<RawAlert>,
    #[serde(rename = "Fields", default)]
    pub fields: Vec<RawField>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_int_known_code() {
        let code = ResultCode::from_int(1).unwrap();
        assert_eq!(code, ResultCode::PASSED);
        assert!(code.billed);
        assert!(!ResultCode::from_int(0).unwrap().billed);
    }

    #[test]
    fn test_from_int_unmapped_codes() {
        for code in [-1, 6, 42, 999, i64::MAX, i64::MIN] {
            assert_eq!(ResultCode::from_int(code), None, "code {code}");
        }
    }

    #[test]
    fn test_results_body_tolerates_missing_sections() {
        let body: ResultsBody = serde_json::from_str(r#"{"Result": 2}"#).unwrap();
        assert_eq!(body.result, Some(2));
        assert!(body.alerts.is_empty());
        assert!(body.fields.is_empty());
    }
}
