//! Identity fields read off verified documents
//!
//! Both extractors return an empty [`Pii`] unless the vendor verified the
//! document, so PII never leaves this crate for a failed verification.

use std::sync::LazyLock;

use chrono::DateTime;
use regex::Regex;

use crate::model::Pii;
use crate::model::acuant::ResultsBody;
use crate::model::true_id::TrueIdRecord;
use crate::service::acuant;
use crate::service::true_id::{self, value_to_string};

const DRIVERS_LICENSE: &str = "drivers_license";

/// `/Date(<millis since epoch>)/`, the vendor A date encoding
static VENDOR_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/Date\((-?\d+)\)/$").expect("vendor date pattern is valid"));

/// PII from a TrueID response's `IDAUTH_FIELD_DATA` group
pub fn from_true_id(record: &TrueIdRecord) -> Pii {
    if !true_id::successful_result(record) {
        return Pii::default();
    }
    let TrueIdRecord::Decoded(record) = record else {
        return Pii::default();
    };

    let field = |key: &str| record.field_data.get(key).and_then(value_to_string);

    let mut pii = Pii {
        first_name: field("Fields_FirstName"),
        middle_name: field("Fields_MiddleName"),
        last_name: field("Fields_Surname"),
        address1: field("Fields_AddressLine1"),
        city: field("Fields_City"),
        state: field("Fields_State"),
        zipcode: field("Fields_PostalCode"),
        dob_year: field("Fields_DOB_Year"),
        dob_month: field("Fields_DOB_Month"),
        dob_day: field("Fields_DOB_Day"),
        dob: None,
        state_id_number: field("Fields_DocumentNumber"),
        state_id_jurisdiction: field("Fields_IssuingStateCode"),
        state_id_type: Some(DRIVERS_LICENSE.to_string()),
    };

    if let (Some(year), Some(month), Some(day)) = (&pii.dob_year, &pii.dob_month, &pii.dob_day) {
        pii.dob = Some(format!("{}/{}/{}", month, day, year));
    }

    pii
}

/// PII from an AssureID results body's `Fields` list
pub fn from_acuant(body: &ResultsBody) -> Pii {
    if !acuant::successful_result(body) {
        return Pii::default();
    }

    let field = |name: &str| {
        body.fields
            .iter()
            .find(|field| field.name == name)
            .and_then(|field| field.value.as_ref())
            .and_then(value_to_string)
    };

    let dob = field("Birth Date").and_then(|raw| convert_vendor_date(&raw));

    Pii {
        first_name: field("First Name"),
        middle_name: field("Middle Name"),
        last_name: field("Surname"),
        address1: field("Address Line 1"),
        city: field("Address City"),
        state: field("Address State"),
        zipcode: field("Address Postal Code"),
        dob,
        state_id_number: field("Document Number"),
        state_id_jurisdiction: field("Issuing State Code"),
        state_id_type: Some(DRIVERS_LICENSE.to_string()),
        ..Pii::default()
    }
}

/// `/Date(449625600000)/` to `04/01/1984`, in UTC
fn convert_vendor_date(raw: &str) -> Option<String> {
    let Some(captures) = VENDOR_DATE.captures(raw) else {
        tracing::warn!("Unrecognized vendor date format");
        return None;
    };
    let millis: i64 = captures[1].parse().ok()?;
    DateTime::from_timestamp_millis(millis).map(|date| date.format("%m/%d/%Y").to_string())
}
