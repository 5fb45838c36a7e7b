//! Canonical error categories and message keys
//!
//! Vendor alert names are never shown to users. Each known alert maps to a
//! category (which image or step is at fault) and a canonical message key
//! that the host application resolves to display text.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Serialize, Serializer};

/// Namespace under which message keys are looked up in the message catalog
pub const MESSAGE_NAMESPACE: &str = "doc_auth.errors.lexis_nexis";

/// Bucket used to group failures for messaging
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Id,
    Front,
    Back,
    Selfie,
    General,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Id => "id",
            Category::Front => "front",
            Category::Back => "back",
            Category::Selfie => "selfie",
            Category::General => "general",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical, user-facing message keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MessageKey {
    BarcodeContentCheck,
    BarcodeReadCheck,
    BirthDateChecks,
    ControlNumberCheck,
    DocCrosscheck,
    DocNumberChecks,
    ExpirationChecks,
    FullNameCheck,
    GeneralErrorLiveness,
    GeneralErrorNoLiveness,
    IdNotRecognized,
    IdNotVerified,
    IssueDateChecks,
    MultipleBackIdFailures,
    MultipleFrontIdFailures,
    RefControlNumberCheck,
    SelfieFailure,
    SexCheck,
    VisibleColorCheck,
    VisiblePhotoCheck,
}

impl MessageKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::BarcodeContentCheck => "barcode_content_check",
            MessageKey::BarcodeReadCheck => "barcode_read_check",
            MessageKey::BirthDateChecks => "birth_date_checks",
            MessageKey::ControlNumberCheck => "control_number_check",
            MessageKey::DocCrosscheck => "doc_crosscheck",
            MessageKey::DocNumberChecks => "doc_number_checks",
            MessageKey::ExpirationChecks => "expiration_checks",
            MessageKey::FullNameCheck => "full_name_check",
            MessageKey::GeneralErrorLiveness => "general_error_liveness",
            MessageKey::GeneralErrorNoLiveness => "general_error_no_liveness",
            MessageKey::IdNotRecognized => "id_not_recognized",
            MessageKey::IdNotVerified => "id_not_verified",
            MessageKey::IssueDateChecks => "issue_date_checks",
            MessageKey::MultipleBackIdFailures => "multiple_back_id_failures",
            MessageKey::MultipleFrontIdFailures => "multiple_front_id_failures",
            MessageKey::RefControlNumberCheck => "ref_control_number_check",
            MessageKey::SelfieFailure => "selfie_failure",
            MessageKey::SexCheck => "sex_check",
            MessageKey::VisibleColorCheck => "visible_color_check",
            MessageKey::VisiblePhotoCheck => "visible_photo_check",
        }
    }

    /// Fully qualified catalog key, e.g. `doc_auth.errors.lexis_nexis.sex_check`
    pub fn catalog_key(&self) -> String {
        format!("{}.{}", MESSAGE_NAMESPACE, self.as_str())
    }

    /// Generic message, worded for whether a selfie was part of the flow
    pub fn general(liveness_enabled: bool) -> Self {
        if liveness_enabled {
            MessageKey::GeneralErrorLiveness
        } else {
            MessageKey::GeneralErrorNoLiveness
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for MessageKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Category and message for one known vendor alert
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlertCategoryMessage {
    pub category: Category,
    pub message: MessageKey,
}

/// Known TrueID alert names. Sorted by name for binary search.
const ALERT_MESSAGES: &[(&str, Category, MessageKey)] = &[
    ("1D Control Number Valid", Category::Back, MessageKey::RefControlNumberCheck),
    ("2D Barcode Content", Category::Back, MessageKey::BarcodeContentCheck),
    ("2D Barcode Read", Category::Back, MessageKey::BarcodeReadCheck),
    ("Birth Date Crosscheck", Category::Id, MessageKey::BirthDateChecks),
    ("Birth Date Valid", Category::Id, MessageKey::BirthDateChecks),
    ("Control Number Crosscheck", Category::Back, MessageKey::ControlNumberCheck),
    ("Document Classification", Category::Id, MessageKey::IdNotRecognized),
    ("Document Crosscheck Aggregation", Category::Id, MessageKey::DocCrosscheck),
    ("Document Expired", Category::Id, MessageKey::ExpirationChecks),
    ("Document Number Crosscheck", Category::Id, MessageKey::DocNumberChecks),
    ("Expiration Date Crosscheck", Category::Id, MessageKey::ExpirationChecks),
    ("Expiration Date Valid", Category::Id, MessageKey::ExpirationChecks),
    ("Full Name Crosscheck", Category::Id, MessageKey::FullNameCheck),
    ("Issue Date Crosscheck", Category::Id, MessageKey::IssueDateChecks),
    ("Issue Date Valid", Category::Id, MessageKey::IssueDateChecks),
    ("Layout Valid", Category::Id, MessageKey::IdNotVerified),
    ("Near-Infrared Response", Category::Id, MessageKey::IdNotVerified),
    ("Sex Crosscheck", Category::Id, MessageKey::SexCheck),
    ("Visible Color Response", Category::Id, MessageKey::VisibleColorCheck),
    ("Visible Pattern", Category::Id, MessageKey::IdNotVerified),
    ("Visible Photo Characteristics", Category::Front, MessageKey::VisiblePhotoCheck),
];

/// Look up the category and message for a vendor alert name
pub fn alert_message(name: &str) -> Option<AlertCategoryMessage> {
    ALERT_MESSAGES
        .binary_search_by(|entry| entry.0.cmp(name))
        .ok()
        .map(|idx| {
            let (_, category, message) = ALERT_MESSAGES[idx];
            AlertCategoryMessage { category, message }
        })
}

/// Final engine output: category to ordered, deduplicated message keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ClassificationResult(BTreeMap<Category, Vec<MessageKey>>);

impl ClassificationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Result holding a single message in a single category
    pub fn single(category: Category, message: MessageKey) -> Self {
        let mut result = Self::new();
        result.add(category, message);
        result
    }

    /// Add a message to a category, ignoring duplicates
    pub fn add(&mut self, category: Category, message: MessageKey) {
        let bucket = self.0.entry(category).or_default();
        if !bucket.contains(&message) {
            bucket.push(message);
        }
    }

    /// Replace everything in a category with one message
    pub fn replace(&mut self, category: Category, message: MessageKey) {
        self.0.insert(category, vec![message]);
    }

    pub fn get(&self, category: Category) -> Option<&[MessageKey]> {
        self.0.get(&category).map(Vec::as_slice)
    }

    pub fn contains_category(&self, category: Category) -> bool {
        self.0.get(&category).is_some_and(|bucket| !bucket.is_empty())
    }

    /// Categories holding at least one message, in category order
    pub fn categories(&self) -> Vec<Category> {
        self.0
            .iter()
            .filter(|(_, bucket)| !bucket.is_empty())
            .map(|(category, _)| *category)
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Category, &Vec<MessageKey>)> {
        self.0.iter()
    }
}
