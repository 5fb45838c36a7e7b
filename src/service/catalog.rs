//! Message catalog collaborator
//!
//! Turns canonical message keys into display strings. The catalog itself
//! (locale handling, translations) belongs to the host application.

use std::collections::{BTreeMap, HashMap};

use crate::model::{Category, ClassificationResult};

pub trait MessageCatalog {
    /// Display text for a fully qualified key such as
    /// `doc_auth.errors.lexis_nexis.barcode_read_check`
    fn resolve(&self, key: &str) -> Option<String>;
}

impl MessageCatalog for HashMap<String, String> {
    fn resolve(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl ClassificationResult {
    /// Resolve every message key through the catalog
    ///
    /// Keys the catalog does not know are kept as their canonical key rather
    /// than dropped, and logged.
    pub fn localize(&self, catalog: &dyn MessageCatalog) -> BTreeMap<Category, Vec<String>> {
        self.iter()
            .map(|(category, keys)| {
                let messages = keys
                    .iter()
                    .map(|key| {
                        let catalog_key = key.catalog_key();
                        catalog.resolve(&catalog_key).unwrap_or_else(|| {
                            tracing::warn!(key = %catalog_key, "Missing message catalog entry");
                            key.as_str().to_string()
                        })
                    })
                    .collect();
                (*category, messages)
            })
            .collect()
    }
}
