//! Diagnostic faults reported to the fault notifier
//!
//! None of these abort a verification call. They are attached to the
//! normalized outcome and/or handed to the injected notifier.

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Fault {
    /// No response was obtained (connect failure, timeout, broken transfer)
    #[error("{caller} Connection failed: {message}")]
    Network { caller: String, message: String },

    /// A response was obtained but its status was not a success
    #[error("{caller} Unexpected HTTP response {status}")]
    Http { caller: String, status: u16 },

    /// The vendor answered with something other than the expected product section
    #[error("Unexpected vendor response: {0}")]
    UnexpectedVendorShape(String),

    /// Alert names that have no category/message mapping
    #[error("Vendor responded with alert name(s) we do not handle: {0:?}")]
    UnknownCheck(Vec<String>),

    /// The failure could not be attributed to any usable cause
    #[error("Vendor failure escaped without useful errors")]
    ClassificationFallback,
}

impl Fault {
    /// Faults that surface to callers as a generic `network` error
    pub fn is_transport(&self) -> bool {
        matches!(self, Fault::Network { .. } | Fault::Http { .. })
    }
}

impl Serialize for Fault {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Extra context handed to the notifier alongside a fault
#[derive(Debug, Clone, PartialEq)]
pub enum FaultContext {
    None,
    /// A retryable response is about to be retried; `attempt` counts retries from 1
    Retry { attempt: u32 },
    /// Decoded vendor response info (never contains PII)
    ResponseInfo(serde_json::Value),
}
