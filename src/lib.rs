//! Resilient client and response normalizer for identity-document
//! verification vendors.
//!
//! Two vendors are supported: AssureID ([`service::acuant`]) and TrueID
//! ([`service::true_id`]). Both end in the same [`NormalizedOutcome`]:
//! a success flag, categorized errors, log-safe diagnostic attributes and
//! the identity fields read off the document.

pub mod model;
pub mod request;
pub mod service;

pub use model::{
    Category, ClassificationResult, Config, ConfigError, Fault, FaultContext, MessageKey,
    NormalizedOutcome, OutcomeErrors, Pii, RawResponse,
};
pub use request::{HttpTransport, PreparedRequest, RequestExecutor, RetryPolicy, TransportError};
pub use service::{AcuantNormalizer, FaultNotifier, TrueIdNormalizer};
