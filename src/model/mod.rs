pub mod acuant;
pub mod config;
pub mod errors;
pub mod fault;
pub mod outcome;
pub mod true_id;

pub use config::{AcuantConfig, Config, ConfigError, DEFAULT_TIMEOUT, LexisNexisConfig};
pub use errors::{AlertCategoryMessage, Category, ClassificationResult, MessageKey, alert_message};
pub use fault::{Fault, FaultContext};
pub use outcome::{NormalizedOutcome, OutcomeErrors, Pii, RawResponse};
pub use true_id::{AlertRecord, Alerts, DecodedRecord, DegradedRecord, ImageMetrics, TrueIdRecord};
