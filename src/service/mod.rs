pub mod acuant;
pub mod catalog;
pub mod error_generator;
pub mod notifier;
pub mod pii;
pub mod true_id;

pub use acuant::AcuantNormalizer;
pub use catalog::MessageCatalog;
pub use error_generator::ErrorGenerator;
pub use notifier::{FaultNotifier, RecordingNotifier, TracingNotifier, tracing_notifier};
pub use true_id::{TrueIdDecoder, TrueIdNormalizer};
