//! Fault notifier collaborator
//!
//! Components receive an `Arc<dyn FaultNotifier>` at construction and hand
//! it every non-fatal fault they run into. Notifying is fire-and-forget: it
//! must not fail and must not block the verification call.

use std::sync::{Arc, Mutex};

use crate::model::{Fault, FaultContext};

pub trait FaultNotifier: Send + Sync {
    fn notify(&self, fault: &Fault, context: FaultContext);
}

/// Default notifier: writes faults to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl FaultNotifier for TracingNotifier {
    fn notify(&self, fault: &Fault, context: FaultContext) {
        match context {
            FaultContext::None => {
                tracing::warn!(fault = %fault, "Document verification fault");
            }
            FaultContext::Retry { attempt } => {
                tracing::warn!(fault = %fault, attempt, "Retrying document verification request");
            }
            FaultContext::ResponseInfo(info) => {
                tracing::warn!(fault = %fault, response_info = %info, "Document verification fault");
            }
        }
    }
}

/// Notifier that keeps every fault in memory
///
/// Useful for callers that batch faults into their own error reporting, and
/// for asserting on notifications in tests.
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    faults: Mutex<Vec<(Fault, FaultContext)>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Faults recorded so far, oldest first
    pub fn faults(&self) -> Vec<(Fault, FaultContext)> {
        match self.faults.lock() {
            Ok(faults) => faults.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.faults().len()
    }
}

impl FaultNotifier for RecordingNotifier {
    fn notify(&self, fault: &Fault, context: FaultContext) {
        let mut faults = match self.faults.lock() {
            Ok(faults) => faults,
            Err(poisoned) => poisoned.into_inner(),
        };
        faults.push((fault.clone(), context));
    }
}

/// Shorthand for the default notifier behind an `Arc`
pub fn tracing_notifier() -> Arc<dyn FaultNotifier> {
    Arc::new(TracingNotifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_notifier_keeps_order() {
        let notifier = RecordingNotifier::new();
        notifier.notify(&Fault::ClassificationFallback, FaultContext::None);
        notifier.notify(
            &Fault::Http {
                caller: "TrueIdRequest".to_string(),
                status: 500,
            },
            FaultContext::Retry { attempt: 1 },
        );

        let faults = notifier.faults();
        assert_eq!(faults.len(), 2);
        assert_eq!(faults[0].0, Fault::ClassificationFallback);
        assert_eq!(faults[1].1, FaultContext::Retry { attempt: 1 });
    }

    #[test]
    fn test_tracing_notifier_never_panics() {
        let notifier = tracing_notifier();
        notifier.notify(
            &Fault::UnexpectedVendorShape("TrueID response not found".to_string()),
            FaultContext::ResponseInfo(serde_json::json!({ "lexis_nexis_status": null })),
        );
    }
}
