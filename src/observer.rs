use uuid::Uuid;

use crate::evaluation::EvaluationResult;
use crate::models::FeatureFlag;

/// Observer notified after committed state transitions.
///
/// The core itself never logs; anything that wants visibility into
/// create/update/delete/evaluate plugs in here. All hooks default to no-ops
/// so implementors only override what they care about.
pub trait FlagObserver: Send + Sync {
    fn flag_created(&self, _flag: &FeatureFlag) {}
    fn flag_updated(&self, _flag: &FeatureFlag) {}
    fn flag_deleted(&self, _id: Uuid) {}
    fn flag_evaluated(&self, _flag: &FeatureFlag, _result: &EvaluationResult) {}
}

/// Observer that forwards transitions to `tracing`.
pub struct TracingObserver;

impl FlagObserver for TracingObserver {
    fn flag_created(&self, flag: &FeatureFlag) {
        tracing::info!(id = %flag.id, name = %flag.name, "flag created");
    }

    fn flag_updated(&self, flag: &FeatureFlag) {
        tracing::info!(id = %flag.id, name = %flag.name, "flag updated");
    }

    fn flag_deleted(&self, id: Uuid) {
        tracing::info!(%id, "flag deleted");
    }

    fn flag_evaluated(&self, flag: &FeatureFlag, result: &EvaluationResult) {
        tracing::debug!(
            name = %flag.name,
            enabled = result.enabled,
            fallback = result.fallback_to_default,
            took_us = result.evaluation_time.as_micros() as u64,
            "flag evaluated"
        );
    }
}
