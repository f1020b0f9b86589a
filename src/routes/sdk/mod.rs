pub mod routes;

use serde::{Deserialize, Serialize};

// Re-export the context type the SDK payload carries
pub use crate::evaluation::EvaluationContext;

use crate::evaluation::EvaluationResult;
use crate::models::{FeatureFlag, Rule};

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub context: EvaluationContext,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub flags: Vec<FlagState>,
}

#[derive(Debug, Serialize)]
pub struct FlagState {
    pub name: String,
    pub enabled: bool,
    pub fallback_to_default: bool,
    pub matched_rule: Option<Rule>,
    pub evaluation_time_us: u64,
}

impl FlagState {
    pub fn new(flag: &FeatureFlag, result: EvaluationResult) -> Self {
        Self {
            name: flag.name.clone(),
            enabled: result.enabled,
            fallback_to_default: result.fallback_to_default,
            matched_rule: result.matched_rule,
            evaluation_time_us: result.evaluation_time.as_micros() as u64,
        }
    }
}
