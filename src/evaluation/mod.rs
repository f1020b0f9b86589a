use serde::Deserialize;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::models::{FeatureFlag, Rule};

// Request-time identity a flag is evaluated against
#[derive(Debug, Deserialize, Clone)]
pub struct EvaluationContext {
    pub user_id: String,
    pub tenant_id: String,
    /// Opaque bag reserved for future rule types; the engine never reads it.
    #[serde(default)]
    pub additional_data: HashMap<String, serde_json::Value>,
}

// Decision for one flag
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub enabled: bool,
    pub matched_rule: Option<Rule>,
    pub fallback_to_default: bool,
    /// Wall-clock duration of the evaluate call. Diagnostic only, it never
    /// influences the decision.
    pub evaluation_time: Duration,
}

/// Evaluate one flag against one context.
///
/// Scans the flag's rules in stored order; the first rule that matches wins
/// and the decision is `enabled = true`. If no rule matches the decision
/// falls back to the flag's global default.
///
/// Never fatal: a context missing its identity fields degrades to the
/// global default instead of failing, so the caller always gets a decision.
/// Rule matching itself is total, so one bad rule cannot block the scan.
pub fn evaluate(flag: &FeatureFlag, context: &EvaluationContext) -> EvaluationResult {
    let started = Instant::now();

    // Degraded path: no identity to match against
    if context.user_id.is_empty() || context.tenant_id.is_empty() {
        return EvaluationResult {
            enabled: flag.enabled,
            matched_rule: None,
            fallback_to_default: true,
            evaluation_time: started.elapsed(),
        };
    }

    for rule in &flag.rules {
        if rule.matches(context) {
            return EvaluationResult {
                enabled: true,
                matched_rule: Some(rule.clone()),
                fallback_to_default: false,
                evaluation_time: started.elapsed(),
            };
        }
    }

    EvaluationResult {
        enabled: flag.enabled,
        matched_rule: None,
        fallback_to_default: true,
        evaluation_time: started.elapsed(),
    }
}

/// Evaluate a batch of flags against one context, independently, preserving
/// input order and length.
pub fn evaluate_batch(flags: &[FeatureFlag], context: &EvaluationContext) -> Vec<EvaluationResult> {
    flags.iter().map(|flag| evaluate(flag, context)).collect()
}
