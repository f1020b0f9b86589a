pub mod routes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::FlagError;
use crate::models::{FeatureFlag, Rule};

// MODELS

#[derive(Debug, Deserialize)]
pub struct CreateFlagRequest {
    pub name: String,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    #[serde(default)]
    pub rules: Vec<RuleRequest>,
}

#[derive(Debug, Deserialize)]
pub struct RuleRequest {
    pub rule_type: String,
    #[serde(default)]
    pub tenant_ids: Vec<String>,
    #[serde(default)]
    pub user_ids: Vec<String>,
    pub percentage: Option<i64>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateFlagRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rules: Option<Vec<RuleRequest>>,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub search: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CountQuery {
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct ExistsResponse {
    pub exists: bool,
}

#[derive(Debug, Serialize)]
pub struct FlagResponse {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<Rule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FeatureFlag> for FlagResponse {
    fn from(flag: FeatureFlag) -> Self {
        Self {
            id: flag.id,
            name: flag.name,
            description: flag.description,
            enabled: flag.enabled,
            rules: flag.rules,
            created_at: flag.created_at,
            updated_at: flag.updated_at,
        }
    }
}

// HELPER FUNCTIONS

// Validating the flag name
pub fn validate_flag_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Flag name cannot be empty".to_string());
    }

    if name.len() > 128 {
        return Err("Flag name is too long (Max: 128 characters)".to_string());
    }

    Ok(())
}

/// Build a stored rule from the wire shape. Unknown rule types are rejected,
/// never silently dropped. This is also where ids and timestamps get minted,
/// so the model constructors stay deterministic.
pub fn build_rule(request: RuleRequest, now: DateTime<Utc>) -> Result<Rule, FlagError> {
    let enabled = request.enabled.unwrap_or(true);

    match request.rule_type.as_str() {
        "tenant" => Ok(Rule::tenant(
            Uuid::new_v4(),
            request.tenant_ids.into_iter().collect(),
            enabled,
            now,
        )),
        "user" => Ok(Rule::user(
            Uuid::new_v4(),
            request.user_ids.into_iter().collect(),
            enabled,
            now,
        )),
        "percentage" => Ok(Rule::percentage(
            Uuid::new_v4(),
            request.percentage.unwrap_or(0),
            enabled,
            now,
        )),
        other => Err(FlagError::InvalidRuleType(other.to_string())),
    }
}

pub fn build_rules(
    requests: Vec<RuleRequest>,
    now: DateTime<Utc>,
) -> Result<Vec<Rule>, FlagError> {
    requests
        .into_iter()
        .map(|request| build_rule(request, now))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RuleKind;

    fn rule_request(rule_type: &str) -> RuleRequest {
        RuleRequest {
            rule_type: rule_type.to_string(),
            tenant_ids: vec!["t1".to_string()],
            user_ids: vec!["u1".to_string()],
            percentage: Some(150),
            enabled: None,
        }
    }

    #[test]
    fn test_validate_flag_name() {
        assert!(validate_flag_name("checkout-v2").is_ok());
        assert!(validate_flag_name("").is_err());
        assert!(validate_flag_name("   ").is_err());
        assert!(validate_flag_name(&"x".repeat(129)).is_err());
    }

    #[test]
    fn test_build_rule_known_types() {
        let now = Utc::now();

        let tenant = build_rule(rule_request("tenant"), now).unwrap();
        assert!(matches!(tenant.kind, RuleKind::Tenant { .. }));
        assert!(tenant.enabled);

        let user = build_rule(rule_request("user"), now).unwrap();
        assert!(matches!(user.kind, RuleKind::User { .. }));

        // Percentage comes in out of range and gets clamped, not rejected
        let rollout = build_rule(rule_request("percentage"), now).unwrap();
        assert_eq!(rollout.kind, RuleKind::Percentage { percentage: 100 });
    }

    #[test]
    fn test_build_rule_rejects_unknown_type() {
        let err = build_rule(rule_request("email_domain"), Utc::now()).unwrap_err();
        assert!(matches!(err, FlagError::InvalidRuleType(t) if t == "email_domain"));
    }

    #[test]
    fn test_build_rules_fails_on_first_bad_rule() {
        let now = Utc::now();
        let requests = vec![rule_request("tenant"), rule_request("nope")];
        assert!(build_rules(requests, now).is_err());
    }
}
