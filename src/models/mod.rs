use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::evaluation::EvaluationContext;

// MODELS

/// A targeting rule attached to a feature flag.
///
/// Rules are owned by their flag and evaluated in the order the flag stores
/// them. A disabled rule never matches, whatever its variant fields say.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: Uuid,
    #[serde(flatten)]
    pub kind: RuleKind,
    pub enabled: bool,
    pub created_at: DateTime<Utc>,
}

/// The closed set of rule variants. The `type` tag makes an unknown
/// discriminant a hard deserialization failure rather than a silent skip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleKind {
    Tenant { tenant_ids: HashSet<String> },
    User { user_ids: HashSet<String> },
    Percentage { percentage: u8 },
}

impl Rule {
    pub fn tenant(
        id: Uuid,
        tenant_ids: HashSet<String>,
        enabled: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: RuleKind::Tenant { tenant_ids },
            enabled,
            created_at,
        }
    }

    pub fn user(
        id: Uuid,
        user_ids: HashSet<String>,
        enabled: bool,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            kind: RuleKind::User { user_ids },
            enabled,
            created_at,
        }
    }

    /// Percentage rollout rule. Out-of-range input is clamped into [0, 100],
    /// never rejected.
    pub fn percentage(id: Uuid, percentage: i64, enabled: bool, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: RuleKind::Percentage {
                percentage: percentage.clamp(0, 100) as u8,
            },
            enabled,
            created_at,
        }
    }

    /// Whether this rule matches the given context.
    ///
    /// Total over any context content: it returns a plain bool and cannot
    /// fail, so one bad rule can at worst not match.
    pub fn matches(&self, context: &EvaluationContext) -> bool {
        if !self.enabled {
            return false;
        }

        match &self.kind {
            RuleKind::Tenant { tenant_ids } => tenant_ids.contains(&context.tenant_id),
            RuleKind::User { user_ids } => user_ids.contains(&context.user_id),
            RuleKind::Percentage { percentage } => match *percentage {
                0 => false,
                100 => true,
                percentage => rollout_bucket(&context.user_id, &context.tenant_id) < percentage,
            },
        }
    }
}

/// A feature flag: a global default plus an ordered list of targeting rules.
///
/// `id` and `name` are both identity keys; the repository keeps them unique
/// across the whole flag population.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureFlag {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub enabled: bool,
    pub rules: Vec<Rule>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeatureFlag {
    /// Pure constructor: the caller supplies the id and timestamp, so tests
    /// can build flags deterministically. The transport layer is the place
    /// that calls `Uuid::new_v4()` / `Utc::now()`.
    pub fn new(
        id: Uuid,
        name: impl Into<String>,
        description: Option<String>,
        enabled: bool,
        rules: Vec<Rule>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            description,
            enabled,
            rules,
            created_at,
            updated_at: created_at,
        }
    }
}

/// Partial update applied by `FlagRepository::update`. `None` fields are
/// left untouched.
#[derive(Debug, Clone, Default)]
pub struct FlagUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub enabled: Option<bool>,
    pub rules: Option<Vec<Rule>>,
}

/// Derived counts over the live flag population.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlagStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub rules: usize,
}

// HELPER FUNCTIONS

/// Deterministic bucket in [0, 100) for a (user, tenant) pair.
///
/// Polynomial rolling hash over `"{user_id}:{tenant_id}"` with wrapping
/// 32-bit signed arithmetic. The same pair always lands in the same bucket,
/// so a user's verdict for a given percentage never flickers between
/// requests, and raising the percentage only ever adds users.
fn rollout_bucket(user_id: &str, tenant_id: &str) -> u8 {
    let key = format!("{}:{}", user_id, tenant_id);

    let mut hash: i32 = 0;
    for c in key.chars() {
        hash = hash.wrapping_mul(31).wrapping_add(c as i32);
    }

    (hash.unsigned_abs() % 100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn context(user_id: &str, tenant_id: &str) -> EvaluationContext {
        EvaluationContext {
            user_id: user_id.to_string(),
            tenant_id: tenant_id.to_string(),
            additional_data: Default::default(),
        }
    }

    fn set(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_percentage_clamps_out_of_range_input() {
        let too_high = Rule::percentage(Uuid::new_v4(), 250, true, ts());
        assert_eq!(
            too_high.kind,
            RuleKind::Percentage { percentage: 100 }
        );

        let negative = Rule::percentage(Uuid::new_v4(), -40, true, ts());
        assert_eq!(negative.kind, RuleKind::Percentage { percentage: 0 });

        let in_range = Rule::percentage(Uuid::new_v4(), 42, true, ts());
        assert_eq!(in_range.kind, RuleKind::Percentage { percentage: 42 });
    }

    #[test]
    fn test_disabled_rule_never_matches() {
        let ctx = context("u1", "t1");

        let tenant = Rule::tenant(Uuid::new_v4(), set(&["t1"]), false, ts());
        assert!(!tenant.matches(&ctx));

        let user = Rule::user(Uuid::new_v4(), set(&["u1"]), false, ts());
        assert!(!user.matches(&ctx));

        // Even a 100% rollout is off while the rule is disabled
        let rollout = Rule::percentage(Uuid::new_v4(), 100, false, ts());
        assert!(!rollout.matches(&ctx));
    }

    #[test]
    fn test_tenant_rule_membership() {
        let rule = Rule::tenant(Uuid::new_v4(), set(&["t1", "t2"]), true, ts());

        assert!(rule.matches(&context("anyone", "t1")));
        assert!(rule.matches(&context("anyone", "t2")));
        assert!(!rule.matches(&context("anyone", "t3")));
    }

    #[test]
    fn test_user_rule_membership() {
        let rule = Rule::user(Uuid::new_v4(), set(&["u1"]), true, ts());

        assert!(rule.matches(&context("u1", "any-tenant")));
        assert!(!rule.matches(&context("u2", "any-tenant")));
    }

    #[test]
    fn test_percentage_zero_and_hundred() {
        let never = Rule::percentage(Uuid::new_v4(), 0, true, ts());
        let always = Rule::percentage(Uuid::new_v4(), 100, true, ts());

        for i in 0..50 {
            let ctx = context(&format!("user-{}", i), &format!("tenant-{}", i));
            assert!(!never.matches(&ctx));
            assert!(always.matches(&ctx));
        }
    }

    #[test]
    fn test_percentage_is_deterministic() {
        for p in [1, 25, 50, 75, 99] {
            let rule = Rule::percentage(Uuid::new_v4(), p, true, ts());
            for i in 0..20 {
                let ctx = context(&format!("user-{}", i), "t1");
                let first = rule.matches(&ctx);
                for _ in 0..5 {
                    assert_eq!(rule.matches(&ctx), first);
                }
            }
        }
    }

    #[test]
    fn test_percentage_is_monotonic_in_percentage() {
        // Once a (user, tenant) pair is in at p%, it stays in for every
        // higher percentage.
        for i in 0..50 {
            let ctx = context(&format!("user-{}", i), "tenant-a");
            let mut seen_match = false;
            for p in 0..=100 {
                let rule = Rule::percentage(Uuid::new_v4(), p, true, ts());
                let matched = rule.matches(&ctx);
                if seen_match {
                    assert!(matched, "user-{} dropped out between percentages", i);
                }
                seen_match = seen_match || matched;
            }
            // p = 100 always matches, so every pair ends up included
            assert!(seen_match);
        }
    }

    #[test]
    fn test_rollout_bucket_spread() {
        // Buckets should spread over the whole range, not pile up in a corner
        let mut included = 0;
        for i in 0..1000 {
            if rollout_bucket(&format!("user-{}", i), "t1") < 50 {
                included += 1;
            }
        }
        assert!((350..=650).contains(&included), "got {}", included);
    }

    #[test]
    fn test_flag_serialization_round_trip_preserves_rule_order() {
        let rules = vec![
            Rule::user(Uuid::new_v4(), set(&["u1"]), true, ts()),
            Rule::tenant(Uuid::new_v4(), set(&["t1"]), false, ts()),
            Rule::percentage(Uuid::new_v4(), 30, true, ts()),
        ];
        let flag = FeatureFlag::new(
            Uuid::new_v4(),
            "checkout-v2",
            Some("new checkout flow".to_string()),
            false,
            rules,
            ts(),
        );

        let json = serde_json::to_string(&flag).unwrap();
        let back: FeatureFlag = serde_json::from_str(&json).unwrap();

        assert_eq!(back, flag);
        assert_eq!(back.rules[0].kind, flag.rules[0].kind);
        assert_eq!(back.rules[2].kind, flag.rules[2].kind);
    }

    #[test]
    fn test_rule_serializes_with_type_tag() {
        let rule = Rule::percentage(Uuid::new_v4(), 25, true, ts());
        let value = serde_json::to_value(&rule).unwrap();

        assert_eq!(value["type"], "percentage");
        assert_eq!(value["percentage"], 25);
        assert_eq!(value["enabled"], true);
    }

    #[test]
    fn test_unknown_rule_type_is_a_hard_failure() {
        let raw = serde_json::json!({
            "id": Uuid::new_v4(),
            "type": "geo_region",
            "regions": ["eu-west"],
            "enabled": true,
            "created_at": ts(),
        });

        assert!(serde_json::from_value::<Rule>(raw).is_err());
    }
}
