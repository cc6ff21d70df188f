//! Red Zone rule definitions

use crate::condition::{ResolutionCondition, RuleConditions};
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Alert severity assigned by a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    HighRisk,
    AttentionNeeded,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::HighRisk => "high_risk",
            Severity::AttentionNeeded => "attention_needed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "critical" => Ok(Severity::Critical),
            "high_risk" => Ok(Severity::HighRisk),
            "attention_needed" => Ok(Severity::AttentionNeeded),
            other => Err(CoreError::UnknownSeverity(other.to_string())),
        }
    }
}

/// A persisted Red Zone rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedZoneRule {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Trigger expression (grouped tree or legacy flat array)
    pub conditions: RuleConditions,
    pub severity: Severity,
    #[serde(default)]
    pub auto_resolve: bool,
    /// AND-combined; only consulted when `auto_resolve` is set
    #[serde(default)]
    pub resolution_conditions: Vec<ResolutionCondition>,
    pub enabled: bool,
    #[serde(default)]
    pub team_lead_approval_required: bool,
    /// Shown on alert creation; may contain `{field_path}` placeholders
    #[serde(default)]
    pub notification_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RedZoneRule {
    /// Whether this rule can ever auto-resolve an alert.
    ///
    /// Zero resolution conditions never auto-resolve: an empty AND is not
    /// treated as "always true" here.
    pub fn auto_resolution_enabled(&self) -> bool {
        self.auto_resolve && !self.resolution_conditions.is_empty()
    }

    /// Every field path this rule reads, trigger and resolution alike
    pub fn referenced_fields(&self) -> Vec<String> {
        let tree = self.conditions.to_tree();
        let mut fields: Vec<String> = tree.all_conditions().map(|c| c.field.clone()).collect();
        fields.extend(self.resolution_conditions.iter().map(|c| c.field_path.clone()));
        fields.sort();
        fields.dedup();
        fields
    }
}

/// Rule contents as submitted by the admin form (create and update)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub conditions: RuleConditions,
    pub severity: Severity,
    #[serde(default)]
    pub auto_resolve: bool,
    #[serde(default)]
    pub resolution_conditions: Vec<ResolutionCondition>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub team_lead_approval_required: bool,
    #[serde(default)]
    pub notification_message: Option<String>,
}

fn default_enabled() -> bool {
    true
}

impl RuleDraft {
    /// Minimal draft with a trigger tree; other settings take their defaults
    pub fn new(name: impl Into<String>, conditions: impl Into<RuleConditions>, severity: Severity) -> Self {
        Self {
            name: name.into(),
            description: None,
            conditions: conditions.into(),
            severity,
            auto_resolve: false,
            resolution_conditions: Vec::new(),
            enabled: true,
            team_lead_approval_required: false,
            notification_message: None,
        }
    }

    /// Enable auto-resolution with the given criteria
    pub fn with_auto_resolve(mut self, resolution_conditions: Vec<ResolutionCondition>) -> Self {
        self.auto_resolve = true;
        self.resolution_conditions = resolution_conditions;
        self
    }

    pub fn with_team_lead_approval(mut self, required: bool) -> Self {
        self.team_lead_approval_required = required;
        self
    }

    pub fn with_notification_message(mut self, message: impl Into<String>) -> Self {
        self.notification_message = Some(message.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Store-ready copy: legacy flat arrays are rewritten into the grouped form
    pub fn normalized(mut self) -> Self {
        if self.conditions.is_legacy() {
            self.conditions = RuleConditions::Grouped(self.conditions.into_tree());
        }
        self.name = self.name.trim().to_string();
        self
    }

    /// Materialize into a rule with the given id and timestamps
    pub fn into_rule(self, id: i64, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> RedZoneRule {
        RedZoneRule {
            id,
            name: self.name,
            description: self.description,
            conditions: self.conditions,
            severity: self.severity,
            auto_resolve: self.auto_resolve,
            resolution_conditions: self.resolution_conditions,
            enabled: self.enabled,
            team_lead_approval_required: self.team_lead_approval_required,
            notification_message: self.notification_message,
            created_at,
            updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionOperator, ConditionTree};

    #[test]
    fn test_severity_round_trip() {
        for severity in [Severity::Critical, Severity::HighRisk, Severity::AttentionNeeded] {
            assert_eq!(severity.as_str().parse::<Severity>().unwrap(), severity);
        }
        assert!("low".parse::<Severity>().is_err());
        assert_eq!(
            serde_json::to_value(Severity::HighRisk).unwrap(),
            serde_json::json!("high_risk")
        );
    }

    #[test]
    fn test_auto_resolution_requires_conditions() {
        let now = Utc::now();
        let draft = RuleDraft::new(
            "Low NPS",
            ConditionTree::single(vec![Condition::new("nps_score", ConditionOperator::LessThan, "6")]),
            Severity::HighRisk,
        );

        let mut rule = draft.clone().into_rule(1, now, now);
        rule.auto_resolve = true;
        assert!(!rule.auto_resolution_enabled());

        let rule = draft
            .with_auto_resolve(vec![ResolutionCondition::new(
                "nps_score",
                ConditionOperator::GreaterThan,
                "6",
            )])
            .into_rule(1, now, now);
        assert!(rule.auto_resolution_enabled());
        assert_eq!(rule.referenced_fields(), vec!["nps_score".to_string()]);
    }

    #[test]
    fn test_draft_normalizes_legacy_conditions() {
        let draft = RuleDraft::new(
            "  Churn risk ",
            vec![Condition::new("status", ConditionOperator::Equals, "churning")],
            Severity::Critical,
        );
        assert!(draft.conditions.is_legacy());

        let normalized = draft.normalized();
        assert!(!normalized.conditions.is_legacy());
        assert_eq!(normalized.name, "Churn risk");
    }

    #[test]
    fn test_draft_defaults_enabled() {
        let draft: RuleDraft = serde_json::from_value(serde_json::json!({
            "name": "Low NPS",
            "severity": "high_risk",
            "conditions": [{ "field": "nps_score", "operator": "less_than", "value": "6" }]
        }))
        .unwrap();

        assert!(draft.enabled);
        assert!(!draft.auto_resolve);
        assert!(draft.resolution_conditions.is_empty());
    }
}
