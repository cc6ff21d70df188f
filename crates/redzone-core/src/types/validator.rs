//! Write-time rule validation
//!
//! Runs before a rule draft is persisted. Every problem is collected rather
//! than stopping at the first, so the admin form can show all field messages
//! at once.

use super::schema::FieldCatalog;
use super::value::parse_number;
use crate::condition::ConditionOperator;
use crate::model::RuleDraft;
use serde::Serialize;
use serde_json::Value as Json;
use thiserror::Error;

/// A single rule-form validation failure.
///
/// `path` addresses the offending form field, e.g. `conditions.groups[1].conditions[0].field`.
#[derive(Error, Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationError {
    #[error("{path}: rule name must not be empty")]
    EmptyName { path: String },

    #[error("{path}: at least one condition group is required")]
    EmptyTree { path: String },

    #[error("{path}: condition group must contain at least one condition")]
    EmptyGroup { path: String },

    #[error("{path}: field must not be empty")]
    EmptyField { path: String },

    #[error("{path}: unknown field '{field}'")]
    UnknownField { path: String, field: String },

    #[error("{path}: unknown operator '{operator}'")]
    UnknownOperator { path: String, operator: String },

    #[error("{path}: operator '{operator}' requires a numeric value, got '{value}'")]
    NonNumericValue {
        path: String,
        operator: String,
        value: String,
    },

    #[error("{path}: auto-resolve requires at least one resolution condition")]
    MissingResolutionConditions { path: String },
}

impl ValidationError {
    pub fn path(&self) -> &str {
        match self {
            ValidationError::EmptyName { path }
            | ValidationError::EmptyTree { path }
            | ValidationError::EmptyGroup { path }
            | ValidationError::EmptyField { path }
            | ValidationError::UnknownField { path, .. }
            | ValidationError::UnknownOperator { path, .. }
            | ValidationError::NonNumericValue { path, .. }
            | ValidationError::MissingResolutionConditions { path } => path,
        }
    }
}

/// Validates rule drafts against the available-fields catalog
#[derive(Debug, Clone)]
pub struct RuleValidator {
    catalog: FieldCatalog,
}

impl RuleValidator {
    pub fn new(catalog: FieldCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    /// Validate a draft; legacy flat arrays are checked as their grouped equivalent
    pub fn validate(&self, draft: &RuleDraft) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        if draft.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName {
                path: "name".to_string(),
            });
        }

        let tree = draft.conditions.to_tree();
        if tree.groups.is_empty() {
            errors.push(ValidationError::EmptyTree {
                path: "conditions.groups".to_string(),
            });
        }

        for (gi, group) in tree.groups.iter().enumerate() {
            if group.conditions.is_empty() {
                errors.push(ValidationError::EmptyGroup {
                    path: format!("conditions.groups[{}].conditions", gi),
                });
            }
            for (ci, condition) in group.conditions.iter().enumerate() {
                let base = format!("conditions.groups[{}].conditions[{}]", gi, ci);
                self.check_field(&condition.field, &base, "field", &mut errors);
                check_literal(condition.operator, condition.value.as_str(), &base, &mut errors);
            }
        }

        if draft.auto_resolve && draft.resolution_conditions.is_empty() {
            errors.push(ValidationError::MissingResolutionConditions {
                path: "resolution_conditions".to_string(),
            });
        }

        for (i, condition) in draft.resolution_conditions.iter().enumerate() {
            let base = format!("resolution_conditions[{}]", i);
            self.check_field(&condition.field_path, &base, "field_path", &mut errors);
            check_literal(condition.operator, condition.value.as_str(), &base, &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            log::debug!("rule draft '{}' failed validation: {} error(s)", draft.name, errors.len());
            Err(errors)
        }
    }

    /// Check operator names in an undecoded draft body.
    ///
    /// Runs before the body is decoded into a [`RuleDraft`], which rejects
    /// unknown operators outright; this reports each one against its form
    /// field instead. Legacy flat arrays use their grouped paths.
    pub fn check_operators(body: &Json) -> Result<(), Vec<ValidationError>> {
        let mut errors = Vec::new();

        match body.get("conditions") {
            Some(Json::Array(conditions)) => {
                check_operator_list(conditions, "conditions.groups[0].conditions", &mut errors);
            }
            Some(tree) => {
                let groups = tree.get("groups").and_then(Json::as_array);
                for (gi, group) in groups.into_iter().flatten().enumerate() {
                    if let Some(conditions) = group.get("conditions").and_then(Json::as_array) {
                        let base = format!("conditions.groups[{}].conditions", gi);
                        check_operator_list(conditions, &base, &mut errors);
                    }
                }
            }
            None => {}
        }

        if let Some(conditions) = body.get("resolution_conditions").and_then(Json::as_array) {
            check_operator_list(conditions, "resolution_conditions", &mut errors);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    fn check_field(&self, field: &str, base: &str, key: &str, errors: &mut Vec<ValidationError>) {
        let path = format!("{}.{}", base, key);
        if field.trim().is_empty() {
            errors.push(ValidationError::EmptyField { path });
        } else if !self.catalog.allows(field) {
            errors.push(ValidationError::UnknownField {
                path,
                field: field.to_string(),
            });
        }
    }
}

/// Non-string operators are left for the decoder to reject
fn check_operator_list(conditions: &[Json], base: &str, errors: &mut Vec<ValidationError>) {
    for (i, condition) in conditions.iter().enumerate() {
        if let Some(operator) = condition.get("operator").and_then(Json::as_str) {
            if operator.parse::<ConditionOperator>().is_err() {
                errors.push(ValidationError::UnknownOperator {
                    path: format!("{}[{}].operator", base, i),
                    operator: operator.to_string(),
                });
            }
        }
    }
}

fn check_literal(operator: ConditionOperator, value: &str, base: &str, errors: &mut Vec<ValidationError>) {
    if operator.is_numeric() && parse_number(value).is_none() {
        errors.push(ValidationError::NonNumericValue {
            path: format!("{}.value", base),
            operator: operator.to_string(),
            value: value.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::condition::{Condition, ConditionGroup, ConditionTree, LogicOperator, ResolutionCondition};
    use crate::model::Severity;
    use crate::types::FieldType;

    fn validator() -> RuleValidator {
        RuleValidator::new(
            FieldCatalog::new()
                .with_field("nps_score", "NPS", FieldType::Number)
                .with_field("status", "Status", FieldType::String)
                .with_field("campaign_stats", "Campaign Stats", FieldType::Json),
        )
    }

    fn low_nps() -> RuleDraft {
        RuleDraft::new(
            "Low NPS",
            ConditionTree::single(vec![Condition::new("nps_score", ConditionOperator::LessThan, "6")]),
            Severity::HighRisk,
        )
    }

    #[test]
    fn test_valid_draft() {
        assert!(validator().validate(&low_nps()).is_ok());
    }

    #[test]
    fn test_empty_tree_and_group() {
        let mut draft = low_nps();
        draft.conditions = ConditionTree::new(LogicOperator::And, vec![]).into();
        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ValidationError::EmptyTree { .. }));

        draft.conditions = ConditionTree::new(LogicOperator::Or, vec![ConditionGroup::all(vec![])]).into();
        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(errors[0].path(), "conditions.groups[0].conditions");
    }

    #[test]
    fn test_unknown_field_and_numeric_literal() {
        let mut draft = low_nps();
        draft.name = "  ".to_string();
        draft.conditions = ConditionTree::single(vec![
            Condition::new("nps", ConditionOperator::Equals, "1"),
            Condition::new("nps_score", ConditionOperator::GreaterThan, "high"),
            Condition::new("campaign_stats.lastSentDate", ConditionOperator::Equals, ""),
        ])
        .into();

        let errors = validator().validate(&draft).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path()).collect();
        assert_eq!(
            paths,
            vec![
                "name",
                "conditions.groups[0].conditions[0].field",
                "conditions.groups[0].conditions[1].value",
            ]
        );
    }

    #[test]
    fn test_auto_resolve_needs_conditions() {
        let mut draft = low_nps();
        draft.auto_resolve = true;
        let errors = validator().validate(&draft).unwrap_err();
        assert!(matches!(errors[0], ValidationError::MissingResolutionConditions { .. }));

        let draft = low_nps().with_auto_resolve(vec![ResolutionCondition::new(
            "nps_score",
            ConditionOperator::GreaterThan,
            "6",
        )]);
        assert!(validator().validate(&draft).is_ok());
    }

    #[test]
    fn test_unknown_operators_reported_by_path() {
        let body = serde_json::json!({
            "name": "Low NPS",
            "conditions": {
                "logicOperator": "OR",
                "groups": [
                    { "conditions": [{ "field": "nps_score", "operator": "less_than", "value": "6" }] },
                    { "conditions": [
                        { "field": "nps_score", "operator": "equals", "value": "1" },
                        { "field": "nps_score", "operator": "between", "value": "1" }
                    ] }
                ]
            },
            "severity": "high_risk",
            "resolution_conditions": [{ "field_path": "nps_score", "operator": "at_least", "value": 7 }]
        });

        let errors = RuleValidator::check_operators(&body).unwrap_err();
        let paths: Vec<&str> = errors.iter().map(|e| e.path()).collect();
        assert_eq!(
            paths,
            vec!["conditions.groups[1].conditions[1].operator", "resolution_conditions[0].operator"]
        );
        assert_eq!(
            errors[0],
            ValidationError::UnknownOperator {
                path: "conditions.groups[1].conditions[1].operator".to_string(),
                operator: "between".to_string(),
            }
        );

        let legacy = serde_json::json!({
            "conditions": [{ "field": "nps_score", "operator": "like", "value": "6" }]
        });
        let errors = RuleValidator::check_operators(&legacy).unwrap_err();
        assert_eq!(errors[0].path(), "conditions.groups[0].conditions[0].operator");

        let valid = serde_json::to_value(low_nps()).unwrap();
        assert!(RuleValidator::check_operators(&valid).is_ok());
    }

    #[test]
    fn test_legacy_conditions_validated() {
        let draft = RuleDraft::new(
            "Churning",
            vec![Condition::new("tier", ConditionOperator::Equals, "gold")],
            Severity::Critical,
        );
        let errors = validator().validate(&draft).unwrap_err();
        assert_eq!(errors[0].path(), "conditions.groups[0].conditions[0].field");
    }
}
