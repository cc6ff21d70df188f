//! Condition types for rule trigger and resolution expressions

use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

/// Combines conditions (inside a group) or groups (inside a tree)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LogicOperator {
    #[default]
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl LogicOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogicOperator::And => "AND",
            LogicOperator::Or => "OR",
        }
    }
}

impl FromStr for LogicOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(LogicOperator::And),
            "OR" => Ok(LogicOperator::Or),
            _ => Err(CoreError::UnknownLogicOperator(s.to_string())),
        }
    }
}

/// Comparison operator of a single condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Equals,
    NotEquals,
    GreaterThan,
    LessThan,
    Contains,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::NotEquals => "not_equals",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
            ConditionOperator::Contains => "contains",
        }
    }

    /// Returns true for operators that coerce both sides to numbers
    pub fn is_numeric(&self) -> bool {
        matches!(self, ConditionOperator::GreaterThan | ConditionOperator::LessThan)
    }
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConditionOperator {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "equals" => Ok(ConditionOperator::Equals),
            "not_equals" => Ok(ConditionOperator::NotEquals),
            "greater_than" => Ok(ConditionOperator::GreaterThan),
            "less_than" => Ok(ConditionOperator::LessThan),
            "contains" => Ok(ConditionOperator::Contains),
            other => Err(CoreError::UnknownOperator(other.to_string())),
        }
    }
}

/// `{ field, operator, value }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Field path into the customer snapshot (e.g. "nps_score", "campaign_stats.lastSentDate")
    pub field: String,
    pub operator: ConditionOperator,
    /// Literal, coerced to the field's type at comparison time
    pub value: Literal,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: impl Into<Literal>) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// A group of conditions folded with its own logic operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(rename = "logicOperator", default)]
    pub logic_operator: LogicOperator,
    pub conditions: Vec<Condition>,
}

impl ConditionGroup {
    pub fn new(logic_operator: LogicOperator, conditions: Vec<Condition>) -> Self {
        Self {
            logic_operator,
            conditions,
        }
    }

    /// Create an AND group
    pub fn all(conditions: Vec<Condition>) -> Self {
        Self::new(LogicOperator::And, conditions)
    }

    /// Create an OR group
    pub fn any(conditions: Vec<Condition>) -> Self {
        Self::new(LogicOperator::Or, conditions)
    }
}

/// The rule's trigger expression: groups folded with a top-level logic operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionTree {
    #[serde(rename = "logicOperator", default)]
    pub logic_operator: LogicOperator,
    pub groups: Vec<ConditionGroup>,
}

impl ConditionTree {
    pub fn new(logic_operator: LogicOperator, groups: Vec<ConditionGroup>) -> Self {
        Self {
            logic_operator,
            groups,
        }
    }

    /// A tree holding one AND group
    pub fn single(conditions: Vec<Condition>) -> Self {
        Self::new(LogicOperator::And, vec![ConditionGroup::all(conditions)])
    }

    /// All conditions in this tree (flattened, in order)
    pub fn all_conditions(&self) -> impl Iterator<Item = &Condition> {
        self.groups.iter().flat_map(|g| g.conditions.iter())
    }
}

/// On-disk encoding of a rule's `conditions` column.
///
/// Older rows store a flat array of conditions; current rows store the grouped
/// tree. Both round-trip unchanged through serde, and [`RuleConditions::to_tree`]
/// is the single place the legacy form is converted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleConditions {
    /// `{ logicOperator, groups: [...] }`
    Grouped(ConditionTree),
    /// `[ {field, operator, value}, ... ]`, implicitly one AND group
    Legacy(Vec<Condition>),
}

impl RuleConditions {
    /// Normalize into the grouped form
    pub fn to_tree(&self) -> Cow<'_, ConditionTree> {
        match self {
            RuleConditions::Grouped(tree) => Cow::Borrowed(tree),
            RuleConditions::Legacy(conditions) => Cow::Owned(ConditionTree::single(conditions.clone())),
        }
    }

    /// Consume and normalize into the grouped form
    pub fn into_tree(self) -> ConditionTree {
        match self {
            RuleConditions::Grouped(tree) => tree,
            RuleConditions::Legacy(conditions) => ConditionTree::single(conditions),
        }
    }

    pub fn is_legacy(&self) -> bool {
        matches!(self, RuleConditions::Legacy(_))
    }

    /// Decode a stored JSON document
    pub fn from_json(value: &serde_json::Value) -> Result<Self, CoreError> {
        serde_json::from_value(value.clone())
            .map_err(|e| CoreError::MalformedConditions(e.to_string()))
    }

    /// Encode for storage
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<ConditionTree> for RuleConditions {
    fn from(tree: ConditionTree) -> Self {
        RuleConditions::Grouped(tree)
    }
}

impl From<Vec<Condition>> for RuleConditions {
    fn from(conditions: Vec<Condition>) -> Self {
        RuleConditions::Legacy(conditions)
    }
}

/// Auto-resolution criterion; a rule's list is implicitly AND-combined
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionCondition {
    pub field_path: String,
    pub operator: ConditionOperator,
    pub value: Literal,
}

impl ResolutionCondition {
    pub fn new(
        field_path: impl Into<String>,
        operator: ConditionOperator,
        value: impl Into<Literal>,
    ) -> Self {
        Self {
            field_path: field_path.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Right-hand side of a condition.
///
/// Older rows were written by forms that did not always quote numbers, so a
/// string, number, boolean or null is accepted. The scalar is kept as written
/// and serialized back unchanged; comparisons use its text form (`null` reads
/// as the empty string).
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    raw: serde_json::Value,
    text: String,
}

impl Literal {
    pub fn from_json(raw: serde_json::Value) -> Result<Self, CoreError> {
        let text = match &raw {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            other => {
                return Err(CoreError::MalformedConditions(format!(
                    "condition value must be a scalar, got {}",
                    other
                )))
            }
        };
        Ok(Self { raw, text })
    }

    /// Text used for comparison
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// The scalar as written
    pub fn raw(&self) -> &serde_json::Value {
        &self.raw
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<String> for Literal {
    fn from(text: String) -> Self {
        Self {
            raw: serde_json::Value::String(text.clone()),
            text,
        }
    }
}

impl From<&str> for Literal {
    fn from(text: &str) -> Self {
        Self::from(text.to_string())
    }
}

impl PartialEq<str> for Literal {
    fn eq(&self, other: &str) -> bool {
        self.text == other
    }
}

impl PartialEq<&str> for Literal {
    fn eq(&self, other: &&str) -> bool {
        self.text == *other
    }
}

impl Serialize for Literal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Literal {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        Literal::from_json(raw).map_err(serde::de::Error::custom)
    }
}
