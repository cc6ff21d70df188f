//! Condition, group and tree evaluation
//!
//! Every function here is a pure function of its inputs. Groups and trees
//! short-circuit; conditions have no side effects, so skipping is safe.

use super::operators::execute_compare;
use crate::context::{resolve, Resolved};
use redzone_core::{
    Condition, ConditionGroup, ConditionTree, LogicOperator, ResolutionCondition, RuleConditions,
};
use redzone_repository::CustomerSnapshot;

/// Evaluate a single condition
pub fn evaluate_condition(condition: &Condition, snapshot: &CustomerSnapshot) -> bool {
    let resolved = resolve(snapshot, &condition.field);
    let result = execute_compare(&resolved, condition.operator, condition.value.as_str());
    tracing::trace!(
        field = %condition.field,
        operator = %condition.operator,
        value = %condition.value,
        result,
        "condition evaluated"
    );
    result
}

/// Fold a group's conditions with its logic operator
pub fn evaluate_group(group: &ConditionGroup, snapshot: &CustomerSnapshot) -> bool {
    match group.logic_operator {
        LogicOperator::And => group.conditions.iter().all(|c| evaluate_condition(c, snapshot)),
        LogicOperator::Or => group.conditions.iter().any(|c| evaluate_condition(c, snapshot)),
    }
}

/// Fold group results with the tree's top-level logic operator
pub fn evaluate_tree(tree: &ConditionTree, snapshot: &CustomerSnapshot) -> bool {
    match tree.logic_operator {
        LogicOperator::And => tree.groups.iter().all(|g| evaluate_group(g, snapshot)),
        LogicOperator::Or => tree.groups.iter().any(|g| evaluate_group(g, snapshot)),
    }
}

/// Evaluate a stored trigger expression; legacy flat arrays run as one AND group
pub fn evaluate_conditions(conditions: &RuleConditions, snapshot: &CustomerSnapshot) -> bool {
    evaluate_tree(&conditions.to_tree(), snapshot)
}

/// AND over resolution conditions. An empty list is `false`: zero criteria
/// never auto-resolve.
pub fn evaluate_resolution(conditions: &[ResolutionCondition], snapshot: &CustomerSnapshot) -> bool {
    if conditions.is_empty() {
        return false;
    }
    conditions.iter().all(|c| {
        let resolved = resolve(snapshot, &c.field_path);
        execute_compare(&resolved, c.operator, c.value.as_str())
    })
}

/// Snapshot of the values a trigger expression reads, keyed by field path.
/// Undefined paths are omitted.
pub fn trigger_details(conditions: &RuleConditions, snapshot: &CustomerSnapshot) -> serde_json::Value {
    let tree = conditions.to_tree();
    let mut details = serde_json::Map::new();
    for condition in tree.all_conditions() {
        if details.contains_key(&condition.field) {
            continue;
        }
        if let Resolved::Value(value) = resolve(snapshot, &condition.field) {
            details.insert(condition.field.clone(), serde_json::Value::from(value));
        }
    }
    serde_json::Value::Object(details)
}
