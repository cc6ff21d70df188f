//! Comparison operator execution
//!
//! Total over its inputs: coercion failures evaluate to `false`, nothing here
//! returns an error.

use crate::context::Resolved;
use redzone_core::types::parse_number;
use redzone_core::{ConditionOperator, Value};

/// Compare a resolved field value against a condition literal
pub(crate) fn execute_compare(resolved: &Resolved, op: ConditionOperator, literal: &str) -> bool {
    // Undefined never satisfies any operator, `not_equals` included. A typoed
    // field path must not fire a rule.
    let value = match resolved {
        Resolved::Undefined => {
            tracing::trace!("Undefined field compared with {} {:?}, returning false", op, literal);
            return false;
        }
        Resolved::Value(v) => v,
    };

    match op {
        ConditionOperator::Equals => loosely_equal(value, literal),
        ConditionOperator::NotEquals => !loosely_equal(value, literal),
        ConditionOperator::GreaterThan => numeric(value, literal).map_or(false, |(l, r)| l > r),
        ConditionOperator::LessThan => numeric(value, literal).map_or(false, |(l, r)| l < r),
        ConditionOperator::Contains => {
            if value.is_null() {
                return false;
            }
            value
                .to_comparable_string()
                .to_lowercase()
                .contains(&literal.to_lowercase())
        }
    }
}

/// Numeric equality when both sides are numeric, trimmed string equality otherwise.
/// Null compares as the empty string.
fn loosely_equal(value: &Value, literal: &str) -> bool {
    if let Some((l, r)) = numeric(value, literal) {
        return l == r;
    }
    value.to_comparable_string().trim() == literal.trim()
}

fn numeric(value: &Value, literal: &str) -> Option<(f64, f64)> {
    Some((value.as_number()?, parse_number(literal)?))
}
