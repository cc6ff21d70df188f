//! Condition Module
//!
//! Rule trigger and resolution expressions, shared by:
//! - Rule definitions (the `conditions` trigger tree)
//! - Auto-resolution criteria (`resolution_conditions`)
//! - The rule validator and the runtime evaluator
//!
//! # Encodings
//!
//! ## Grouped (current)
//! ```json
//! {
//!   "logicOperator": "OR",
//!   "groups": [
//!     { "logicOperator": "AND", "conditions": [
//!         { "field": "active_stores", "operator": "greater_than", "value": "10" }
//!     ]},
//!     { "logicOperator": "AND", "conditions": [
//!         { "field": "revenue_1_year", "operator": "less_than", "value": "100000" }
//!     ]}
//!   ]
//! }
//! ```
//!
//! ## Legacy flat array
//! ```json
//! [ { "field": "nps_score", "operator": "less_than", "value": "6" } ]
//! ```
//! evaluated as a single AND group.
//!
//! ## Supported Operators
//! - `equals`
//! - `not_equals`
//! - `greater_than`
//! - `less_than`
//! - `contains`

mod types;

pub use types::{
    Condition, ConditionGroup, ConditionOperator, ConditionTree, Literal, LogicOperator,
    ResolutionCondition, RuleConditions,
};
