//! Evaluation engine
//!
//! - [`evaluator`]: condition, group and tree evaluation (pure)
//! - [`RuleEngine`]: one customer against a [`RuleSet`]
//! - [`Sweeper`]: many customers, paged and checkpointable

pub mod evaluator;
mod operators;
pub mod rule_engine;
pub mod sweep;

pub use evaluator::{
    evaluate_condition, evaluate_conditions, evaluate_group, evaluate_resolution, evaluate_tree,
    trigger_details,
};
pub use rule_engine::{MalformedRule, RuleEngine, RuleSet};
pub use sweep::{SweepOptions, Sweeper};
