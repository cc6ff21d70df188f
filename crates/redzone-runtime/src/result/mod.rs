//! Evaluation result types

mod report;

pub use report::{CustomerFailure, PassReport, RuleFailure, SweepReport};
