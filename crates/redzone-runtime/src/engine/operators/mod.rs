//! Operator implementations

mod comparison;

pub(crate) use comparison::execute_compare;
