//! Red Zone Core - Core types and definitions for the Red Zone alerting engine
//!
//! This crate provides the fundamental types used across the Red Zone crates:
//! - Value types for customer snapshot data
//! - Condition trees (grouped and legacy flat encodings)
//! - Rule, alert and activity log models
//! - Roles and the permission table
//! - The available-fields catalog and rule validation
//! - Error types

pub mod condition;
pub mod error;
pub mod model;
pub mod permission;
pub mod types;

// Re-export commonly used types
pub use condition::{
    Condition, ConditionGroup, ConditionOperator, ConditionTree, Literal, LogicOperator,
    ResolutionCondition, RuleConditions,
};
pub use error::CoreError;
pub use model::{
    ActivityAction, Actor, AlertChange, AlertStatus, NewActivityLog, NewAlert, RedZoneActivityLog,
    RedZoneAlert, RedZoneRule, RuleDraft, Severity,
};
pub use permission::{Permission, Role};
pub use types::{FieldCatalog, FieldDescriptor, FieldType, RuleValidator, ValidationError, Value};
