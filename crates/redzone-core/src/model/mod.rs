//! Red Zone data model
//!
//! - [`RedZoneRule`] / [`RuleDraft`]: configurable trigger and resolution policy
//! - [`RedZoneAlert`] / [`NewAlert`]: per-customer alert and its lifecycle state
//! - [`RedZoneActivityLog`]: append-only audit trail, one row per transition

mod alert;
mod rule;

pub use alert::{
    ActivityAction, Actor, AlertChange, AlertStatus, NewActivityLog, NewAlert, RedZoneActivityLog,
    RedZoneAlert,
};
pub use rule::{RedZoneRule, RuleDraft, Severity};
