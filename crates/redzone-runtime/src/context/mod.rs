//! Snapshot access: field resolution and message templating

mod field_lookup;
mod template;

pub use field_lookup::{resolve, Resolved};
pub use template::{alert_reason, render_message};
