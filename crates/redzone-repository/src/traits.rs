//! Store trait definitions
//!
//! - [`RuleRepository`]: rule CRUD and the enabled-rule listing used by passes
//! - [`AlertRepository`]: alerts and the append-only activity log
//! - [`CustomerSnapshotSource`]: customer records merged with per-customer metrics
//! - [`UserDirectory`]: role lookup backing permission checks
//!
//! All implementations must be `Send + Sync` for use across async tasks.

use async_trait::async_trait;
use redzone_core::{
    AlertChange, AlertStatus, NewActivityLog, NewAlert, RedZoneActivityLog, RedZoneAlert,
    RedZoneRule, Role, RuleDraft,
};

use crate::{AlertFilter, CustomerSnapshot, LoadedRule, RepositoryResult};

/// Rule storage
#[async_trait]
pub trait RuleRepository: Send + Sync {
    /// Every rule in ascending id order
    async fn list_rules(&self) -> RepositoryResult<Vec<LoadedRule>>;

    /// Enabled rules in ascending id order; malformed rows are returned as
    /// [`LoadedRule::Malformed`] rather than failing the listing
    async fn list_enabled_rules(&self) -> RepositoryResult<Vec<LoadedRule>>;

    /// Load a decoded rule. Fails with `Malformed` if the stored JSON is corrupt.
    async fn get_rule(&self, id: i64) -> RepositoryResult<RedZoneRule>;

    /// Persist a new rule. The draft must already be validated and normalized.
    async fn create_rule(&self, draft: &RuleDraft) -> RepositoryResult<RedZoneRule>;

    /// Replace a rule's contents
    async fn update_rule(&self, id: i64, draft: &RuleDraft) -> RepositoryResult<RedZoneRule>;

    /// Toggle `enabled` without touching the rest of the row
    async fn set_rule_enabled(&self, id: i64, enabled: bool) -> RepositoryResult<()>;

    /// Delete a rule; its alerts are kept with `rule_id` cleared
    async fn delete_rule(&self, id: i64) -> RepositoryResult<()>;
}

/// Alert and activity log storage
#[async_trait]
pub trait AlertRepository: Send + Sync {
    async fn get_alert(&self, id: i64) -> RepositoryResult<RedZoneAlert>;

    /// Alerts matching `filter`, newest first
    async fn list_alerts(&self, filter: &AlertFilter) -> RepositoryResult<Vec<RedZoneAlert>>;

    /// The open alert for `(customer_id, rule_id)`, if any
    async fn find_open_alert(
        &self,
        customer_id: i64,
        rule_id: i64,
    ) -> RepositoryResult<Option<RedZoneAlert>>;

    /// Open and pending-approval alerts for `(customer_id, rule_id)`, oldest first
    async fn list_unresolved_alerts(
        &self,
        customer_id: i64,
        rule_id: i64,
    ) -> RepositoryResult<Vec<RedZoneAlert>>;

    /// Insert an `open` alert together with its `created` activity row.
    ///
    /// Returns `Conflict` when an open alert already exists for the same
    /// `(customer_id, rule_id)`; nothing is written in that case.
    async fn create_open_alert(
        &self,
        alert: NewAlert,
        log: NewActivityLog,
    ) -> RepositoryResult<RedZoneAlert>;

    /// Apply `change` to the stored alert and append `log`, atomically.
    ///
    /// Compare-and-set on status: the write only happens if the stored alert
    /// is still in `expected_status`, otherwise `Conflict` is returned. A
    /// stored alert that is already resolved is never rewritten. Only the
    /// columns named by `change` are written.
    async fn apply_transition(
        &self,
        alert_id: i64,
        expected_status: AlertStatus,
        change: &AlertChange,
        log: NewActivityLog,
    ) -> RepositoryResult<RedZoneAlert>;

    /// Activity rows for an alert in insertion order
    async fn list_activity(&self, alert_id: i64) -> RepositoryResult<Vec<RedZoneActivityLog>>;
}

/// Source of customer snapshots
#[async_trait]
pub trait CustomerSnapshotSource: Send + Sync {
    async fn load_snapshot(&self, customer_id: i64) -> RepositoryResult<CustomerSnapshot>;

    /// Customer ids strictly greater than `after`, ascending, at most `limit`
    async fn list_customer_ids(&self, after: Option<i64>, limit: usize) -> RepositoryResult<Vec<i64>>;
}

/// Role lookup for permission checks
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// `None` when the user is unknown
    async fn role_of(&self, user_id: i64) -> RepositoryResult<Option<Role>>;
}
