//! Alert Lifecycle Manager
//!
//! ```text
//! open ──► pending_approval ──► resolved
//!   └──────────────────────────────▲
//! ```
//!
//! Every mutation goes through [`AlertRepository::apply_transition`] together
//! with exactly one activity row, so the audit trail is complete. User-facing
//! operations check, in order: the alert exists, the caller holds the
//! permission, the current status allows the operation.

use super::guard::PermissionGuard;
use crate::error::{LifecycleError, LifecycleResult};
use chrono::Utc;
use redzone_core::{
    ActivityAction, Actor, AlertChange, AlertStatus, NewActivityLog, NewAlert, Permission,
    RedZoneAlert,
};
use redzone_repository::{AlertRepository, RepositoryError};
use serde_json::json;
use std::sync::Arc;

/// Drives alert state transitions and their activity log
#[derive(Clone)]
pub struct AlertLifecycleManager {
    alerts: Arc<dyn AlertRepository>,
    guard: PermissionGuard,
}

impl AlertLifecycleManager {
    pub fn new(alerts: Arc<dyn AlertRepository>, guard: PermissionGuard) -> Self {
        Self { alerts, guard }
    }

    pub fn guard(&self) -> &PermissionGuard {
        &self.guard
    }

    /// Create an `open` alert with its `created` row (system actor).
    ///
    /// `Conflict` means an open alert for the same customer and rule already exists.
    pub async fn open(&self, alert: NewAlert) -> LifecycleResult<RedZoneAlert> {
        let log = NewActivityLog::new(
            ActivityAction::Created,
            Actor::System,
            json!({
                "rule_id": alert.rule_id,
                "severity": alert.severity,
                "reason": alert.reason,
            }),
        );
        let created = self.alerts.create_open_alert(alert, log).await?;
        tracing::info!(
            alert_id = created.id,
            customer_id = created.customer_id,
            rule_id = ?created.rule_id,
            severity = %created.severity,
            "Red zone alert created"
        );
        Ok(created)
    }

    /// Record an escalation; status is unchanged
    pub async fn escalate(&self, alert_id: i64, by: i64, to: i64) -> LifecycleResult<RedZoneAlert> {
        let alert = self.load(alert_id).await?;
        self.guard.require(by, Permission::EscalateAlerts).await?;
        ensure_not_resolved(&alert, "escalate")?;

        let change = AlertChange::Escalate { to, at: Utc::now() };
        let log = NewActivityLog::new(
            ActivityAction::Escalated,
            Actor::User(by),
            json!({ "escalated_to": to }),
        );
        self.commit(&alert, &change, log).await
    }

    /// Resolve from `open` or `pending_approval`
    pub async fn resolve_manually(
        &self,
        alert_id: i64,
        by: i64,
        summary: impl Into<String>,
    ) -> LifecycleResult<RedZoneAlert> {
        let alert = self.load(alert_id).await?;
        self.guard.require(by, Permission::ResolveAlerts).await?;
        ensure_not_resolved(&alert, "resolve")?;

        let summary = summary.into();
        let log = NewActivityLog::new(
            ActivityAction::Resolved,
            Actor::User(by),
            json!({ "from": alert.status, "summary": summary }),
        );
        let change = resolve(Actor::User(by), Some(summary));
        self.commit(&alert, &change, log).await
    }

    /// Approve a pending resolution; requires the approve permission
    pub async fn approve_resolution(
        &self,
        alert_id: i64,
        by: i64,
        summary: Option<String>,
    ) -> LifecycleResult<RedZoneAlert> {
        let alert = self.load(alert_id).await?;
        self.guard.require(by, Permission::ApproveResolutions).await?;
        if alert.status != AlertStatus::PendingApproval {
            return Err(invalid(&alert, "approve"));
        }

        let log = NewActivityLog::new(
            ActivityAction::Resolved,
            Actor::User(by),
            json!({
                "from": alert.status,
                "approved": true,
                "summary": summary.as_ref().or(alert.resolution_summary.as_ref()),
            }),
        );
        // No summary keeps the stored one
        let change = resolve(Actor::User(by), summary);
        self.commit(&alert, &change, log).await
    }

    /// Set the assignee; status is unchanged
    pub async fn assign(&self, alert_id: i64, by: i64, assignee: i64) -> LifecycleResult<RedZoneAlert> {
        let alert = self.load(alert_id).await?;
        self.guard.require(by, Permission::AssignAlerts).await?;
        ensure_not_resolved(&alert, "assign")?;

        let change = AlertChange::Assign { assignee };
        let log = NewActivityLog::new(
            ActivityAction::Assigned,
            Actor::User(by),
            json!({ "previous": alert.assigned_to, "assigned_to": assignee }),
        );
        self.commit(&alert, &change, log).await
    }

    /// Replace the alert notes
    pub async fn update_notes(
        &self,
        alert_id: i64,
        by: i64,
        notes: impl Into<String>,
    ) -> LifecycleResult<RedZoneAlert> {
        let alert = self.load(alert_id).await?;
        self.guard.require(by, Permission::ResolveAlerts).await?;
        ensure_not_resolved(&alert, "update notes on")?;

        let change = AlertChange::Notes { notes: notes.into() };
        let log = NewActivityLog::new(
            ActivityAction::Updated,
            Actor::User(by),
            json!({ "field": "notes" }),
        );
        self.commit(&alert, &change, log).await
    }

    /// `open -> pending_approval` after resolution conditions pass on a rule
    /// that requires team-lead approval (system actor)
    pub async fn request_approval(&self, alert: &RedZoneAlert) -> LifecycleResult<RedZoneAlert> {
        if alert.status != AlertStatus::Open {
            return Err(invalid(alert, "request approval for"));
        }

        let log = NewActivityLog::new(
            ActivityAction::Updated,
            Actor::System,
            json!({ "from": AlertStatus::Open, "to": AlertStatus::PendingApproval, "reason": "resolution conditions met" }),
        );
        self.commit(alert, &AlertChange::RequestApproval, log).await
    }

    /// Resolve after resolution conditions pass (system actor)
    pub async fn auto_resolve(
        &self,
        alert: &RedZoneAlert,
        summary: impl Into<String>,
    ) -> LifecycleResult<RedZoneAlert> {
        if alert.status.is_terminal() {
            return Err(invalid(alert, "auto-resolve"));
        }

        let summary = summary.into();
        let log = NewActivityLog::new(
            ActivityAction::Resolved,
            Actor::System,
            json!({ "from": alert.status, "summary": summary, "automatic": true }),
        );
        let change = resolve(Actor::System, Some(summary));
        self.commit(alert, &change, log).await
    }

    async fn load(&self, alert_id: i64) -> LifecycleResult<RedZoneAlert> {
        match self.alerts.get_alert(alert_id).await {
            Ok(alert) => Ok(alert),
            Err(RepositoryError::NotFound { .. }) => Err(LifecycleError::NotFound(alert_id)),
            Err(e) => Err(e.into()),
        }
    }

    /// Apply `change` on top of the stored row, provided it is still in
    /// `current.status`. Columns the change does not name are left as stored.
    async fn commit(
        &self,
        current: &RedZoneAlert,
        change: &AlertChange,
        log: NewActivityLog,
    ) -> LifecycleResult<RedZoneAlert> {
        let target = change.target_status(current.status);
        debug_assert!(current.status == target || current.status.can_transition_to(target));
        let action = log.action;
        let stored = self
            .alerts
            .apply_transition(current.id, current.status, change, log)
            .await?;
        tracing::info!(
            alert_id = stored.id,
            action = %action,
            from = %current.status,
            to = %stored.status,
            "Red zone alert updated"
        );
        Ok(stored)
    }
}

fn resolve(by: Actor, summary: Option<String>) -> AlertChange {
    AlertChange::Resolve {
        by,
        at: Utc::now(),
        summary,
    }
}

fn ensure_not_resolved(alert: &RedZoneAlert, action: &'static str) -> LifecycleResult<()> {
    if alert.status.is_terminal() {
        return Err(invalid(alert, action));
    }
    Ok(())
}

fn invalid(alert: &RedZoneAlert, action: &'static str) -> LifecycleError {
    LifecycleError::InvalidTransition {
        alert_id: alert.id,
        status: alert.status,
        action,
    }
}
