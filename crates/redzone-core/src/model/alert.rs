//! Red Zone alerts and their activity log

use super::rule::Severity;
use crate::error::CoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Alert lifecycle state
///
/// ```text
/// open ──► pending_approval ──► resolved
///   └──────────────────────────────▲
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Open,
    PendingApproval,
    Resolved,
}

impl AlertStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertStatus::Open => "open",
            AlertStatus::PendingApproval => "pending_approval",
            AlertStatus::Resolved => "resolved",
        }
    }

    /// `resolved` has no outgoing transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, AlertStatus::Resolved)
    }

    /// Whether the state machine permits `self -> next`
    pub fn can_transition_to(&self, next: AlertStatus) -> bool {
        matches!(
            (self, next),
            (AlertStatus::Open, AlertStatus::PendingApproval)
                | (AlertStatus::Open, AlertStatus::Resolved)
                | (AlertStatus::PendingApproval, AlertStatus::Resolved)
        )
    }
}

impl fmt::Display for AlertStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "open" => Ok(AlertStatus::Open),
            "pending_approval" => Ok(AlertStatus::PendingApproval),
            "resolved" => Ok(AlertStatus::Resolved),
            other => Err(CoreError::UnknownStatus(other.to_string())),
        }
    }
}

/// Who performed an action: the rule engine itself or a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    System,
    User(i64),
}

impl Actor {
    /// Text form used in storage: `"system"` or the decimal user id
    pub fn to_db_string(&self) -> String {
        match self {
            Actor::System => "system".to_string(),
            Actor::User(id) => id.to_string(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        match self {
            Actor::System => None,
            Actor::User(id) => Some(*id),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::System => f.write_str("system"),
            Actor::User(id) => write!(f, "user:{}", id),
        }
    }
}

impl FromStr for Actor {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == "system" {
            return Ok(Actor::System);
        }
        s.trim_start_matches("user:")
            .parse::<i64>()
            .map(Actor::User)
            .map_err(|_| CoreError::InvalidActor(s.to_string()))
    }
}

impl Serialize for Actor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Actor::System => serializer.serialize_str("system"),
            Actor::User(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for Actor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Actor::User)
                .ok_or_else(|| serde::de::Error::custom("actor id must be an integer")),
            serde_json::Value::String(s) => s.parse().map_err(serde::de::Error::custom),
            other => Err(serde::de::Error::custom(format!("invalid actor: {}", other))),
        }
    }
}

/// A Red Zone alert raised for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedZoneAlert {
    pub id: i64,
    pub customer_id: i64,
    /// Nulled when the originating rule is deleted
    pub rule_id: Option<i64>,
    pub reason: String,
    pub severity: Severity,
    pub status: AlertStatus,
    /// Snapshot of the field values that triggered the alert
    pub details: serde_json::Value,
    pub notes: Option<String>,
    pub assigned_to: Option<i64>,
    pub escalated_to: Option<i64>,
    pub escalated_at: Option<DateTime<Utc>>,
    pub resolution_summary: Option<String>,
    pub resolved_by: Option<Actor>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl RedZoneAlert {
    pub fn is_open(&self) -> bool {
        self.status == AlertStatus::Open
    }

    pub fn is_resolved(&self) -> bool {
        self.status == AlertStatus::Resolved
    }
}

/// One mutation of a stored alert.
///
/// Each variant names only the columns it writes, so a change is always
/// applied on top of the current stored row and never reverts columns set
/// by another writer.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertChange {
    Escalate { to: i64, at: DateTime<Utc> },
    Assign { assignee: i64 },
    Notes { notes: String },
    /// `open -> pending_approval`
    RequestApproval,
    /// Resolve; a `None` summary keeps the stored one
    Resolve {
        by: Actor,
        at: DateTime<Utc>,
        summary: Option<String>,
    },
}

impl AlertChange {
    /// Status after the change is applied to an alert in `current`
    pub fn target_status(&self, current: AlertStatus) -> AlertStatus {
        match self {
            AlertChange::RequestApproval => AlertStatus::PendingApproval,
            AlertChange::Resolve { .. } => AlertStatus::Resolved,
            _ => current,
        }
    }

    /// Apply to `alert` in place
    pub fn apply_to(&self, alert: &mut RedZoneAlert) {
        alert.status = self.target_status(alert.status);
        match self {
            AlertChange::Escalate { to, at } => {
                alert.escalated_to = Some(*to);
                alert.escalated_at = Some(*at);
            }
            AlertChange::Assign { assignee } => alert.assigned_to = Some(*assignee),
            AlertChange::Notes { notes } => alert.notes = Some(notes.clone()),
            AlertChange::RequestApproval => {}
            AlertChange::Resolve { by, at, summary } => {
                alert.resolved_by = Some(*by);
                alert.resolved_at = Some(*at);
                if let Some(summary) = summary {
                    alert.resolution_summary = Some(summary.clone());
                }
            }
        }
    }
}

/// Alert contents produced by the rule engine before persistence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewAlert {
    pub customer_id: i64,
    pub rule_id: Option<i64>,
    pub reason: String,
    pub severity: Severity,
    pub details: serde_json::Value,
}

impl NewAlert {
    /// Materialize as an `open` alert
    pub fn into_alert(self, id: i64, created_at: DateTime<Utc>) -> RedZoneAlert {
        RedZoneAlert {
            id,
            customer_id: self.customer_id,
            rule_id: self.rule_id,
            reason: self.reason,
            severity: self.severity,
            status: AlertStatus::Open,
            details: self.details,
            notes: None,
            assigned_to: None,
            escalated_to: None,
            escalated_at: None,
            resolution_summary: None,
            resolved_by: None,
            resolved_at: None,
            created_at,
        }
    }
}

/// Activity log action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Created,
    Updated,
    Escalated,
    Assigned,
    Resolved,
}

impl ActivityAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityAction::Created => "created",
            ActivityAction::Updated => "updated",
            ActivityAction::Escalated => "escalated",
            ActivityAction::Assigned => "assigned",
            ActivityAction::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ActivityAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ActivityAction::Created),
            "updated" => Ok(ActivityAction::Updated),
            "escalated" => Ok(ActivityAction::Escalated),
            "assigned" => Ok(ActivityAction::Assigned),
            "resolved" => Ok(ActivityAction::Resolved),
            other => Err(CoreError::UnknownAction(other.to_string())),
        }
    }
}

/// Append-only audit row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedZoneActivityLog {
    pub id: i64,
    pub alert_id: i64,
    pub action: ActivityAction,
    pub performed_by: Actor,
    pub details: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Activity row before persistence; the alert id is supplied by the store
#[derive(Debug, Clone, PartialEq)]
pub struct NewActivityLog {
    pub action: ActivityAction,
    pub performed_by: Actor,
    pub details: serde_json::Value,
}

impl NewActivityLog {
    pub fn new(action: ActivityAction, performed_by: Actor, details: serde_json::Value) -> Self {
        Self {
            action,
            performed_by,
            details,
        }
    }

    pub fn into_log(self, id: i64, alert_id: i64, created_at: DateTime<Utc>) -> RedZoneActivityLog {
        RedZoneActivityLog {
            id,
            alert_id,
            action: self.action,
            performed_by: self.performed_by,
            details: self.details,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_keeps_unrelated_columns() {
        let now = Utc::now();
        let mut alert = NewAlert {
            customer_id: 42,
            rule_id: Some(1),
            reason: "Low NPS".to_string(),
            severity: Severity::HighRisk,
            details: serde_json::json!({}),
        }
        .into_alert(1, now);

        AlertChange::Escalate { to: 2, at: now }.apply_to(&mut alert);
        AlertChange::Assign { assignee: 7 }.apply_to(&mut alert);
        assert_eq!(alert.status, AlertStatus::Open);

        AlertChange::Resolve {
            by: Actor::System,
            at: now,
            summary: None,
        }
        .apply_to(&mut alert);
        assert_eq!(alert.status, AlertStatus::Resolved);
        assert_eq!(alert.escalated_to, Some(2));
        assert_eq!(alert.assigned_to, Some(7));
        assert!(alert.resolution_summary.is_none());
    }

    #[test]
    fn test_status_transitions() {
        assert!(AlertStatus::Open.can_transition_to(AlertStatus::PendingApproval));
        assert!(AlertStatus::Open.can_transition_to(AlertStatus::Resolved));
        assert!(AlertStatus::PendingApproval.can_transition_to(AlertStatus::Resolved));
        assert!(!AlertStatus::PendingApproval.can_transition_to(AlertStatus::Open));

        for next in [AlertStatus::Open, AlertStatus::PendingApproval, AlertStatus::Resolved] {
            assert!(!AlertStatus::Resolved.can_transition_to(next));
        }
        assert!(AlertStatus::Resolved.is_terminal());
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("pending_approval".parse::<AlertStatus>().unwrap(), AlertStatus::PendingApproval);
        assert!("closed".parse::<AlertStatus>().is_err());
    }

    #[test]
    fn test_actor_forms() {
        assert_eq!(Actor::System.to_db_string(), "system");
        assert_eq!(Actor::User(7).to_db_string(), "7");
        assert_eq!("system".parse::<Actor>().unwrap(), Actor::System);
        assert_eq!("7".parse::<Actor>().unwrap(), Actor::User(7));
        assert_eq!("user:7".parse::<Actor>().unwrap(), Actor::User(7));
        assert!("nobody".parse::<Actor>().is_err());

        assert_eq!(serde_json::to_value(Actor::User(3)).unwrap(), serde_json::json!(3));
        assert_eq!(serde_json::to_value(Actor::System).unwrap(), serde_json::json!("system"));
        let actor: Actor = serde_json::from_value(serde_json::json!("system")).unwrap();
        assert_eq!(actor, Actor::System);
    }

    #[test]
    fn test_new_alert_is_open() {
        let alert = NewAlert {
            customer_id: 42,
            rule_id: Some(1),
            reason: "Low NPS".to_string(),
            severity: Severity::HighRisk,
            details: serde_json::json!({ "nps_score": 4 }),
        }
        .into_alert(10, Utc::now());

        assert!(alert.is_open());
        assert!(alert.resolved_at.is_none());
        assert_eq!(alert.rule_id, Some(1));
    }
}
