//! In-memory store
//!
//! Implements every store trait behind a single `RwLock`, which makes each
//! operation atomic. Used by tests and by the server's `memory` repository mode.

use async_trait::async_trait;
use chrono::Utc;
use redzone_core::{
    AlertChange, AlertStatus, NewActivityLog, NewAlert, RedZoneActivityLog, RedZoneAlert,
    RedZoneRule, Role, RuleDraft, Severity,
};
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::{
    AlertFilter, AlertRepository, CustomerSnapshot, CustomerSnapshotSource, LoadedRule,
    RepositoryError, RepositoryResult, RuleRecord, RuleRepository, UserDirectory,
};

#[derive(Debug, Default)]
struct Inner {
    rules: BTreeMap<i64, RuleRecord>,
    alerts: BTreeMap<i64, RedZoneAlert>,
    activity: Vec<RedZoneActivityLog>,
    customers: BTreeMap<i64, CustomerSnapshot>,
    users: HashMap<i64, Role>,
    next_rule_id: i64,
    next_alert_id: i64,
    next_activity_id: i64,
}

impl Inner {
    fn next_rule_id(&mut self) -> i64 {
        self.next_rule_id += 1;
        self.next_rule_id
    }

    fn next_alert_id(&mut self) -> i64 {
        self.next_alert_id += 1;
        self.next_alert_id
    }

    fn push_activity(&mut self, alert_id: i64, log: NewActivityLog) {
        self.next_activity_id += 1;
        let row = log.into_log(self.next_activity_id, alert_id, Utc::now());
        self.activity.push(row);
    }
}

/// In-memory implementation of all Red Zone stores
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a customer snapshot
    pub async fn put_customer(&self, snapshot: CustomerSnapshot) {
        let mut inner = self.inner.write().await;
        inner.customers.insert(snapshot.customer_id, snapshot);
    }

    /// Register a user's role
    pub async fn put_user(&self, user_id: i64, role: Role) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user_id, role);
    }

    /// Store a rule row with arbitrary `conditions` JSON, bypassing validation.
    ///
    /// Lets tests and imports reproduce rows written by older versions.
    pub async fn insert_raw_rule(
        &self,
        name: &str,
        conditions: serde_json::Value,
        severity: Severity,
        enabled: bool,
    ) -> i64 {
        let mut inner = self.inner.write().await;
        let id = inner.next_rule_id();
        let now = Utc::now();
        inner.rules.insert(
            id,
            RuleRecord {
                id,
                name: name.to_string(),
                description: None,
                conditions,
                severity: severity.as_str().to_string(),
                auto_resolve: false,
                resolution_conditions: serde_json::Value::Array(vec![]),
                enabled,
                team_lead_approval_required: false,
                notification_message: None,
                created_at: now,
                updated_at: now,
            },
        );
        id
    }

    /// Number of activity rows across all alerts
    pub async fn activity_count(&self) -> usize {
        self.inner.read().await.activity.len()
    }
}

#[async_trait]
impl RuleRepository for MemoryStore {
    async fn list_rules(&self) -> RepositoryResult<Vec<LoadedRule>> {
        let inner = self.inner.read().await;
        Ok(inner.rules.values().cloned().map(RuleRecord::into_loaded).collect())
    }

    async fn list_enabled_rules(&self) -> RepositoryResult<Vec<LoadedRule>> {
        let inner = self.inner.read().await;
        Ok(inner
            .rules
            .values()
            .filter(|r| r.enabled)
            .cloned()
            .map(RuleRecord::into_loaded)
            .collect())
    }

    async fn get_rule(&self, id: i64) -> RepositoryResult<RedZoneRule> {
        let inner = self.inner.read().await;
        let record = inner
            .rules
            .get(&id)
            .ok_or_else(|| RepositoryError::not_found("rule", id))?;
        record
            .decode()
            .map_err(|reason| RepositoryError::Malformed { id, reason })
    }

    async fn create_rule(&self, draft: &RuleDraft) -> RepositoryResult<RedZoneRule> {
        let mut inner = self.inner.write().await;
        let id = inner.next_rule_id();
        let now = Utc::now();
        let record = RuleRecord::from_draft(id, draft, now, now)?;
        inner.rules.insert(id, record);
        Ok(draft.clone().into_rule(id, now, now))
    }

    async fn update_rule(&self, id: i64, draft: &RuleDraft) -> RepositoryResult<RedZoneRule> {
        let mut inner = self.inner.write().await;
        let created_at = inner
            .rules
            .get(&id)
            .map(|r| r.created_at)
            .ok_or_else(|| RepositoryError::not_found("rule", id))?;
        let now = Utc::now();
        let record = RuleRecord::from_draft(id, draft, created_at, now)?;
        inner.rules.insert(id, record);
        Ok(draft.clone().into_rule(id, created_at, now))
    }

    async fn set_rule_enabled(&self, id: i64, enabled: bool) -> RepositoryResult<()> {
        let mut inner = self.inner.write().await;
        let record = inner
            .rules
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("rule", id))?;
        record.enabled = enabled;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_rule(&self, id: i64) -> RepositoryResult<()> {
        let mut inner = self.inner.write().await;
        if inner.rules.remove(&id).is_none() {
            return Err(RepositoryError::not_found("rule", id));
        }
        for alert in inner.alerts.values_mut() {
            if alert.rule_id == Some(id) {
                alert.rule_id = None;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl AlertRepository for MemoryStore {
    async fn get_alert(&self, id: i64) -> RepositoryResult<RedZoneAlert> {
        let inner = self.inner.read().await;
        inner
            .alerts
            .get(&id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("alert", id))
    }

    async fn list_alerts(&self, filter: &AlertFilter) -> RepositoryResult<Vec<RedZoneAlert>> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .values()
            .rev()
            .filter(|a| filter.matches(a))
            .cloned()
            .collect())
    }

    async fn find_open_alert(
        &self,
        customer_id: i64,
        rule_id: i64,
    ) -> RepositoryResult<Option<RedZoneAlert>> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .values()
            .find(|a| {
                a.customer_id == customer_id
                    && a.rule_id == Some(rule_id)
                    && a.status == AlertStatus::Open
            })
            .cloned())
    }

    async fn list_unresolved_alerts(
        &self,
        customer_id: i64,
        rule_id: i64,
    ) -> RepositoryResult<Vec<RedZoneAlert>> {
        let inner = self.inner.read().await;
        Ok(inner
            .alerts
            .values()
            .filter(|a| {
                a.customer_id == customer_id && a.rule_id == Some(rule_id) && !a.is_resolved()
            })
            .cloned()
            .collect())
    }

    async fn create_open_alert(
        &self,
        alert: NewAlert,
        log: NewActivityLog,
    ) -> RepositoryResult<RedZoneAlert> {
        let mut inner = self.inner.write().await;

        if let Some(rule_id) = alert.rule_id {
            let duplicate = inner.alerts.values().any(|a| {
                a.customer_id == alert.customer_id
                    && a.rule_id == Some(rule_id)
                    && a.status == AlertStatus::Open
            });
            if duplicate {
                return Err(RepositoryError::Conflict(format!(
                    "open alert already exists for customer {} and rule {}",
                    alert.customer_id, rule_id
                )));
            }
        }

        let id = inner.next_alert_id();
        let created = alert.into_alert(id, Utc::now());
        inner.alerts.insert(id, created.clone());
        inner.push_activity(id, log);
        Ok(created)
    }

    async fn apply_transition(
        &self,
        alert_id: i64,
        expected_status: AlertStatus,
        change: &AlertChange,
        log: NewActivityLog,
    ) -> RepositoryResult<RedZoneAlert> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .alerts
            .get_mut(&alert_id)
            .ok_or_else(|| RepositoryError::not_found("alert", alert_id))?;

        if stored.status != expected_status || stored.status.is_terminal() {
            return Err(RepositoryError::Conflict(format!(
                "alert {} is {}, expected {}",
                alert_id, stored.status, expected_status
            )));
        }

        change.apply_to(stored);
        let updated = stored.clone();

        inner.push_activity(alert_id, log);
        Ok(updated)
    }

    async fn list_activity(&self, alert_id: i64) -> RepositoryResult<Vec<RedZoneActivityLog>> {
        let inner = self.inner.read().await;
        Ok(inner
            .activity
            .iter()
            .filter(|row| row.alert_id == alert_id)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerSnapshotSource for MemoryStore {
    async fn load_snapshot(&self, customer_id: i64) -> RepositoryResult<CustomerSnapshot> {
        let inner = self.inner.read().await;
        inner
            .customers
            .get(&customer_id)
            .cloned()
            .ok_or_else(|| RepositoryError::not_found("customer", customer_id))
    }

    async fn list_customer_ids(&self, after: Option<i64>, limit: usize) -> RepositoryResult<Vec<i64>> {
        let inner = self.inner.read().await;
        let ids = match after {
            Some(after) => inner
                .customers
                .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
                .map(|(id, _)| *id)
                .take(limit)
                .collect(),
            None => inner.customers.keys().copied().take(limit).collect(),
        };
        Ok(ids)
    }
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn role_of(&self, user_id: i64) -> RepositoryResult<Option<Role>> {
        Ok(self.inner.read().await.users.get(&user_id).copied())
    }
}
