//! Data models for the repository layer

use chrono::{DateTime, Utc};
use redzone_core::{
    AlertStatus, RedZoneAlert, RedZoneRule, ResolutionCondition, RuleConditions, RuleDraft, Severity,
    Value,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A rule as read from storage.
///
/// A row whose stored JSON no longer decodes is surfaced as `Malformed`
/// instead of failing the whole listing, so one bad row cannot hide the rest.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LoadedRule {
    Valid(RedZoneRule),
    Malformed { id: i64, name: String, reason: String },
}

impl LoadedRule {
    pub fn id(&self) -> i64 {
        match self {
            LoadedRule::Valid(rule) => rule.id,
            LoadedRule::Malformed { id, .. } => *id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            LoadedRule::Valid(rule) => &rule.name,
            LoadedRule::Malformed { name, .. } => name,
        }
    }

    pub fn as_valid(&self) -> Option<&RedZoneRule> {
        match self {
            LoadedRule::Valid(rule) => Some(rule),
            LoadedRule::Malformed { .. } => None,
        }
    }
}

/// Storage row for a rule: JSON columns are kept undecoded
#[derive(Debug, Clone, PartialEq)]
pub struct RuleRecord {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub conditions: serde_json::Value,
    pub severity: String,
    pub auto_resolve: bool,
    pub resolution_conditions: serde_json::Value,
    pub enabled: bool,
    pub team_lead_approval_required: bool,
    pub notification_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RuleRecord {
    /// Encode a draft for storage
    pub fn from_draft(
        id: i64,
        draft: &RuleDraft,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id,
            name: draft.name.clone(),
            description: draft.description.clone(),
            conditions: serde_json::to_value(&draft.conditions)?,
            severity: draft.severity.as_str().to_string(),
            auto_resolve: draft.auto_resolve,
            resolution_conditions: serde_json::to_value(&draft.resolution_conditions)?,
            enabled: draft.enabled,
            team_lead_approval_required: draft.team_lead_approval_required,
            notification_message: draft.notification_message.clone(),
            created_at,
            updated_at,
        })
    }

    /// Decode the JSON columns
    pub fn decode(&self) -> Result<RedZoneRule, String> {
        let conditions = RuleConditions::from_json(&self.conditions).map_err(|e| e.to_string())?;
        let resolution_conditions: Vec<ResolutionCondition> =
            if self.resolution_conditions.is_null() {
                Vec::new()
            } else {
                serde_json::from_value(self.resolution_conditions.clone())
                    .map_err(|e| format!("Malformed resolution conditions: {}", e))?
            };
        let severity: Severity = self.severity.parse().map_err(|e: redzone_core::CoreError| e.to_string())?;

        Ok(RedZoneRule {
            id: self.id,
            name: self.name.clone(),
            description: self.description.clone(),
            conditions,
            severity,
            auto_resolve: self.auto_resolve,
            resolution_conditions,
            enabled: self.enabled,
            team_lead_approval_required: self.team_lead_approval_required,
            notification_message: self.notification_message.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }

    pub fn into_loaded(self) -> LoadedRule {
        match self.decode() {
            Ok(rule) => LoadedRule::Valid(rule),
            Err(reason) => LoadedRule::Malformed {
                id: self.id,
                name: self.name,
                reason,
            },
        }
    }
}

/// Alert listing filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertFilter {
    #[serde(default)]
    pub customer_id: Option<i64>,
    #[serde(default)]
    pub status: Option<AlertStatus>,
}

impl AlertFilter {
    pub fn for_customer(customer_id: i64) -> Self {
        Self {
            customer_id: Some(customer_id),
            status: None,
        }
    }

    pub fn with_status(mut self, status: AlertStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn matches(&self, alert: &RedZoneAlert) -> bool {
        self.customer_id.map_or(true, |id| alert.customer_id == id)
            && self.status.map_or(true, |status| alert.status == status)
    }
}

/// Point-in-time customer record merged with its per-customer metrics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomerSnapshot {
    pub customer_id: i64,
    pub fields: HashMap<String, Value>,
}

impl CustomerSnapshot {
    /// Empty snapshot; the `id` field is always present
    pub fn new(customer_id: i64) -> Self {
        let mut fields = HashMap::new();
        fields.insert("id".to_string(), Value::Number(customer_id as f64));
        Self { customer_id, fields }
    }

    /// Set a top-level field
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Build from a JSON object; non-object input yields an empty snapshot
    pub fn from_json(customer_id: i64, record: serde_json::Value) -> Self {
        let mut snapshot = Self::new(customer_id);
        snapshot.merge_json(record);
        snapshot
    }

    /// Merge a JSON object's keys into this snapshot, overwriting duplicates
    pub fn merge_json(&mut self, record: serde_json::Value) {
        if let serde_json::Value::Object(map) = record {
            for (key, value) in map {
                self.fields.insert(key, Value::from(value));
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }
}
