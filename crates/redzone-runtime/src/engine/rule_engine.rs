//! Rule Engine: one customer snapshot against a rule set

use super::evaluator::{evaluate_conditions, evaluate_resolution, trigger_details};
use crate::context::alert_reason;
use crate::error::{LifecycleError, Result, RuntimeError};
use crate::lifecycle::AlertLifecycleManager;
use crate::result::{PassReport, RuleFailure};
use redzone_core::{AlertStatus, FieldCatalog, NewAlert, RedZoneRule};
use redzone_repository::{
    AlertRepository, CustomerSnapshot, LoadedRule, RepositoryResult, RuleRepository,
};
use std::sync::Arc;

/// A rule row that could not be decoded when the set was loaded
#[derive(Debug, Clone, PartialEq)]
pub struct MalformedRule {
    pub id: i64,
    pub name: String,
    pub reason: String,
}

/// Enabled rules captured once, in ascending id order.
///
/// A sweep holds one `RuleSet` for its whole run, so rule edits made while it
/// is in flight apply from the next sweep on.
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    rules: Vec<RedZoneRule>,
    malformed: Vec<MalformedRule>,
}

impl RuleSet {
    /// Build from loaded rows; disabled rules are dropped
    pub fn from_loaded(loaded: Vec<LoadedRule>) -> Self {
        let mut set = RuleSet::default();
        for entry in loaded {
            match entry {
                LoadedRule::Valid(rule) if rule.enabled => set.rules.push(rule),
                LoadedRule::Valid(_) => {}
                LoadedRule::Malformed { id, name, reason } => {
                    tracing::error!(rule_id = id, rule_name = %name, "Malformed red zone rule: {}", reason);
                    set.malformed.push(MalformedRule { id, name, reason });
                }
            }
        }
        set.rules.sort_by_key(|r| r.id);
        set.malformed.sort_by_key(|r| r.id);
        set
    }

    /// Snapshot the store's enabled rules
    pub async fn load(rules: &dyn RuleRepository) -> RepositoryResult<Self> {
        let loaded = rules.list_enabled_rules().await?;
        Ok(Self::from_loaded(loaded))
    }

    pub fn rules(&self) -> &[RedZoneRule] {
        &self.rules
    }

    pub fn malformed(&self) -> &[MalformedRule] {
        &self.malformed
    }

    /// Valid and malformed rules together
    pub fn len(&self) -> usize {
        self.rules.len() + self.malformed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Evaluates rules for a customer and drives alert creation and auto-resolution
#[derive(Clone)]
pub struct RuleEngine {
    alerts: Arc<dyn AlertRepository>,
    lifecycle: AlertLifecycleManager,
    catalog: Option<Arc<FieldCatalog>>,
}

impl RuleEngine {
    pub fn new(alerts: Arc<dyn AlertRepository>, lifecycle: AlertLifecycleManager) -> Self {
        Self {
            alerts,
            lifecycle,
            catalog: None,
        }
    }

    /// Reject, per rule and at evaluation time, fields the catalog no longer lists
    pub fn with_catalog(mut self, catalog: Arc<FieldCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn lifecycle(&self) -> &AlertLifecycleManager {
        &self.lifecycle
    }

    /// Run one pass for `snapshot`.
    ///
    /// Rules are isolated: a failing rule is logged, recorded in the report
    /// and skipped, and the remaining rules still run.
    pub async fn evaluate_customer(&self, rules: &RuleSet, snapshot: &CustomerSnapshot) -> PassReport {
        let customer_id = snapshot.customer_id;
        let mut report = PassReport::new(customer_id);

        for malformed in rules.malformed() {
            report.failures.push(RuleFailure {
                rule_id: malformed.id,
                rule_name: malformed.name.clone(),
                customer_id,
                reason: RuntimeError::MalformedRule {
                    rule_id: malformed.id,
                    reason: malformed.reason.clone(),
                }
                .to_string(),
            });
        }

        for rule in rules.rules() {
            report.rules_evaluated += 1;
            if let Err(e) = self.process_rule(rule, snapshot, &mut report).await {
                tracing::error!(
                    rule_id = rule.id,
                    customer_id,
                    "Red zone rule evaluation failed: {}",
                    e
                );
                report.failures.push(RuleFailure {
                    rule_id: rule.id,
                    rule_name: rule.name.clone(),
                    customer_id,
                    reason: e.to_string(),
                });
            }
        }

        tracing::debug!(
            customer_id,
            evaluated = report.rules_evaluated,
            matched = report.rules_matched,
            created = report.alerts_created.len(),
            resolved = report.alerts_resolved.len(),
            pending = report.alerts_pending_approval.len(),
            failures = report.failures.len(),
            "Red zone pass complete"
        );
        report
    }

    async fn process_rule(
        &self,
        rule: &RedZoneRule,
        snapshot: &CustomerSnapshot,
        report: &mut PassReport,
    ) -> Result<()> {
        self.check_catalog(rule)?;

        let customer_id = snapshot.customer_id;
        let mut created_id = None;

        if evaluate_conditions(&rule.conditions, snapshot) {
            report.rules_matched += 1;
            // A non-matching rule never closes its open alert; only the
            // resolution path below or a manual action does.
            if self.alerts.find_open_alert(customer_id, rule.id).await?.is_none() {
                let alert = NewAlert {
                    customer_id,
                    rule_id: Some(rule.id),
                    reason: alert_reason(&rule.name, rule.notification_message.as_deref(), snapshot),
                    severity: rule.severity,
                    details: trigger_details(&rule.conditions, snapshot),
                };
                match self.lifecycle.open(alert).await {
                    Ok(created) => {
                        created_id = Some(created.id);
                        report.alerts_created.push(created.id);
                    }
                    Err(LifecycleError::Conflict(msg)) => {
                        tracing::debug!(rule_id = rule.id, customer_id, "Open alert already exists: {}", msg);
                    }
                    Err(e) => return Err(e.into()),
                }
            }
        }

        if rule.auto_resolution_enabled() {
            self.try_auto_resolve(rule, snapshot, created_id, report).await?;
        } else if rule.auto_resolve {
            tracing::debug!(rule_id = rule.id, "auto_resolve set without resolution conditions; skipping");
        }

        Ok(())
    }

    async fn try_auto_resolve(
        &self,
        rule: &RedZoneRule,
        snapshot: &CustomerSnapshot,
        created_this_pass: Option<i64>,
        report: &mut PassReport,
    ) -> Result<()> {
        if !evaluate_resolution(&rule.resolution_conditions, snapshot) {
            return Ok(());
        }

        let alerts = self
            .alerts
            .list_unresolved_alerts(snapshot.customer_id, rule.id)
            .await?;

        for alert in alerts {
            if Some(alert.id) == created_this_pass {
                continue;
            }

            let outcome = if rule.team_lead_approval_required {
                if alert.status != AlertStatus::Open {
                    continue;
                }
                self.lifecycle
                    .request_approval(&alert)
                    .await
                    .map(|a| report.alerts_pending_approval.push(a.id))
            } else {
                let summary = format!("Resolution conditions met for rule \"{}\"", rule.name);
                self.lifecycle
                    .auto_resolve(&alert, summary)
                    .await
                    .map(|a| report.alerts_resolved.push(a.id))
            };

            match outcome {
                Ok(()) => {}
                Err(LifecycleError::Conflict(msg)) => {
                    tracing::debug!(alert_id = alert.id, "Alert changed concurrently: {}", msg);
                }
                Err(e) => return Err(e.into()),
            }
        }

        Ok(())
    }

    fn check_catalog(&self, rule: &RedZoneRule) -> Result<()> {
        if let Some(catalog) = &self.catalog {
            if let Some(field) = rule.referenced_fields().into_iter().find(|f| !catalog.allows(f)) {
                return Err(RuntimeError::UnknownField {
                    rule_id: rule.id,
                    field,
                });
            }
        }
        Ok(())
    }
}
