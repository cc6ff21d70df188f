//! Sweeper: a checkpointable batch pass over many customers

use super::rule_engine::{RuleEngine, RuleSet};
use crate::error::Result;
use crate::result::{CustomerFailure, PassReport, SweepReport};
use futures::stream::{self, StreamExt};
use redzone_repository::{CustomerSnapshotSource, RepositoryResult, RuleRepository};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Sweep tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepOptions {
    /// Customers fetched per page; the shutdown signal is checked between pages
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// Customer passes run concurrently within a page
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Start after this customer id (a previous report's `checkpoint`)
    #[serde(default)]
    pub resume_after: Option<i64>,
}

fn default_page_size() -> usize {
    100
}

fn default_concurrency() -> usize {
    4
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            concurrency: default_concurrency(),
            resume_after: None,
        }
    }
}

impl SweepOptions {
    pub fn resume_after(mut self, customer_id: Option<i64>) -> Self {
        self.resume_after = customer_id;
        self
    }
}

/// Runs the rule engine over customers
#[derive(Clone)]
pub struct Sweeper {
    rules: Arc<dyn RuleRepository>,
    customers: Arc<dyn CustomerSnapshotSource>,
    engine: Arc<RuleEngine>,
}

impl Sweeper {
    pub fn new(
        rules: Arc<dyn RuleRepository>,
        customers: Arc<dyn CustomerSnapshotSource>,
        engine: Arc<RuleEngine>,
    ) -> Self {
        Self {
            rules,
            customers,
            engine,
        }
    }

    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Re-check one customer now against the current enabled rules
    pub async fn check_customer(&self, customer_id: i64) -> Result<PassReport> {
        let rules = RuleSet::load(self.rules.as_ref()).await?;
        let snapshot = self.customers.load_snapshot(customer_id).await?;
        Ok(self.engine.evaluate_customer(&rules, &snapshot).await)
    }

    /// Sweep all customers in ascending id order.
    ///
    /// The rule set is read once at the start. Setting `shutdown` to `true`
    /// stops the sweep at the next page boundary; the report's `checkpoint`
    /// then marks where to resume. A customer whose snapshot cannot be loaded
    /// is recorded and skipped. A failure listing the next page ends the sweep
    /// with `page_failure` set; the partial report is still returned.
    pub async fn run(&self, options: &SweepOptions, shutdown: watch::Receiver<bool>) -> Result<SweepReport> {
        let page_size = options.page_size.max(1);
        let concurrency = options.concurrency.max(1);

        let rules = RuleSet::load(self.rules.as_ref()).await?;
        let mut report = SweepReport {
            rules_loaded: rules.len(),
            checkpoint: options.resume_after,
            ..Default::default()
        };
        tracing::info!(
            rules = rules.len(),
            resume_after = ?options.resume_after,
            "Red zone sweep started"
        );

        let mut cursor = options.resume_after;
        loop {
            if *shutdown.borrow() {
                report.cancelled = true;
                tracing::info!(checkpoint = ?report.checkpoint, "Red zone sweep cancelled");
                break;
            }

            let ids = match self.customers.list_customer_ids(cursor, page_size).await {
                Ok(ids) => ids,
                Err(e) => {
                    tracing::warn!(
                        checkpoint = ?report.checkpoint,
                        "Red zone sweep stopped, customer listing failed: {}",
                        e
                    );
                    report.page_failure = Some(e.to_string());
                    break;
                }
            };
            let Some(&last) = ids.last() else {
                break;
            };
            let page_len = ids.len();

            let rules = &rules;
            let results: Vec<(i64, RepositoryResult<PassReport>)> = stream::iter(ids)
                .map(|customer_id| async move {
                    (customer_id, self.evaluate_one(rules, customer_id).await)
                })
                .buffer_unordered(concurrency)
                .collect()
                .await;

            for (customer_id, result) in results {
                match result {
                    Ok(pass) => report.absorb(pass),
                    Err(e) => {
                        tracing::warn!(customer_id, "Skipping customer: {}", e);
                        report.customer_failures.push(CustomerFailure {
                            customer_id,
                            reason: e.to_string(),
                        });
                    }
                }
            }

            cursor = Some(last);
            report.checkpoint = cursor;

            if page_len < page_size {
                break;
            }
        }

        tracing::info!(
            customers = report.customers_processed,
            created = report.alerts_created,
            resolved = report.alerts_resolved,
            pending = report.alerts_pending_approval,
            rule_failures = report.rule_failures.len(),
            customer_failures = report.customer_failures.len(),
            "Red zone sweep finished"
        );
        Ok(report)
    }

    /// Run without an external shutdown signal
    pub async fn run_to_completion(&self, options: &SweepOptions) -> Result<SweepReport> {
        let (_tx, rx) = watch::channel(false);
        self.run(options, rx).await
    }

    async fn evaluate_one(&self, rules: &RuleSet, customer_id: i64) -> RepositoryResult<PassReport> {
        let snapshot = self.customers.load_snapshot(customer_id).await?;
        Ok(self.engine.evaluate_customer(rules, &snapshot).await)
    }
}
