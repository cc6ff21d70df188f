//! Pass and sweep reports

use serde::Serialize;

/// A rule that could not be evaluated for a customer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RuleFailure {
    pub rule_id: i64,
    pub rule_name: String,
    pub customer_id: i64,
    pub reason: String,
}

/// Outcome of evaluating one customer against a rule set
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PassReport {
    pub customer_id: i64,
    pub rules_evaluated: usize,
    pub rules_matched: usize,
    /// Ids of alerts created in this pass
    pub alerts_created: Vec<i64>,
    /// Ids of alerts resolved automatically in this pass
    pub alerts_resolved: Vec<i64>,
    /// Ids of alerts moved to `pending_approval` in this pass
    pub alerts_pending_approval: Vec<i64>,
    pub failures: Vec<RuleFailure>,
}

impl PassReport {
    pub fn new(customer_id: i64) -> Self {
        Self {
            customer_id,
            ..Default::default()
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// A customer whose snapshot could not be loaded during a sweep
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerFailure {
    pub customer_id: i64,
    pub reason: String,
}

/// Aggregate outcome of a sweep
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SweepReport {
    pub rules_loaded: usize,
    pub customers_processed: usize,
    pub alerts_created: usize,
    pub alerts_resolved: usize,
    pub alerts_pending_approval: usize,
    pub rule_failures: Vec<RuleFailure>,
    pub customer_failures: Vec<CustomerFailure>,
    /// Highest customer id of the last fully processed page; pass as
    /// `resume_after` to continue an interrupted sweep
    pub checkpoint: Option<i64>,
    /// The sweep stopped early on a shutdown signal
    pub cancelled: bool,
    /// Listing the next page of customers failed; the sweep stopped there
    /// and `checkpoint` marks where to resume
    pub page_failure: Option<String>,
}

impl SweepReport {
    /// The sweep stopped before reaching the last customer
    pub fn is_partial(&self) -> bool {
        self.cancelled || self.page_failure.is_some()
    }
}

impl SweepReport {
    /// Fold a single customer's pass into the totals
    pub fn absorb(&mut self, pass: PassReport) {
        self.customers_processed += 1;
        self.alerts_created += pass.alerts_created.len();
        self.alerts_resolved += pass.alerts_resolved.len();
        self.alerts_pending_approval += pass.alerts_pending_approval.len();
        self.rule_failures.extend(pass.failures);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absorb() {
        let mut sweep = SweepReport::default();
        let mut pass = PassReport::new(42);
        pass.alerts_created = vec![1, 2];
        pass.alerts_resolved = vec![3];
        pass.failures.push(RuleFailure {
            rule_id: 9,
            rule_name: "Broken".to_string(),
            customer_id: 42,
            reason: "bad json".to_string(),
        });
        assert!(pass.has_failures());

        sweep.absorb(pass);
        sweep.absorb(PassReport::new(43));

        assert_eq!(sweep.customers_processed, 2);
        assert_eq!(sweep.alerts_created, 2);
        assert_eq!(sweep.alerts_resolved, 1);
        assert_eq!(sweep.rule_failures.len(), 1);
    }
}
