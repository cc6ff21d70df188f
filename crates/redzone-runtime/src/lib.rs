//! Red Zone Runtime - rule evaluation and alert lifecycle
//!
//! Given a customer snapshot, the [`RuleEngine`] evaluates every enabled rule,
//! opens alerts for matches and applies auto-resolution. The [`Sweeper`] runs
//! the engine across all customers. The [`AlertLifecycleManager`] owns every
//! alert state transition and its audit row.
//!
//! ```text
//! CustomerSnapshot ─► Field Resolver ─► Condition Evaluator
//!                                          │
//!                        Group / Tree Evaluator
//!                                          │
//!                     RuleEngine ──► AlertLifecycleManager ──► AlertRepository
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod result;

// Re-export main types
pub use context::{alert_reason, render_message, resolve, Resolved};
pub use engine::{
    evaluate_condition, evaluate_conditions, evaluate_group, evaluate_resolution, evaluate_tree,
    MalformedRule, RuleEngine, RuleSet, SweepOptions, Sweeper,
};
pub use error::{LifecycleError, LifecycleResult, Result, RuntimeError};
pub use lifecycle::{AlertLifecycleManager, PermissionGuard};
pub use result::{CustomerFailure, PassReport, RuleFailure, SweepReport};

use redzone_core::FieldCatalog;
use redzone_repository::Repositories;
use std::sync::Arc;

/// Wire the lifecycle manager, rule engine and sweeper over one set of stores
pub fn build_sweeper(repos: &Repositories, catalog: Option<Arc<FieldCatalog>>) -> Sweeper {
    let lifecycle = AlertLifecycleManager::new(repos.alerts.clone(), PermissionGuard::new(repos.users.clone()));
    let mut engine = RuleEngine::new(repos.alerts.clone(), lifecycle);
    if let Some(catalog) = catalog {
        engine = engine.with_catalog(catalog);
    }
    Sweeper::new(repos.rules.clone(), repos.customers.clone(), Arc::new(engine))
}
