//! REST API type definitions
//!
//! Application state plus request and response bodies. Domain types
//! (`RuleDraft`, `RedZoneAlert`, `PassReport`, ...) are serialized as-is.

use chrono::{DateTime, Utc};
use redzone_core::{FieldCatalog, RuleValidator};
use redzone_repository::Repositories;
use redzone_runtime::{AlertLifecycleManager, PermissionGuard, SweepOptions, SweepReport, Sweeper};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub sweeper: Sweeper,
    pub validator: Arc<RuleValidator>,
    /// Defaults for `POST /sweep`
    pub sweep_options: SweepOptions,
}

impl AppState {
    pub fn new(repos: Repositories, catalog: FieldCatalog, sweep_options: SweepOptions) -> Self {
        let catalog = Arc::new(catalog);
        let sweeper = redzone_runtime::build_sweeper(&repos, Some(catalog.clone()));
        Self {
            repos,
            sweeper,
            validator: Arc::new(RuleValidator::new(catalog.as_ref().clone())),
            sweep_options,
        }
    }

    pub fn lifecycle(&self) -> &AlertLifecycleManager {
        self.sweeper.engine().lifecycle()
    }

    pub fn guard(&self) -> &PermissionGuard {
        self.lifecycle().guard()
    }

    pub fn catalog(&self) -> &FieldCatalog {
        self.validator.catalog()
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// `PATCH /rules/:id/enabled`
#[derive(Debug, Deserialize)]
pub struct SetEnabledRequest {
    pub enabled: bool,
}

/// `POST /alerts/:id/escalate`
#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub escalated_to: i64,
}

/// `POST /alerts/:id/resolve`
#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub resolution_summary: String,
}

/// `POST /alerts/:id/approve`
#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    #[serde(default)]
    pub resolution_summary: Option<String>,
}

/// `POST /alerts/:id/assign`
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub assigned_to: i64,
}

/// `PATCH /alerts/:id/notes`
#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: String,
}

/// `POST /sweep`; unset fields fall back to the server's sweep settings
#[derive(Debug, Default, Deserialize)]
pub struct SweepRequest {
    #[serde(default)]
    pub resume_after: Option<i64>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub concurrency: Option<usize>,
}

impl SweepRequest {
    pub fn apply(&self, defaults: &SweepOptions) -> SweepOptions {
        SweepOptions {
            page_size: self.page_size.unwrap_or(defaults.page_size),
            concurrency: self.concurrency.unwrap_or(defaults.concurrency),
            resume_after: self.resume_after,
        }
    }
}

/// Sweep result with timing
#[derive(Debug, Serialize)]
pub struct SweepResponse {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(flatten)]
    pub report: SweepReport,
}
