//! API endpoint handlers
//!
//! HTTP request handlers for all REST API endpoints.

use super::extractors::{Caller, JsonExtractor};
use super::types::*;
use crate::error::ServerError;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use redzone_core::{
    FieldCatalog, Permission, RedZoneActivityLog, RedZoneAlert, RedZoneRule, RuleDraft,
    RuleValidator,
};
use redzone_repository::{AlertFilter, LoadedRule};
use redzone_runtime::PassReport;
use tracing::info;

type ApiResult<T> = Result<T, ServerError>;

async fn require(state: &AppState, caller: Caller, permission: Permission) -> ApiResult<()> {
    state.guard().require(caller.0, permission).await?;
    Ok(())
}

/// Decode a rule body, validate it against the catalog and normalize legacy
/// conditions. Unknown operators are reported per field before decoding.
fn prepare_draft(state: &AppState, body: serde_json::Value) -> ApiResult<RuleDraft> {
    RuleValidator::check_operators(&body)?;
    let draft: RuleDraft = serde_json::from_value(body)
        .map_err(|e| ServerError::InvalidRequest(format!("Invalid JSON data: {}", e)))?;
    state.validator.validate(&draft)?;
    Ok(draft.normalized())
}

/// Health check endpoint
pub(super) async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Field paths rule conditions may reference
pub(super) async fn available_fields(State(state): State<AppState>) -> Json<FieldCatalog> {
    Json(state.catalog().clone())
}

// =============================================================================
// Rules
// =============================================================================

pub(super) async fn list_rules(
    State(state): State<AppState>,
    caller: Caller,
) -> ApiResult<Json<Vec<LoadedRule>>> {
    require(&state, caller, Permission::ViewAlerts).await?;
    Ok(Json(state.repos.rules.list_rules().await?))
}

pub(super) async fn get_rule(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<RedZoneRule>> {
    require(&state, caller, Permission::ViewAlerts).await?;
    Ok(Json(state.repos.rules.get_rule(id).await?))
}

pub(super) async fn create_rule(
    State(state): State<AppState>,
    caller: Caller,
    JsonExtractor(body): JsonExtractor<serde_json::Value>,
) -> ApiResult<(StatusCode, Json<RedZoneRule>)> {
    require(&state, caller, Permission::ManageRules).await?;
    let draft = prepare_draft(&state, body)?;
    let rule = state.repos.rules.create_rule(&draft).await?;
    info!(rule_id = rule.id, user_id = caller.0, "Red zone rule created");
    Ok((StatusCode::CREATED, Json(rule)))
}

pub(super) async fn update_rule(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<serde_json::Value>,
) -> ApiResult<Json<RedZoneRule>> {
    require(&state, caller, Permission::ManageRules).await?;
    let draft = prepare_draft(&state, body)?;
    let rule = state.repos.rules.update_rule(id, &draft).await?;
    info!(rule_id = id, user_id = caller.0, "Red zone rule updated");
    Ok(Json(rule))
}

pub(super) async fn set_rule_enabled(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<SetEnabledRequest>,
) -> ApiResult<StatusCode> {
    require(&state, caller, Permission::ManageRules).await?;
    state.repos.rules.set_rule_enabled(id, body.enabled).await?;
    info!(rule_id = id, enabled = body.enabled, "Red zone rule toggled");
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn delete_rule(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    require(&state, caller, Permission::DeleteRules).await?;
    state.repos.rules.delete_rule(id).await?;
    info!(rule_id = id, user_id = caller.0, "Red zone rule deleted");
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Alerts
// =============================================================================

pub(super) async fn list_alerts(
    State(state): State<AppState>,
    caller: Caller,
    Query(filter): Query<AlertFilter>,
) -> ApiResult<Json<Vec<RedZoneAlert>>> {
    require(&state, caller, Permission::ViewAlerts).await?;
    Ok(Json(state.repos.alerts.list_alerts(&filter).await?))
}

pub(super) async fn get_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<RedZoneAlert>> {
    require(&state, caller, Permission::ViewAlerts).await?;
    Ok(Json(state.repos.alerts.get_alert(id).await?))
}

pub(super) async fn list_activity(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<RedZoneActivityLog>>> {
    require(&state, caller, Permission::ViewAlerts).await?;
    state.repos.alerts.get_alert(id).await?;
    Ok(Json(state.repos.alerts.list_activity(id).await?))
}

pub(super) async fn escalate_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<EscalateRequest>,
) -> ApiResult<Json<RedZoneAlert>> {
    let alert = state.lifecycle().escalate(id, caller.0, body.escalated_to).await?;
    Ok(Json(alert))
}

pub(super) async fn resolve_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<ResolveRequest>,
) -> ApiResult<Json<RedZoneAlert>> {
    if body.resolution_summary.trim().is_empty() {
        return Err(ServerError::InvalidRequest(
            "resolution_summary must not be empty".to_string(),
        ));
    }
    let alert = state
        .lifecycle()
        .resolve_manually(id, caller.0, body.resolution_summary)
        .await?;
    Ok(Json(alert))
}

pub(super) async fn approve_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<ApproveRequest>,
) -> ApiResult<Json<RedZoneAlert>> {
    let alert = state
        .lifecycle()
        .approve_resolution(id, caller.0, body.resolution_summary)
        .await?;
    Ok(Json(alert))
}

pub(super) async fn assign_alert(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<AssignRequest>,
) -> ApiResult<Json<RedZoneAlert>> {
    let alert = state.lifecycle().assign(id, caller.0, body.assigned_to).await?;
    Ok(Json(alert))
}

pub(super) async fn update_notes(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<i64>,
    JsonExtractor(body): JsonExtractor<NotesRequest>,
) -> ApiResult<Json<RedZoneAlert>> {
    let alert = state.lifecycle().update_notes(id, caller.0, body.notes).await?;
    Ok(Json(alert))
}

// =============================================================================
// Evaluation
// =============================================================================

/// Re-evaluate one customer now
pub(super) async fn check_customer(
    State(state): State<AppState>,
    caller: Caller,
    Path(customer_id): Path<i64>,
) -> ApiResult<Json<PassReport>> {
    require(&state, caller, Permission::RunSweep).await?;
    let report = state.sweeper.check_customer(customer_id).await?;
    Ok(Json(report))
}

/// Run a sweep to completion and return its report
pub(super) async fn run_sweep(
    State(state): State<AppState>,
    caller: Caller,
    JsonExtractor(body): JsonExtractor<SweepRequest>,
) -> ApiResult<Json<SweepResponse>> {
    require(&state, caller, Permission::RunSweep).await?;
    let options = body.apply(&state.sweep_options);

    info!(user_id = caller.0, resume_after = ?options.resume_after, "Manual sweep requested");
    let started_at = Utc::now();
    let report = state.sweeper.run_to_completion(&options).await?;

    Ok(Json(SweepResponse {
        started_at,
        finished_at: Utc::now(),
        report,
    }))
}
