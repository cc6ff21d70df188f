//! Router creation and configuration

use super::handlers::*;
use super::types::AppState;
use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create REST API router
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/available-fields", get(available_fields))
        .route("/rules", get(list_rules).post(create_rule))
        .route(
            "/rules/:id",
            get(get_rule).put(update_rule).delete(delete_rule),
        )
        .route("/rules/:id/enabled", patch(set_rule_enabled))
        .route("/alerts", get(list_alerts))
        .route("/alerts/:id", get(get_alert))
        .route("/alerts/:id/activity", get(list_activity))
        .route("/alerts/:id/escalate", post(escalate_alert))
        .route("/alerts/:id/resolve", post(resolve_alert))
        .route("/alerts/:id/approve", post(approve_alert))
        .route("/alerts/:id/assign", post(assign_alert))
        .route("/alerts/:id/notes", patch(update_notes))
        .route("/customers/:id/check", post(check_customer))
        .route("/sweep", post(run_sweep));

    Router::new()
        .route("/health", get(health))
        .nest("/api/red-zone", api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
