//! Integration tests for REST API endpoints
//!
//! Each test builds the router over a fresh in-memory store and drives it with
//! `oneshot` requests.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use redzone_core::{Role, Severity};
use redzone_repository::{CustomerSnapshot, MemoryStore, Repositories};
use redzone_runtime::SweepOptions;
use redzone_server::api::{create_router, AppState};
use redzone_server::catalog::default_customer_catalog;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const ADMIN: i64 = 1;
const LEAD: i64 = 2;
const CSM: i64 = 3;

async fn create_test_app() -> (Arc<MemoryStore>, Router) {
    let store = Arc::new(MemoryStore::new());
    store.put_user(ADMIN, Role::Admin).await;
    store.put_user(LEAD, Role::TeamLead).await;
    store.put_user(CSM, Role::Csm).await;

    let repos = Repositories::from_memory(store.clone());
    let state = AppState::new(repos, default_customer_catalog(), SweepOptions::default());
    (store, create_router(state))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<i64>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header("x-user-id", user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

fn low_nps_rule() -> Value {
    json!({
        "name": "Low NPS",
        "conditions": {
            "logicOperator": "AND",
            "groups": [
                { "logicOperator": "AND", "conditions": [
                    { "field": "nps_score", "operator": "less_than", "value": "6" }
                ]}
            ]
        },
        "severity": "high_risk",
        "notification_message": "Low NPS: {nps_score}"
    })
}

async fn put_nps(store: &MemoryStore, customer_id: i64, nps: f64) {
    store
        .put_customer(CustomerSnapshot::new(customer_id).with_field("nps_score", nps))
        .await;
}

#[tokio::test]
async fn test_health_endpoint() {
    let (_store, app) = create_test_app().await;
    let (status, body) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_available_fields() {
    let (_store, app) = create_test_app().await;
    let (status, body) = send(&app, "GET", "/api/red-zone/available-fields", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nps_score"]["type"], "number");
    assert_eq!(body["campaign_stats"]["type"], "json");
}

#[tokio::test]
async fn test_missing_caller_is_unauthorized() {
    let (_store, app) = create_test_app().await;
    let (status, body) = send(&app, "GET", "/api/red-zone/alerts", None, None).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], 401);

    let (status, _) = send(&app, "GET", "/api/red-zone/rules", Some(999), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_rule_crud_and_permissions() {
    let (_store, app) = create_test_app().await;

    let (status, _) = send(&app, "POST", "/api/red-zone/rules", Some(CSM), Some(low_nps_rule())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, rule) = send(&app, "POST", "/api/red-zone/rules", Some(LEAD), Some(low_nps_rule())).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rule["name"], "Low NPS");
    assert_eq!(rule["enabled"], true);
    let id = rule["id"].as_i64().unwrap();

    let uri = format!("/api/red-zone/rules/{}/enabled", id);
    let (status, _) = send(&app, "PATCH", &uri, Some(LEAD), Some(json!({ "enabled": false }))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let uri = format!("/api/red-zone/rules/{}", id);
    let (status, rule) = send(&app, "GET", &uri, Some(CSM), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(rule["enabled"], false);

    let (status, _) = send(&app, "DELETE", &uri, Some(LEAD), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(&app, "DELETE", &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app, "GET", &uri, Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_rule_validation_errors() {
    let (_store, app) = create_test_app().await;
    let draft = json!({
        "name": "",
        "conditions": { "groups": [
            { "conditions": [
                { "field": "favourite_colour", "operator": "equals", "value": "red" },
                { "field": "mrr", "operator": "greater_than", "value": "lots" }
            ]}
        ]},
        "severity": "critical",
        "auto_resolve": true
    });

    let (status, body) = send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(draft)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"conditions.groups[0].conditions[0].field"));
    assert!(fields.contains(&"conditions.groups[0].conditions[1].value"));
    assert!(fields.contains(&"resolution_conditions"));
}

#[tokio::test]
async fn test_legacy_conditions_are_normalized() {
    let (_store, app) = create_test_app().await;
    let draft = json!({
        "name": "Legacy",
        "conditions": [
            { "field": "nps_score", "operator": "less_than", "value": 6 }
        ],
        "severity": "attention_needed"
    });

    let (status, rule) = send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(draft)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rule["conditions"]["groups"][0]["conditions"][0]["field"], "nps_score");
    assert_eq!(rule["conditions"]["groups"][0]["conditions"][0]["value"], 6);
}

#[tokio::test]
async fn test_unknown_operator_is_a_field_error() {
    let (_store, app) = create_test_app().await;
    let draft = json!({
        "name": "Between",
        "conditions": { "groups": [
            { "conditions": [
                { "field": "nps_score", "operator": "between", "value": "1" }
            ]}
        ]},
        "severity": "critical"
    });

    let (status, body) = send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(draft)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "conditions.groups[0].conditions[0].operator");
    assert!(body["fields"][0]["message"].as_str().unwrap().contains("between"));
    let (_, rules) = send(&app, "GET", "/api/red-zone/rules", Some(ADMIN), None).await;
    assert_eq!(rules, json!([]));

    // Update goes through the same check
    let (_, rule) = send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(low_nps_rule())).await;
    let mut update = low_nps_rule();
    update["resolution_conditions"] = json!([
        { "field_path": "nps_score", "operator": "at_least", "value": "7" }
    ]);
    let uri = format!("/api/red-zone/rules/{}", rule["id"]);
    let (status, body) = send(&app, "PUT", &uri, Some(ADMIN), Some(update)).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["fields"][0]["field"], "resolution_conditions[0].operator");
}

#[tokio::test]
async fn test_malformed_json_returns_400() {
    let (_store, app) = create_test_app().await;
    let request = Request::builder()
        .method("POST")
        .uri("/api/red-zone/rules")
        .header("x-user-id", ADMIN.to_string())
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_and_manual_alert_workflow() {
    let (store, app) = create_test_app().await;
    send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(low_nps_rule())).await;
    put_nps(&store, 42, 4.0).await;

    let (status, report) = send(&app, "POST", "/api/red-zone/customers/42/check", Some(LEAD), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["alerts_created"].as_array().unwrap().len(), 1);

    let (status, _) = send(&app, "POST", "/api/red-zone/customers/42/check", Some(CSM), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, alerts) = send(&app, "GET", "/api/red-zone/alerts?customer_id=42&status=open", Some(CSM), None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["reason"], "Low NPS: 4");
    assert_eq!(alerts[0]["severity"], json!(Severity::HighRisk));
    let id = alerts[0]["id"].as_i64().unwrap();

    let uri = format!("/api/red-zone/alerts/{}/escalate", id);
    let (status, alert) = send(&app, "POST", &uri, Some(CSM), Some(json!({ "escalated_to": LEAD }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["escalated_to"], LEAD);
    assert_eq!(alert["status"], "open");

    let uri = format!("/api/red-zone/alerts/{}/assign", id);
    let (status, alert) = send(&app, "POST", &uri, Some(CSM), Some(json!({ "assigned_to": CSM }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["assigned_to"], CSM);

    let uri = format!("/api/red-zone/alerts/{}/notes", id);
    let (status, alert) = send(&app, "PATCH", &uri, Some(CSM), Some(json!({ "notes": "Called the customer" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["notes"], "Called the customer");

    let uri = format!("/api/red-zone/alerts/{}/resolve", id);
    let (status, alert) = send(&app, "POST", &uri, Some(CSM), Some(json!({ "resolution_summary": "Renewed" }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["status"], "resolved");
    assert_eq!(alert["resolved_by"], CSM);

    // Resolved alerts are immutable
    let (status, body) = send(&app, "POST", &uri, Some(CSM), Some(json!({ "resolution_summary": "Again" }))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], 409);

    let uri = format!("/api/red-zone/alerts/{}/activity", id);
    let (status, log) = send(&app, "GET", &uri, Some(CSM), None).await;
    assert_eq!(status, StatusCode::OK);
    let actions: Vec<&str> = log
        .as_array()
        .unwrap()
        .iter()
        .map(|row| row["action"].as_str().unwrap())
        .collect();
    assert_eq!(actions, vec!["created", "escalated", "assigned", "updated", "resolved"]);
}

#[tokio::test]
async fn test_approval_workflow() {
    let (store, app) = create_test_app().await;
    let mut rule = low_nps_rule();
    rule["auto_resolve"] = json!(true);
    rule["team_lead_approval_required"] = json!(true);
    rule["resolution_conditions"] = json!([
        { "field_path": "nps_score", "operator": "greater_than", "value": "6" }
    ]);
    let (status, _) = send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(rule)).await;
    assert_eq!(status, StatusCode::CREATED);

    put_nps(&store, 7, 3.0).await;
    send(&app, "POST", "/api/red-zone/customers/7/check", Some(ADMIN), None).await;
    put_nps(&store, 7, 9.0).await;
    let (_, report) = send(&app, "POST", "/api/red-zone/customers/7/check", Some(ADMIN), None).await;
    let pending = report["alerts_pending_approval"].as_array().unwrap();
    assert_eq!(pending.len(), 1);
    let id = pending[0].as_i64().unwrap();

    let uri = format!("/api/red-zone/alerts/{}/approve", id);
    let (status, _) = send(&app, "POST", &uri, Some(CSM), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, alert) = send(&app, "POST", &uri, Some(LEAD), Some(json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["status"], "resolved");
    assert_eq!(alert["resolved_by"], LEAD);
}

#[tokio::test]
async fn test_unknown_alert_returns_404() {
    let (_store, app) = create_test_app().await;
    let (status, _) = send(&app, "GET", "/api/red-zone/alerts/12345", Some(CSM), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        "POST",
        "/api/red-zone/alerts/12345/escalate",
        Some(CSM),
        Some(json!({ "escalated_to": LEAD })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sweep_endpoint() {
    let (store, app) = create_test_app().await;
    send(&app, "POST", "/api/red-zone/rules", Some(ADMIN), Some(low_nps_rule())).await;
    for id in 1..=5 {
        put_nps(&store, id, if id <= 2 { 1.0 } else { 9.0 }).await;
    }

    let (status, _) = send(&app, "POST", "/api/red-zone/sweep", Some(CSM), Some(json!({}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, report) = send(&app, "POST", "/api/red-zone/sweep", Some(LEAD), Some(json!({ "page_size": 2 }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["customers_processed"], 5);
    assert_eq!(report["alerts_created"], 2);
    assert_eq!(report["checkpoint"], 5);
    assert_eq!(report["cancelled"], false);
    assert!(report["started_at"].is_string());
}
