//! Unit tests for the in-memory store
//!
//! Exercises the store-level invariants the rule engine relies on.

use redzone_core::*;
use redzone_repository::*;
use serde_json::json;
use std::sync::Arc;

fn new_alert(customer_id: i64, rule_id: i64) -> NewAlert {
    NewAlert {
        customer_id,
        rule_id: Some(rule_id),
        reason: "Red zone rule \"Low NPS\" triggered".to_string(),
        severity: Severity::HighRisk,
        details: json!({ "nps_score": 4 }),
    }
}

fn created_log() -> NewActivityLog {
    NewActivityLog::new(ActivityAction::Created, Actor::System, json!({}))
}

// =============================================================================
// Open-alert uniqueness
// =============================================================================

#[tokio::test]
async fn test_concurrent_creates_yield_one_open_alert() {
    let store = Arc::new(MemoryStore::new());

    let mut handles = Vec::new();
    for _ in 0..16 {
        let store = store.clone();
        handles.push(tokio::spawn(async move {
            store.create_open_alert(new_alert(42, 1), created_log()).await
        }));
    }

    let mut created = 0;
    let mut conflicts = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(e) if e.is_conflict() => conflicts += 1,
            Err(e) => panic!("unexpected error: {}", e),
        }
    }

    assert_eq!(created, 1);
    assert_eq!(conflicts, 15);
    let open = store
        .list_alerts(&AlertFilter::for_customer(42).with_status(AlertStatus::Open))
        .await
        .unwrap();
    assert_eq!(open.len(), 1);
    assert_eq!(store.activity_count().await, 1);
}

#[tokio::test]
async fn test_new_open_alert_allowed_after_resolution() {
    let store = MemoryStore::new();
    let alert = store.create_open_alert(new_alert(42, 1), created_log()).await.unwrap();

    let resolve = AlertChange::Resolve {
        by: Actor::System,
        at: chrono::Utc::now(),
        summary: None,
    };
    store
        .apply_transition(
            alert.id,
            AlertStatus::Open,
            &resolve,
            NewActivityLog::new(ActivityAction::Resolved, Actor::System, json!({})),
        )
        .await
        .unwrap();

    assert!(store.find_open_alert(42, 1).await.unwrap().is_none());
    store.create_open_alert(new_alert(42, 1), created_log()).await.unwrap();
    assert!(store.find_open_alert(42, 1).await.unwrap().is_some());
}

#[tokio::test]
async fn test_unresolved_includes_pending_approval() {
    let store = MemoryStore::new();
    let alert = store.create_open_alert(new_alert(42, 1), created_log()).await.unwrap();

    store
        .apply_transition(
            alert.id,
            AlertStatus::Open,
            &AlertChange::RequestApproval,
            NewActivityLog::new(ActivityAction::Updated, Actor::System, json!({})),
        )
        .await
        .unwrap();

    let unresolved = store.list_unresolved_alerts(42, 1).await.unwrap();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].status, AlertStatus::PendingApproval);
    assert!(store.find_open_alert(42, 1).await.unwrap().is_none());
}

// =============================================================================
// Rules
// =============================================================================

#[tokio::test]
async fn test_malformed_rule_is_listed_not_fatal() {
    let store = MemoryStore::new();
    let good = store
        .insert_raw_rule(
            "Low NPS",
            json!([{ "field": "nps_score", "operator": "less_than", "value": "6" }]),
            Severity::HighRisk,
            true,
        )
        .await;
    let bad = store
        .insert_raw_rule("Broken", json!("not conditions"), Severity::Critical, true)
        .await;
    store
        .insert_raw_rule("Disabled", json!([]), Severity::Critical, false)
        .await;

    let rules = store.list_enabled_rules().await.unwrap();
    assert_eq!(rules.len(), 2);
    assert_eq!(rules[0].id(), good);
    assert!(rules[0].as_valid().is_some());
    assert_eq!(rules[1].id(), bad);
    assert!(matches!(rules[1], LoadedRule::Malformed { .. }));

    let err = store.get_rule(bad).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Malformed { .. }));
}

#[tokio::test]
async fn test_users_and_snapshots() {
    let store = MemoryStore::new();
    store.put_user(1, Role::TeamLead).await;
    store
        .put_customer(CustomerSnapshot::new(42).with_field("nps_score", 4.0))
        .await;

    assert_eq!(store.role_of(1).await.unwrap(), Some(Role::TeamLead));
    assert_eq!(store.role_of(2).await.unwrap(), None);

    let snapshot = store.load_snapshot(42).await.unwrap();
    assert_eq!(snapshot.get("nps_score"), Some(&Value::Number(4.0)));
    assert!(store.load_snapshot(7).await.unwrap_err().is_not_found());
}
