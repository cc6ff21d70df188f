//! In-process interval sweep

use crate::config::SweepConfig;
use redzone_runtime::Sweeper;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Spawn a task that sweeps every `interval_secs` until `shutdown` turns true.
///
/// Sweeps never overlap. A sweep cut short by shutdown or by `timeout_secs`
/// keeps its checkpoint and the next tick resumes from it.
pub fn spawn_sweep_scheduler(
    sweeper: Sweeper,
    config: SweepConfig,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        let timeout = Duration::from_secs(config.timeout_secs.max(1));
        let mut resume_after: Option<i64> = None;

        info!(
            interval_secs = config.interval_secs,
            timeout_secs = config.timeout_secs,
            "Sweep scheduler started"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            let options = config.options().resume_after(resume_after);
            let (stop_tx, stop_rx) = watch::channel(false);
            let run = sweeper.run(&options, stop_rx);
            tokio::pin!(run);

            let outcome = tokio::select! {
                result = &mut run => Some(result),
                _ = tokio::time::sleep(timeout) => None,
                _ = shutdown.changed() => None,
            };

            // Let an interrupted sweep finish its current page so the
            // checkpoint is exact.
            let outcome = match outcome {
                Some(result) => result,
                None => {
                    let _ = stop_tx.send(true);
                    run.await
                }
            };

            match outcome {
                Ok(report) if report.is_partial() => {
                    warn!(
                        checkpoint = ?report.checkpoint,
                        page_failure = ?report.page_failure,
                        "Sweep interrupted; will resume"
                    );
                    resume_after = report.checkpoint;
                }
                Ok(report) => {
                    info!(
                        customers = report.customers_processed,
                        created = report.alerts_created,
                        resolved = report.alerts_resolved,
                        "Scheduled sweep complete"
                    );
                    resume_after = None;
                }
                Err(e) => error!("Scheduled sweep failed: {}", e),
            }

            if *shutdown.borrow() {
                break;
            }
        }

        info!("Sweep scheduler stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use redzone_core::*;
    use redzone_repository::{
        AlertFilter, AlertRepository, CustomerSnapshot, MemoryStore, Repositories, RuleRepository,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn test_scheduler_runs_and_stops() {
        let store = Arc::new(MemoryStore::new());
        store
            .create_rule(&RuleDraft::new(
                "Low NPS",
                ConditionTree::single(vec![Condition::new(
                    "nps_score",
                    ConditionOperator::LessThan,
                    "6",
                )]),
                Severity::HighRisk,
            ))
            .await
            .unwrap();
        store
            .put_customer(CustomerSnapshot::new(1).with_field("nps_score", 2.0))
            .await;

        let repos = Repositories::from_memory(store.clone());
        let sweeper = redzone_runtime::build_sweeper(&repos, None);
        let (tx, rx) = watch::channel(false);
        let handle = spawn_sweep_scheduler(sweeper, SweepConfig::default(), rx);

        // The first tick fires immediately
        let mut created = false;
        for _ in 0..50 {
            let alerts = store.list_alerts(&AlertFilter::for_customer(1)).await.unwrap();
            if !alerts.is_empty() {
                created = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(created);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
