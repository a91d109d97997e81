use std::{future::Future, time::Duration};

use food_order_engine::{
    events::EventProducers,
    LifecycleApiError,
    LifecycleTask,
    OrderLifecycleApi,
    PassReport,
    SqliteDatabase,
};
use log::*;
use tokio::{sync::watch, task::JoinHandle, time::sleep};

use crate::config::WorkerConfig;

/// Starts the worker for a single lifecycle task. The worker runs until `true` is sent on the shutdown channel (or
/// the sender is dropped), so only await the returned JoinHandle after signalling shutdown.
///
/// Every pass gets its own `OrderLifecycleApi` over a fresh handle to the connection pool.
pub fn start_lifecycle_worker(
    db: SqliteDatabase,
    producers: EventProducers,
    config: WorkerConfig,
    task: LifecycleTask,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let period = config.interval(task);
        run_lifecycle_loop(task, period, shutdown, || {
            let api = OrderLifecycleApi::new(db.clone(), producers.clone())
                .with_timezone(config.timezone)
                .with_policy(config.policy)
                .with_producers(producers.clone());
            async move { api.run_task(task).await }
        })
        .await
    })
}

/// Runs `run_pass` repeatedly, sleeping for the full `period` after each pass, until shutdown is requested.
///
/// The first pass runs immediately. The gap between the end of one pass and the start of the next is always `period`,
/// however long the pass took. A failed pass is logged and the loop carries on. If shutdown is requested while a pass
/// is in flight, the pass is dropped, which rolls back anything it has not committed yet.
pub async fn run_lifecycle_loop<F, Fut>(
    task: LifecycleTask,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
    mut run_pass: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<PassReport, LifecycleApiError>>,
{
    info!("🕰️ [{task}] Worker started. Waiting {}s between passes", period.as_secs());
    loop {
        if *shutdown.borrow() {
            break;
        }
        trace!("🕰️ [{task}] Running lifecycle pass");
        tokio::select! {
            result = run_pass() => log_pass_result(task, result),
            _ = shutdown.changed() => {
                info!("🕰️ [{task}] Shutdown requested during a pass. Abandoning it.");
                break;
            }
        }
        tokio::select! {
            _ = sleep(period) => {},
            _ = shutdown.changed() => break,
        }
    }
    info!("🕰️ [{task}] Worker stopped");
}

fn log_pass_result(task: LifecycleTask, result: Result<PassReport, LifecycleApiError>) {
    match result {
        Ok(report) => {
            info!("🕰️ [{task}] {} orders transitioned", report.applied.len());
            if !report.applied.is_empty() {
                debug!("🕰️ [{task}] Transitioned orders: {}", order_list(&report.applied));
            }
            if !report.skipped.is_empty() {
                debug!("🕰️ [{task}] Skipped orders: {}", order_list(&report.skipped));
            }
        },
        Err(e) => {
            error!("🕰️ [{task}] Error running lifecycle pass: {e}");
        },
    }
}

fn order_list(ids: &[i64]) -> String {
    ids.iter().map(|id| format!("#{id}")).collect::<Vec<String>>().join(", ")
}
