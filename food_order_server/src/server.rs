use food_order_engine::{
    events::{EventHandlers, EventHooks, EventProducers},
    LifecycleTask,
    SqliteDatabase,
};
use log::*;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    config::{ServerConfig, WorkerConfig},
    errors::ServerError,
    lifecycle_worker::start_lifecycle_worker,
    shutdown::wait_for_shutdown_signal,
};

const EVENT_BUFFER_SIZE: usize = 25;

/// Opens the database, starts the lifecycle workers and runs until a shutdown signal arrives.
pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    if config.run_migrations {
        db.run_migrations().await.map_err(|e| ServerError::MigrationError(e.to_string()))?;
        info!("🚀️ Database migrations are up to date");
    }
    let handlers = EventHandlers::new(EVENT_BUFFER_SIZE, realtime_hooks());
    let producers = handlers.producers();
    handlers.start_handlers().await;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let workers = start_workers(&db, &producers, config.workers, shutdown_rx);
    info!("🚀️ {} lifecycle workers running", workers.len());

    let signal_result = wait_for_shutdown_signal().await;
    if shutdown_tx.send(true).is_err() {
        warn!("🚀️ All lifecycle workers had already stopped");
    }
    for worker in workers {
        worker.await.map_err(|e| ServerError::WorkerPanicked(e.to_string()))?;
    }
    db.close().await;
    signal_result
}

/// Starts one worker per lifecycle task.
pub fn start_workers(
    db: &SqliteDatabase,
    producers: &EventProducers,
    config: WorkerConfig,
    shutdown: watch::Receiver<bool>,
) -> Vec<JoinHandle<()>> {
    LifecycleTask::ALL
        .into_iter()
        .map(|task| start_lifecycle_worker(db.clone(), producers.clone(), config, task, shutdown.clone()))
        .collect()
}

/// The transport that delivers real-time pushes to connected clients is not part of this server. Pushes are logged so
/// that they can be picked up from the log stream.
fn realtime_hooks() -> EventHooks {
    let mut hooks = EventHooks::default();
    hooks.on_push(|ev| {
        Box::pin(async move {
            info!("📬️ Push to {}: {}", ev.target, ev.message);
        })
    });
    hooks.on_order_transitioned(|ev| {
        Box::pin(async move {
            debug!(
                "📬️ Order #{} moved from {}/{} to {}/{}",
                ev.new_order.id,
                ev.old_order.status,
                ev.old_order.payment_status,
                ev.new_order.status,
                ev.new_order.payment_status
            );
        })
    });
    hooks
}
