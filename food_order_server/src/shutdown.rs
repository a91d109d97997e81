//! Waits for the process to be asked to stop.

use log::*;
use tokio::signal;

use crate::errors::ServerError;

/// Resolves when the process receives Ctrl+C or, on Unix, SIGTERM.
pub async fn wait_for_shutdown_signal() -> Result<(), ServerError> {
    let ctrl_c = async { signal::ctrl_c().await.map_err(ServerError::SignalError) };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate()).map_err(ServerError::SignalError)?.recv().await;
        Ok::<(), ServerError>(())
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<Result<(), ServerError>>();

    tokio::select! {
        result = ctrl_c => {
            result?;
            info!("🚀️ Ctrl+C received. Shutting down.");
        }
        result = terminate => {
            result?;
            info!("🚀️ SIGTERM received. Shutting down.");
        }
    }
    Ok(())
}
