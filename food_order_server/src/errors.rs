use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize the workers. {0}")]
    InitializeError(String),
    #[error("Could not run database migrations. {0}")]
    MigrationError(String),
    #[error("Could not listen for shutdown signals. {0}")]
    SignalError(#[from] std::io::Error),
    #[error("A lifecycle worker stopped unexpectedly. {0}")]
    WorkerPanicked(String),
}
