//! Error types for the scheduler

/// Result type for scheduler operations
pub type SchedulerResult<T> = std::result::Result<T, SchedulerError>;

/// Errors that can occur in the scheduler
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// Scheduler failed to start
    #[error("Scheduler startup failed: {0}")]
    StartupFailed(String),

    /// Scheduler failed to shut down
    #[error("Scheduler shutdown failed: {0}")]
    ShutdownFailed(String),

    /// Job could not be created or registered
    #[error("Job creation failed: {0}")]
    JobCreationFailed(String),
}

impl From<SchedulerError> for crate::error::AppError {
    fn from(err: SchedulerError) -> Self {
        crate::error::AppError::Internal(err.to_string())
    }
}
