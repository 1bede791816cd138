//! Core scheduler service implementation

use super::config::SchedulerConfig;
use super::error::{SchedulerError, SchedulerResult};
use std::future::Future;
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Owns the cron scheduler and the jobs registered on it
pub struct SchedulerService {
    config: SchedulerConfig,
    scheduler: JobScheduler,
    running: Arc<tokio::sync::RwLock<bool>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub async fn new(config: SchedulerConfig) -> SchedulerResult<Self> {
        info!("Initializing scheduler service");

        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        Ok(Self {
            config,
            scheduler,
            running: Arc::new(tokio::sync::RwLock::new(false)),
        })
    }

    /// Register a recurring job under a cron schedule.
    ///
    /// The task factory is invoked once per firing; execution time and
    /// outcome logging happen here so tasks stay plain async functions.
    pub async fn add_job<F, Fut>(
        &self,
        name: &str,
        schedule: &str,
        task: F,
    ) -> SchedulerResult<Uuid>
    where
        F: Fn() -> Fut + Send + Sync + Clone + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let job_name = name.to_string();
        info!(job_name = %job_name, schedule = %schedule, "Adding job to scheduler");

        let cron_job = Job::new_async(schedule, move |_uuid, _lock| {
            let task = task.clone();
            let job_name = job_name.clone();
            Box::pin(async move {
                debug!(job_name = %job_name, "Executing scheduled job");
                let start = std::time::Instant::now();
                task().await;
                info!(
                    job_name = %job_name,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Scheduled job finished"
                );
            })
        })
        .map_err(|e| SchedulerError::JobCreationFailed(e.to_string()))?;

        let job_id = self
            .scheduler
            .add(cron_job)
            .await
            .map_err(|e| SchedulerError::JobCreationFailed(e.to_string()))?;

        Ok(job_id)
    }

    /// Start the scheduler
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if !self.config.enabled {
            info!("Scheduler is disabled in configuration");
            return Ok(());
        }

        {
            let mut running = self.running.write().await;
            if *running {
                warn!("Scheduler is already running");
                return Ok(());
            }
            *running = true;
        }

        self.scheduler
            .start()
            .await
            .map_err(|e| SchedulerError::StartupFailed(e.to_string()))?;

        info!("Scheduler service started");
        Ok(())
    }

    /// Stop the scheduler
    pub async fn shutdown(&mut self) -> SchedulerResult<()> {
        {
            let mut running = self.running.write().await;
            if !*running {
                warn!("Scheduler is not running");
                return Ok(());
            }
            *running = false;
        }

        self.scheduler
            .shutdown()
            .await
            .map_err(|e| SchedulerError::ShutdownFailed(e.to_string()))?;

        info!("Scheduler service shut down");
        Ok(())
    }

    /// Check if the scheduler is running
    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
