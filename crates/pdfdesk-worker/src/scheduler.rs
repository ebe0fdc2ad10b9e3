//! Cron scheduler for the retention sweeper.

use std::sync::Arc;

use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use pdfdesk_core::config::SweeperConfig;
use pdfdesk_core::error::AppError;

use crate::sweeper::{RetentionSweeper, SweepError};

/// Runs the sweeper on a cron schedule, on the scheduler's own task.
pub struct CronScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
    /// Sweeper invoked on every tick
    sweeper: Arc<RetentionSweeper>,
}

impl std::fmt::Debug for CronScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CronScheduler").finish()
    }
}

impl CronScheduler {
    /// Create a new cron scheduler
    pub async fn new(sweeper: Arc<RetentionSweeper>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler, sweeper })
    }

    /// Register the sweep according to `config`. Does nothing when the
    /// sweeper is disabled.
    pub async fn register(&self, config: &SweeperConfig) -> Result<(), AppError> {
        if !config.enabled {
            tracing::info!("Retention sweeper disabled");
            return Ok(());
        }
        self.register_sweep(&config.schedule).await
    }

    /// Retention sweep on `schedule` (six fields, seconds first)
    pub async fn register_sweep(&self, schedule: &str) -> Result<(), AppError> {
        let sweeper = Arc::clone(&self.sweeper);
        let job = CronJob::new_async(schedule, move |_uuid, _lock| {
            let sweeper = Arc::clone(&sweeper);
            Box::pin(async move {
                match sweeper.sweep().await {
                    Ok(_) => {}
                    Err(SweepError::AlreadyRunning) => {
                        tracing::warn!("Previous sweep still running, skipping tick");
                    }
                    Err(e) => tracing::error!("Retention sweep failed: {}", e),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid sweeper schedule '{}': {}", schedule, e))
        })?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::internal(format!("Failed to add sweep schedule: {}", e)))?;

        tracing::info!(
            schedule = %schedule,
            retention_hours = self.sweeper.retention().num_hours(),
            "Registered: retention_sweep"
        );
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Cron scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&self) -> Result<(), AppError> {
        let mut scheduler = self.scheduler.clone();
        scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Cron scheduler shut down");
        Ok(())
    }
}
