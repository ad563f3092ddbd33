//! Background job scheduler.
//!
//! Initialises a [`JobScheduler`] at server startup and registers the
//! nightly full-sync job.

use std::sync::Arc;

use sqlx::PgPool;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};

use slsync_client::SelectLineClient;

/// Builds and starts the background job scheduler.
///
/// Returns the running [`JobScheduler`] handle, which must be kept alive
/// for the lifetime of the process — dropping it shuts down all jobs.
///
/// # Errors
///
/// Returns [`JobSchedulerError`] if the scheduler cannot be initialised,
/// the job cannot be registered, or the scheduler fails to start.
pub async fn build_scheduler(
    pool: PgPool,
    config: Arc<slsync_core::AppConfig>,
) -> Result<JobScheduler, JobSchedulerError> {
    let scheduler = JobScheduler::new().await?;

    register_nightly_sync_job(&scheduler, pool, config).await?;

    scheduler.start().await?;
    Ok(scheduler)
}

/// Register the nightly full catalog sync.
///
/// Runs every day at 02:30 UTC (`0 30 2 * * *`), outside European business
/// hours when the ERP sees the least load. Failures are logged and the job
/// fires again the next night; the mirror simply stays one day staler.
async fn register_nightly_sync_job(
    scheduler: &JobScheduler,
    pool: PgPool,
    config: Arc<slsync_core::AppConfig>,
) -> Result<(), JobSchedulerError> {
    let pool = Arc::new(pool);

    let job = Job::new_async("0 30 2 * * *", move |_uuid, _lock| {
        let pool = Arc::clone(&pool);
        let config = Arc::clone(&config);

        Box::pin(async move {
            tracing::info!("scheduler: starting nightly catalog sync");
            run_nightly_sync(&pool, &config).await;
        })
    })?;

    scheduler.add(job).await?;
    Ok(())
}

async fn run_nightly_sync(pool: &PgPool, config: &slsync_core::AppConfig) {
    let mut client = match SelectLineClient::new(config.selectline.clone()) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "scheduler: could not build SelectLine client");
            return;
        }
    };

    match slsync_sync::sync_all(pool, &mut client).await {
        Ok(report) => {
            tracing::info!(
                groups_upserted = report.groups.upserts,
                groups_failed = report.groups.failures,
                articles_upserted = report.articles.upserts,
                articles_failed = report.articles.failures,
                articles_skipped = report.articles.skipped_missing_group,
                "scheduler: nightly catalog sync complete"
            );
        }
        Err(e) => {
            tracing::error!(error = %e, "scheduler: nightly catalog sync aborted");
        }
    }
}
