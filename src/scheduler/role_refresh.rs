use std::sync::Arc;

use serenity::http::Http;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::config::Config;
use crate::error::AppError;
use crate::service::refresh::RefreshService;
use crate::service::report::{refresh_report, Reporter};
use crate::service::roles_source::{NicknamesSource, RolesSource};

/// Everything the refresh job needs, cloned into each run.
#[derive(Clone)]
pub struct RefreshJob {
    pub http: Arc<Http>,
    pub config: Arc<Config>,
    pub roles: Arc<dyn RolesSource>,
    pub nicknames: Arc<dyn NicknamesSource>,
    pub reporter: Reporter,
}

impl RefreshJob {
    async fn run(&self) {
        tracing::info!("Refreshing roles and nicknames for all members");

        let service = RefreshService::new(
            &self.http,
            &self.config,
            self.roles.as_ref(),
            self.nicknames.as_ref(),
        );

        match service.refresh_all().await {
            Ok(summary) => {
                tracing::info!(
                    "Refresh finished: {} members, {} role updates, {} renames, {} failures",
                    summary.members,
                    summary.role_updates.len(),
                    summary.renames.len(),
                    summary.failures
                );
                self.reporter.send(&refresh_report(&summary)).await;
            }
            Err(e) => tracing::error!("Error refreshing guild members: {}", e),
        }
    }
}

/// Starts the periodic role refresh scheduler
///
/// Reactions and joins are handled as they happen, but events missed while the
/// bot was offline and changes made in the external authorities are only picked
/// up by this job.
///
/// # Arguments
/// - `cron`: Six-field cron expression (with seconds) of the refresh schedule
/// - `job`: Discord client and sources used by each run
///
/// # Returns
/// - `Ok(JobScheduler)`: Running scheduler, to be shut down on exit
/// - `Err(AppError)`: Invalid cron expression or scheduler failure
pub async fn start_scheduler(cron: &str, job: RefreshJob) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;

    let job = Job::new_async(cron, move |_uuid, _lock| {
        let job = job.clone();

        Box::pin(async move {
            job.run().await;
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;

    tracing::info!("Role refresh scheduler started ({})", cron);

    Ok(scheduler)
}
