use crate::config::RunSettings;
use crate::errors::{AppError, AppResult};
use crate::models::JobStatus;
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};

/// Fixed-interval polling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
    /// Delay between two status checks
    pub interval: Duration,
    /// Elapsed time after which the job is given up on
    pub timeout: Duration,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&RunSettings::default())
    }
}

impl From<&RunSettings> for PollSettings {
    fn from(run: &RunSettings) -> Self {
        Self {
            interval: run.poll_interval(),
            timeout: run.poll_timeout(),
        }
    }
}

/// How the polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed,
    Failed,
    Deleted,
    TimedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Number of status checks issued, failed ones included
    pub polls: u32,
    pub elapsed: Duration,
}

impl PollReport {
    /// Maps every outcome except `Completed` to its fatal error.
    pub fn into_result(self, job_id: &str, settings: &PollSettings) -> AppResult<()> {
        match self.outcome {
            PollOutcome::Completed => Ok(()),
            PollOutcome::Failed => Err(AppError::JobOutcomeError {
                job_id: job_id.to_string(),
                outcome: JobStatus::Failed.to_string(),
            }),
            PollOutcome::Deleted => Err(AppError::JobOutcomeError {
                job_id: job_id.to_string(),
                outcome: JobStatus::Deleted.to_string(),
            }),
            PollOutcome::TimedOut => Err(AppError::TimeoutError {
                job_id: job_id.to_string(),
                timeout_secs: settings.timeout.as_secs(),
            }),
        }
    }
}

/// Polls `check_status` until the job reaches a terminal state or the
/// timeout elapses.
///
/// A failed status check counts as "still pending": it is logged and retried
/// after the regular interval. The timeout is evaluated after every check,
/// whether it succeeded or not, so an unreachable API still ends the loop.
/// Time spent inside a slow check is only noticed once it returns.
pub async fn poll_until_terminal<F, Fut>(
    job_id: &str,
    settings: &PollSettings,
    mut check_status: F,
) -> PollReport
where
    F: FnMut() -> Fut,
    Fut: Future<Output = AppResult<JobStatus>>,
{
    let start = Instant::now();
    let mut polls: u32 = 0;

    info!(
        job_id = job_id,
        interval_secs = settings.interval.as_secs(),
        timeout_secs = settings.timeout.as_secs(),
        "Waiting for export job"
    );

    loop {
        polls += 1;

        let outcome = match check_status().await {
            Ok(JobStatus::Completed) => Some(PollOutcome::Completed),
            Ok(JobStatus::Failed) => Some(PollOutcome::Failed),
            Ok(JobStatus::Deleted) => Some(PollOutcome::Deleted),
            Ok(status @ (JobStatus::Pending(_) | JobStatus::Unknown)) => {
                info!(job_id = job_id, poll = polls, stage = status.stage(), "Export job not ready");
                None
            }
            Err(e) => {
                warn!(job_id = job_id, poll = polls, error = %e, "Failed to get job status, retrying");
                None
            }
        };

        let elapsed = start.elapsed();

        if let Some(outcome) = outcome {
            info!(job_id = job_id, polls = polls, outcome = ?outcome, "Export job finished");
            return PollReport {
                outcome,
                polls,
                elapsed,
            };
        }

        if elapsed > settings.timeout {
            warn!(
                job_id = job_id,
                polls = polls,
                elapsed_secs = elapsed.as_secs(),
                "Export job did not complete in time"
            );
            return PollReport {
                outcome: PollOutcome::TimedOut,
                polls,
                elapsed,
            };
        }

        tokio::time::sleep(settings.interval).await;
    }
}
