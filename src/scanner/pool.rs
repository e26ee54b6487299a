// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bounded Job Pool
 * Semaphore-gated dispatch with a join barrier
 *
 * A job is only spawned once it holds a permit, so submission blocks while
 * the pool is saturated instead of queueing without bound. Every job that
 * fails, panics, times out or cannot be submitted is recorded into the
 * scan's error list.
 *
 * © 2026 Bountyy Oy
 */

use serde::Serialize;
use std::any::Any;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use crate::errors::JobError;
use crate::runner::{Job, JobContext, JobRunner};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchReport {
    pub dispatched: usize,
    pub failed: usize,
    pub cancelled: bool,
}

#[derive(Debug, Clone)]
pub struct JobPool {
    concurrency: usize,
    job_timeout: Option<Duration>,
}

impl JobPool {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            job_timeout: None,
        }
    }

    pub fn with_job_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.job_timeout = timeout;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run every job and return once all submitted jobs have finished
    pub async fn dispatch<I>(
        &self,
        jobs: I,
        runner: Arc<dyn JobRunner>,
        ctx: JobContext,
    ) -> DispatchReport
    where
        I: IntoIterator<Item = Job>,
    {
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks: JoinSet<Result<(), JobError>> = JoinSet::new();
        let mut report = DispatchReport::default();

        for job in jobs {
            let permit = tokio::select! {
                biased;
                _ = ctx.cancellation().cancelled() => {
                    report.cancelled = true;
                    break;
                }
                permit = Arc::clone(&semaphore).acquire_owned() => permit,
            };

            let permit = match permit {
                Ok(permit) => permit,
                // Only a closed semaphore fails here; this pool never closes its own
                Err(e) => {
                    let error = JobError::Submission(format!("{} ({})", e, job.url));
                    Self::record_failure(&ctx, error, &mut report);
                    continue;
                }
            };

            let runner = Arc::clone(&runner);
            let job_ctx = ctx.clone();
            let timeout = self.job_timeout;

            tasks.spawn(async move {
                let _permit = permit;
                match timeout {
                    Some(limit) => {
                        let url = job.url.clone();
                        match tokio::time::timeout(limit, runner.run(job, job_ctx)).await {
                            Ok(result) => result,
                            Err(_) => Err(JobError::Timeout { url, timeout: limit }),
                        }
                    }
                    None => runner.run(job, job_ctx).await,
                }
            });
            report.dispatched += 1;

            while let Some(result) = tasks.try_join_next() {
                Self::settle(result, &ctx, &mut report);
            }
        }

        if report.cancelled {
            debug!(
                scan_id = ctx.scan_id(),
                "Scan cancelled, waiting for {} in-flight jobs",
                tasks.len()
            );
        }

        while let Some(result) = tasks.join_next().await {
            Self::settle(result, &ctx, &mut report);
        }

        report
    }

    fn settle(
        result: Result<Result<(), JobError>, JoinError>,
        ctx: &JobContext,
        report: &mut DispatchReport,
    ) {
        let error = match result {
            Ok(Ok(())) => return,
            Ok(Err(e)) => e,
            Err(join_error) if join_error.is_panic() => {
                JobError::Panicked(panic_message(join_error.into_panic()))
            }
            Err(join_error) => JobError::Other(join_error.to_string()),
        };
        Self::record_failure(ctx, error, report);
    }

    fn record_failure(ctx: &JobContext, error: JobError, report: &mut DispatchReport) {
        report.failed += 1;
        warn!(scan_id = ctx.scan_id(), error = %error, "Job failed");
        ctx.aggregator().record_error(ctx.scan_id(), error.to_string());
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
