// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Job Runner Boundary
 * Unit of dispatch and the execution capability that consumes it
 *
 * © 2026 Bountyy Oy
 */

use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::JobError;
use crate::exchange::TargetRecord;
use crate::options::ScanOptions;
use crate::signature::Signature;
use crate::statistics::StatisticsAggregator;
use crate::types::Vulnerability;

/// One resolved (URL, signature) unit of dispatchable work
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub url: String,
    /// Fully resolved; fuzz templates already carry inherited fields
    pub signature: Arc<Signature>,
    /// Captured exchange the job was expanded from
    pub origin: Arc<TargetRecord>,
}

/// Everything a runner needs besides the job itself
#[derive(Debug, Clone)]
pub struct JobContext {
    options: Arc<ScanOptions>,
    aggregator: Arc<StatisticsAggregator>,
    cancellation: CancellationToken,
}

impl JobContext {
    pub fn new(
        options: Arc<ScanOptions>,
        aggregator: Arc<StatisticsAggregator>,
        cancellation: CancellationToken,
    ) -> Self {
        Self {
            options,
            aggregator,
            cancellation,
        }
    }

    pub fn options(&self) -> &ScanOptions {
        &self.options
    }

    pub fn scan_id(&self) -> &str {
        &self.options.scan_id
    }

    pub fn aggregator(&self) -> &StatisticsAggregator {
        &self.aggregator
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Report a probe outcome under this scan's id
    pub fn report(&self, response_time: Duration, status_code: u16, error: Option<String>) {
        self.aggregator
            .report(&self.options.scan_id, response_time, status_code, error);
    }

    /// Attach a finding to this scan, stamping the scan id
    pub fn report_finding(&self, mut vuln: Vulnerability) {
        vuln.scan_id = self.options.scan_id.clone();
        self.aggregator.append_finding(vuln);
    }
}

/// Executes a job: performs the probe and reports outcomes through the aggregator.
///
/// An `Err` is recorded into the scan's error list by the orchestrator.
#[async_trait::async_trait]
pub trait JobRunner: Send + Sync + 'static {
    async fn run(&self, job: Job, ctx: JobContext) -> Result<(), JobError>;
}
