// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestrator
 * Validates signature references, builds target records, expands jobs and
 * dispatches them on a bounded pool
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

pub mod expansion;
pub mod pool;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use validator::Validate;

use crate::config::ScannerConfig;
use crate::errors::{ScannerError, ScannerResult};
use crate::exchange::{ExchangeParser, RawExchange, RawHttpParser, TargetRecord};
use crate::options::ScanOptions;
use crate::runner::{Job, JobContext, JobRunner};
use crate::signature::{Signature, SignatureId, SignatureParser, SignatureStore, YamlSignatureParser};
use crate::statistics::{ScanStatistics, StatisticsAggregator};

pub use expansion::{expand, expand_all, resolve_template};
pub use pool::{DispatchReport, JobPool};

/// Outcome of one `run_scan` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanSummary {
    pub jobs_planned: usize,
    pub jobs_dispatched: usize,
    pub jobs_failed: usize,
    pub cancelled: bool,
}

pub struct Scanner {
    config: ScannerConfig,
    store: SignatureStore,
    exchange_parser: Arc<dyn ExchangeParser>,
    aggregator: Arc<StatisticsAggregator>,
    runner: Arc<dyn JobRunner>,
}

impl std::fmt::Debug for Scanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scanner")
            .field("config", &self.config)
            .field("store", &self.store)
            .field("scans", &self.aggregator.len())
            .finish()
    }
}

pub struct ScannerBuilder {
    runner: Arc<dyn JobRunner>,
    config: ScannerConfig,
    signature_parser: Arc<dyn SignatureParser>,
    exchange_parser: Arc<dyn ExchangeParser>,
    aggregator: Option<Arc<StatisticsAggregator>>,
}

impl ScannerBuilder {
    pub fn with_config(mut self, config: ScannerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_signature_parser(mut self, parser: Arc<dyn SignatureParser>) -> Self {
        self.signature_parser = parser;
        self
    }

    pub fn with_exchange_parser(mut self, parser: Arc<dyn ExchangeParser>) -> Self {
        self.exchange_parser = parser;
        self
    }

    /// Share an aggregator with other scanners or with the caller
    pub fn with_aggregator(mut self, aggregator: Arc<StatisticsAggregator>) -> Self {
        self.aggregator = Some(aggregator);
        self
    }

    /// Validate the config and parse the initial signature set
    pub fn build(self, signatures: &HashMap<SignatureId, String>) -> ScannerResult<Scanner> {
        self.config.validate()?;

        let store = SignatureStore::load(signatures, self.signature_parser)?;

        Ok(Scanner {
            config: self.config,
            store,
            exchange_parser: self.exchange_parser,
            aggregator: self.aggregator.unwrap_or_default(),
            runner: self.runner,
        })
    }
}

impl Scanner {
    /// Scanner with the default parsers and config
    pub fn new(
        signatures: &HashMap<SignatureId, String>,
        runner: Arc<dyn JobRunner>,
    ) -> ScannerResult<Self> {
        Self::builder(runner).build(signatures)
    }

    pub fn builder(runner: Arc<dyn JobRunner>) -> ScannerBuilder {
        ScannerBuilder {
            runner,
            config: ScannerConfig::default(),
            signature_parser: Arc::new(YamlSignatureParser::new()),
            exchange_parser: Arc::new(RawHttpParser::new()),
            aggregator: None,
        }
    }

    pub fn config(&self) -> &ScannerConfig {
        &self.config
    }

    pub fn store(&self) -> &SignatureStore {
        &self.store
    }

    pub fn aggregator(&self) -> &Arc<StatisticsAggregator> {
        &self.aggregator
    }

    /// Replace the active signature set. Scans already running keep their snapshot.
    pub fn update_signatures(&self, signatures: &HashMap<SignatureId, String>) -> ScannerResult<()> {
        self.store.replace(signatures)
    }

    /// Validate, decode and expand without dispatching
    pub fn plan(
        &self,
        targets: &[RawExchange],
        signature_ids: &[SignatureId],
    ) -> ScannerResult<Vec<Job>> {
        let (records, signatures) = self.prepare(targets, signature_ids)?;
        Ok(expand_all(&records, &signatures).collect())
    }

    /// Run every requested signature against every target.
    ///
    /// Input errors abort before anything is dispatched. Once dispatch starts,
    /// per-job failures are recorded under the scan id and never abort the batch.
    pub async fn run_scan(
        &self,
        targets: &[RawExchange],
        signature_ids: &[SignatureId],
        options: ScanOptions,
    ) -> ScannerResult<ScanSummary> {
        let (records, signatures) = self.prepare(targets, signature_ids)?;
        let jobs_planned = records.len() * signatures.len();

        let scan_id = options.scan_id.clone();
        self.aggregator.create(&scan_id);

        let cancellation = options
            .cancellation()
            .cloned()
            .unwrap_or_else(CancellationToken::new);

        info!(
            scan_id = %scan_id,
            targets = records.len(),
            signatures = signatures.len(),
            jobs = jobs_planned,
            "Starting scan"
        );
        let start = Instant::now();

        let ctx = JobContext::new(Arc::new(options), Arc::clone(&self.aggregator), cancellation);
        let pool = JobPool::new(self.config.concurrency).with_job_timeout(self.config.job_timeout());
        let report = pool
            .dispatch(
                expand_all(&records, &signatures),
                Arc::clone(&self.runner),
                ctx,
            )
            .await;

        let summary = ScanSummary {
            jobs_planned,
            jobs_dispatched: report.dispatched,
            jobs_failed: report.failed,
            cancelled: report.cancelled,
        };

        if summary.cancelled {
            warn!(
                scan_id = %scan_id,
                dispatched = summary.jobs_dispatched,
                planned = summary.jobs_planned,
                "Scan cancelled before all jobs were submitted"
            );
        }

        info!(
            scan_id = %scan_id,
            dispatched = summary.jobs_dispatched,
            failed = summary.jobs_failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scan finished"
        );

        Ok(summary)
    }

    pub fn get_scan_result(&self, scan_id: &str) -> ScannerResult<ScanStatistics> {
        self.aggregator
            .get(scan_id)
            .ok_or_else(|| ScannerError::ScanNotFound {
                scan_id: scan_id.to_string(),
            })
    }

    pub fn clear_scan_result(&self, scan_id: &str) {
        self.aggregator.clear(scan_id);
    }

    fn prepare(
        &self,
        targets: &[RawExchange],
        signature_ids: &[SignatureId],
    ) -> ScannerResult<(Vec<Arc<TargetRecord>>, Vec<Arc<Signature>>)> {
        // One snapshot for the whole call so a concurrent replace cannot split it
        let snapshot = self.store.snapshot();
        let signatures = snapshot
            .resolve(signature_ids)
            .map_err(|ids| ScannerError::UnknownSignatures { ids })?;

        let records = targets
            .iter()
            .map(|exchange| {
                TargetRecord::from_exchange(exchange, self.exchange_parser.as_ref()).map(Arc::new)
            })
            .collect::<ScannerResult<Vec<_>>>()?;

        debug!(
            "Prepared {} targets x {} signatures",
            records.len(),
            signatures.len()
        );
        Ok((records, signatures))
    }
}
