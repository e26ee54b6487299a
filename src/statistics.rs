// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Statistics Aggregator
 * Per-scan counters, status histogram, findings and errors
 *
 * Lock discipline: the table lock only guards lookup/creation of an entry
 * and is always released before the entry's own mutex is taken. No path
 * holds an entry lock while acquiring the table lock.
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::types::Vulnerability;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStatistics {
    pub scan_id: String,
    pub requests_count: u64,
    /// Cumulative response time in seconds
    pub response_time: f64,
    pub status_codes: BTreeMap<u16, u64>,
    pub vulnerabilities: Vec<Vulnerability>,
    pub errors: Vec<String>,
}

impl ScanStatistics {
    pub fn new(scan_id: impl Into<String>) -> Self {
        Self {
            scan_id: scan_id.into(),
            ..Default::default()
        }
    }

    pub fn average_response_time(&self) -> Option<f64> {
        if self.requests_count == 0 {
            None
        } else {
            Some(self.response_time / self.requests_count as f64)
        }
    }
}

type Entry = Arc<Mutex<ScanStatistics>>;

/// Table of scan statistics shared by all workers of all scans
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    scans: RwLock<HashMap<String, Entry>>,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shared lookup first; only escalate to the exclusive lock on a miss
    fn entry(&self, scan_id: &str) -> Entry {
        if let Some(entry) = self.scans.read().get(scan_id) {
            return Arc::clone(entry);
        }

        let mut scans = self.scans.write();
        // Another reporter may have created it between the read and the write lock
        if let Some(entry) = scans.get(scan_id) {
            return Arc::clone(entry);
        }

        debug!(scan_id = scan_id, "Creating scan statistics entry");
        let entry = Arc::new(Mutex::new(ScanStatistics::new(scan_id)));
        scans.insert(scan_id.to_string(), Arc::clone(&entry));
        entry
    }

    fn existing(&self, scan_id: &str) -> Option<Entry> {
        self.scans.read().get(scan_id).cloned()
    }

    /// Record one probe request outcome
    pub fn report(
        &self,
        scan_id: &str,
        response_time: Duration,
        status_code: u16,
        error: Option<String>,
    ) {
        let entry = self.entry(scan_id);
        let mut stats = entry.lock();

        stats.requests_count += 1;
        stats.response_time += response_time.as_secs_f64();
        *stats.status_codes.entry(status_code).or_insert(0) += 1;
        if let Some(error) = error {
            stats.errors.push(error);
        }
    }

    /// Append an error without counting a request
    pub fn record_error(&self, scan_id: &str, error: impl Into<String>) {
        let entry = self.entry(scan_id);
        entry.lock().errors.push(error.into());
    }

    /// Create an empty entry so findings can attach before the first report
    pub fn create(&self, scan_id: &str) {
        self.entry(scan_id);
    }

    /// Attach a finding to its scan. Dropped if the scan has no entry.
    pub fn append_finding(&self, vuln: Vulnerability) {
        match self.existing(&vuln.scan_id) {
            Some(entry) => entry.lock().vulnerabilities.push(vuln),
            None => debug!(
                scan_id = %vuln.scan_id,
                "Discarding finding for unknown scan"
            ),
        }
    }

    /// Snapshot copy of a scan's statistics
    pub fn get(&self, scan_id: &str) -> Option<ScanStatistics> {
        let entry = self.existing(scan_id)?;
        let stats = entry.lock().clone();
        Some(stats)
    }

    pub fn clear(&self, scan_id: &str) {
        if self.scans.write().remove(scan_id).is_some() {
            debug!(scan_id = scan_id, "Cleared scan statistics");
        }
    }

    pub fn scan_ids(&self) -> Vec<String> {
        let mut ids: Vec<_> = self.scans.read().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.scans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.read().is_empty()
    }
}
