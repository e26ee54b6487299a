// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Default number of concurrently in-flight jobs
pub const DEFAULT_CONCURRENCY: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct ScannerConfig {
    #[validate(range(min = 1, max = 10000))]
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Abandon a job after this many seconds. Unset means no limit.
    #[validate(range(min = 1, max = 86400))]
    #[serde(default)]
    pub job_timeout_secs: Option<u64>,

    #[validate(custom(function = "validate_log_level"))]
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_log_level() -> String {
    "info".to_string()
}

fn validate_log_level(level: &str) -> Result<(), ValidationError> {
    match level.to_ascii_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ValidationError::new("invalid_log_level")),
    }
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            job_timeout_secs: None,
            log_level: default_log_level(),
        }
    }
}

impl ScannerConfig {
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_job_timeout(mut self, timeout: Duration) -> Self {
        self.job_timeout_secs = Some((timeout.as_secs_f64().ceil() as u64).max(1));
        self
    }

    pub fn job_timeout(&self) -> Option<Duration> {
        self.job_timeout_secs.map(Duration::from_secs)
    }
}
