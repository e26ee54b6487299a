// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Sigprobe Scanner Library
 * Signature store, scan orchestration and per-scan statistics
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

pub mod config;
pub mod errors;
pub mod exchange;
pub mod options;
pub mod runner;
pub mod scanner;
pub mod signature;
pub mod statistics;
pub mod types;

pub use config::ScannerConfig;
pub use errors::{JobError, ScannerError, ScannerResult};
pub use exchange::{ExchangeParser, RawExchange, RawHttpParser, TargetRecord};
pub use options::ScanOptions;
pub use runner::{Job, JobContext, JobRunner};
pub use scanner::{ScanSummary, Scanner, ScannerBuilder};
pub use signature::{Signature, SignatureId, SignatureKind, SignatureStore};
pub use statistics::{ScanStatistics, StatisticsAggregator};
pub use types::{Confidence, Severity, Vulnerability};
