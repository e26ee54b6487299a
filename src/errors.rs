// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scanner Error Types
 * Request-level and job-level error taxonomy with thiserror
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary - Enterprise Edition
 */

use std::time::Duration;
use thiserror::Error;

use crate::signature::SignatureId;

/// Errors that abort a whole scanner operation before any job is dispatched
#[derive(Error, Debug)]
pub enum ScannerError {
    /// One or more requested signature ids are not in the active store
    #[error("Unknown signature(s): {}", join_ids(.ids))]
    UnknownSignatures { ids: Vec<SignatureId> },

    /// A signature failed to parse during load or replace
    #[error("Failed to parse signature {id}: {reason}")]
    SignatureParse { id: SignatureId, reason: String },

    /// A base64 payload of a captured exchange could not be decoded
    #[error("Invalid base64 in {field}: {source}")]
    Decode {
        field: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    /// A decoded exchange could not be parsed as HTTP
    #[error("Failed to parse captured exchange: {0}")]
    ExchangeParse(String),

    /// No statistics exist for the scan id
    #[error("Scan result not found: {scan_id}")]
    ScanNotFound { scan_id: String },

    /// Configuration errors, including failed `validator` checks
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Failure of a single dispatched job. Never aborts sibling jobs.
#[derive(Error, Debug)]
pub enum JobError {
    #[error("Request to {url} failed: {reason}")]
    RequestFailed { url: String, reason: String },

    #[error("Job timed out after {timeout:?} for {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("Job panicked: {0}")]
    Panicked(String),

    #[error("Job could not be submitted: {0}")]
    Submission(String),

    #[error("Job error: {0}")]
    Other(String),
}

impl ScannerError {
    /// Whether the error was caused by caller input rather than scanner state
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            ScannerError::UnknownSignatures { .. }
                | ScannerError::SignatureParse { .. }
                | ScannerError::Decode { .. }
                | ScannerError::ExchangeParse(_)
        )
    }
}

fn join_ids(ids: &[SignatureId]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<validator::ValidationErrors> for ScannerError {
    fn from(err: validator::ValidationErrors) -> Self {
        ScannerError::Configuration(err.to_string())
    }
}

/// Result type for scanner operations
pub type ScannerResult<T> = Result<T, ScannerError>;
