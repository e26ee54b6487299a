// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;

/// Per-scan options handed to every job runner.
///
/// New options are added either as builder methods or through the open
/// `extra` map, so the orchestrator signature never changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOptions {
    #[serde(default)]
    pub scan_id: String,

    /// Compare probe responses against the captured response before reporting
    #[serde(default)]
    pub enable_filtering: bool,

    #[serde(default)]
    pub extra: HashMap<String, serde_json::Value>,

    #[serde(skip)]
    cancellation: Option<CancellationToken>,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scan_id(mut self, scan_id: impl Into<String>) -> Self {
        self.scan_id = scan_id.into();
        self
    }

    pub fn with_filtering(mut self) -> Self {
        self.enable_filtering = true;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    pub fn cancellation(&self) -> Option<&CancellationToken> {
        self.cancellation.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .map(CancellationToken::is_cancelled)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_chain() {
        let options = ScanOptions::new()
            .with_scan_id("scan-42")
            .with_filtering()
            .with_extra("proxy", serde_json::json!("http://127.0.0.1:8080"));

        assert_eq!(options.scan_id, "scan-42");
        assert!(options.enable_filtering);
        assert_eq!(options.extra("proxy").and_then(|v| v.as_str()), Some("http://127.0.0.1:8080"));
        assert!(!options.is_cancelled());
    }

    #[test]
    fn test_cancellation_is_shared_between_clones() {
        let token = CancellationToken::new();
        let options = ScanOptions::new().with_cancellation(token.clone());
        let cloned = options.clone();

        token.cancel();
        assert!(options.is_cancelled());
        assert!(cloned.is_cancelled());
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let options: ScanOptions = serde_json::from_str(r#"{"scanId":"abc"}"#).unwrap();
        assert_eq!(options.scan_id, "abc");
        assert!(!options.enable_filtering);
        assert!(options.extra.is_empty());
        assert!(options.cancellation().is_none());
    }
}
