// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Bountyy Oy - Scan Orchestration Tests
 * End-to-end tests for validation, expansion and bounded dispatch
 *
 * @copyright 2026 Bountyy Oy
 * @license Proprietary
 */

use rand::Rng;
use sigprobe_scanner::config::ScannerConfig;
use sigprobe_scanner::errors::{JobError, ScannerError};
use sigprobe_scanner::exchange::RawExchange;
use sigprobe_scanner::options::ScanOptions;
use sigprobe_scanner::runner::{Job, JobContext, JobRunner};
use sigprobe_scanner::scanner::Scanner;
use sigprobe_scanner::signature::SignatureId;
use sigprobe_scanner::types::{Severity, Vulnerability};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const RAW_GET: &[u8] = b"GET /a HTTP/1.1\r\nHost: example.com\r\nX: 1\r\n\r\n";

fn signature_set() -> HashMap<SignatureId, String> {
    HashMap::from([
        (
            1,
            r#"
id: reflected-param
type: single
info:
  name: Reflected parameter
  risk: high
requests:
  - method: GET
    url: "{{BaseURL}}?q=probe"
    detections:
      - StatusCode() == 200
"#
            .to_string(),
        ),
        (
            2,
            r#"
id: body-fuzz
type: fuzz
info:
  name: Body fuzz
requests:
  - body: payload
"#
            .to_string(),
        ),
        (
            3,
            r#"
type: list
requests:
  - method: POST
    url: /login
    headers:
      - Content-Type: application/x-www-form-urlencoded
    body: user=admin
"#
            .to_string(),
        ),
    ])
}

/// Counts calls, tracks peak concurrency, reports a 200 for each job
#[derive(Default)]
struct CountingRunner {
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
    max_sleep_ms: u64,
}

impl CountingRunner {
    fn with_jitter(max_sleep_ms: u64) -> Self {
        Self {
            max_sleep_ms,
            ..Default::default()
        }
    }
}

#[async_trait::async_trait]
impl JobRunner for CountingRunner {
    async fn run(&self, _job: Job, ctx: JobContext) -> Result<(), JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let sleep_ms = if self.max_sleep_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_sleep_ms)
        };
        tokio::time::sleep(Duration::from_millis(sleep_ms)).await;

        ctx.report(Duration::from_millis(sleep_ms), 200, None);
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(())
    }
}

fn targets(n: usize) -> Vec<RawExchange> {
    (0..n).map(|_| RawExchange::new(RAW_GET)).collect()
}

#[tokio::test]
async fn test_unknown_signature_aborts_before_dispatch() {
    let runner = Arc::new(CountingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    let err = scanner
        .run_scan(&targets(3), &[1, 42, 2], ScanOptions::new().with_scan_id("unknown"))
        .await
        .unwrap_err();

    match err {
        ScannerError::UnknownSignatures { ids } => assert_eq!(ids, vec![42]),
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    assert!(scanner.get_scan_result("unknown").is_err());
}

#[tokio::test]
async fn test_malformed_base64_aborts_before_dispatch() {
    let runner = Arc::new(CountingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    let mut broken = RawExchange::new(RAW_GET);
    broken.raw_req = "%%% not base64 %%%".to_string();

    let err = scanner
        .run_scan(
            &[RawExchange::new(RAW_GET), broken],
            &[1],
            ScanOptions::new().with_scan_id("broken"),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, ScannerError::Decode { .. }));
    assert!(err.is_input_error());
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_every_pair_runs_exactly_once_with_jitter() {
    let runner = Arc::new(CountingRunner::with_jitter(10));
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    let summary = scanner
        .run_scan(&targets(10), &[1, 2, 3], ScanOptions::new().with_scan_id("jitter"))
        .await
        .unwrap();

    assert_eq!(summary.jobs_planned, 30);
    assert_eq!(summary.jobs_dispatched, 30);
    assert_eq!(summary.jobs_failed, 0);
    assert_eq!(runner.calls.load(Ordering::SeqCst), 30);

    let stats = scanner.get_scan_result("jitter").unwrap();
    assert_eq!(stats.requests_count, 30);
    assert_eq!(stats.status_codes.values().sum::<u64>(), stats.requests_count);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_in_flight_jobs_never_exceed_concurrency() {
    let runner = Arc::new(CountingRunner::with_jitter(5));
    let scanner = Scanner::builder(runner.clone())
        .with_config(ScannerConfig::default().with_concurrency(3))
        .build(&signature_set())
        .unwrap();

    scanner
        .run_scan(&targets(20), &[1, 2, 3], ScanOptions::new().with_scan_id("bounded"))
        .await
        .unwrap();

    assert_eq!(runner.calls.load(Ordering::SeqCst), 60);
    assert!(runner.peak.load(Ordering::SeqCst) <= 3);
}

#[tokio::test]
async fn test_default_pool_is_bounded_at_twenty() {
    let runner = Arc::new(CountingRunner::with_jitter(2));
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();
    assert_eq!(scanner.config().concurrency, 20);

    scanner
        .run_scan(&targets(50), &[1], ScanOptions::new().with_scan_id("default"))
        .await
        .unwrap();

    assert_eq!(runner.calls.load(Ordering::SeqCst), 50);
    assert!(runner.peak.load(Ordering::SeqCst) <= 20);
}

/// Records the first request template each job carries
#[derive(Default)]
struct CapturingRunner {
    jobs: parking_lot::Mutex<Vec<Job>>,
}

#[async_trait::async_trait]
impl JobRunner for CapturingRunner {
    async fn run(&self, job: Job, _ctx: JobContext) -> Result<(), JobError> {
        self.jobs.lock().push(job);
        Ok(())
    }
}

#[tokio::test]
async fn test_fuzz_jobs_inherit_from_captured_request() {
    let runner = Arc::new(CapturingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    scanner
        .run_scan(&targets(1), &[2], ScanOptions::new().with_scan_id("fuzz"))
        .await
        .unwrap();

    let jobs = runner.jobs.lock();
    assert_eq!(jobs.len(), 1);

    let request = &jobs[0].signature.requests[0];
    assert_eq!(jobs[0].url, "http://example.com/a");
    assert_eq!(request.method, "GET");
    assert_eq!(request.url, "http://example.com/a");
    assert_eq!(request.headers.len(), 2);
    assert!(request.headers.iter().any(|h| h.name == "X" && h.value == "1"));
    assert_eq!(request.body, b"payload");

    // Stored signature is untouched
    let stored = scanner.store().lookup(2).unwrap();
    assert!(stored.requests[0].method.is_empty());
}

#[tokio::test]
async fn test_explicit_url_overrides_parsed_target() {
    let runner = Arc::new(CapturingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    scanner
        .run_scan(
            &[RawExchange::new(RAW_GET).with_url("https://override.test/x")],
            &[1],
            ScanOptions::new().with_scan_id("override"),
        )
        .await
        .unwrap();

    assert_eq!(runner.jobs.lock()[0].url, "https://override.test/x");
}

#[tokio::test]
async fn test_explicit_url_lets_hostless_request_scan() {
    let runner = Arc::new(CapturingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();

    let summary = scanner
        .run_scan(
            &[RawExchange::new(b"GET /a HTTP/1.1\r\nX: 1\r\n\r\n").with_url("http://example.com/a")],
            &[1, 2],
            ScanOptions::new().with_scan_id("hostless"),
        )
        .await
        .unwrap();

    assert_eq!(summary.jobs_dispatched, 2);
    let jobs = runner.jobs.lock();
    assert!(jobs.iter().all(|j| j.url == "http://example.com/a"));
    let fuzz = jobs.iter().find(|j| j.signature.is_fuzz()).unwrap();
    assert_eq!(fuzz.signature.requests[0].url, "http://example.com/a");
}

#[tokio::test]
async fn test_binary_captured_body_reaches_fuzz_job_unchanged() {
    let runner = Arc::new(CapturingRunner::default());
    let mut signatures = signature_set();
    signatures.insert(4, "type: fuzz\nrequests:\n  - method: PUT\n".to_string());
    let scanner = Scanner::new(&signatures, runner.clone()).unwrap();

    let mut raw = b"POST /upload HTTP/1.1\r\nHost: example.com\r\n\r\n".to_vec();
    raw.extend_from_slice(&[0x1f, 0x8b, 0xff, 0x00]);

    scanner
        .run_scan(&[RawExchange::new(raw)], &[4], ScanOptions::new().with_scan_id("binary"))
        .await
        .unwrap();

    let jobs = runner.jobs.lock();
    let request = &jobs[0].signature.requests[0];
    assert_eq!(request.method, "PUT");
    assert_eq!(request.body, vec![0x1f, 0x8b, 0xff, 0x00]);
}

struct FlakyRunner;

#[async_trait::async_trait]
impl JobRunner for FlakyRunner {
    async fn run(&self, job: Job, ctx: JobContext) -> Result<(), JobError> {
        match job.signature.id.as_str() {
            "1" => {
                ctx.report(Duration::from_millis(3), 200, None);
                Ok(())
            }
            "2" => Err(JobError::RequestFailed {
                url: job.url,
                reason: "connection reset".to_string(),
            }),
            _ => panic!("detector crashed"),
        }
    }
}

#[tokio::test]
async fn test_runner_errors_and_panics_land_in_error_list() {
    let scanner = Scanner::new(&signature_set(), Arc::new(FlakyRunner)).unwrap();

    let summary = scanner
        .run_scan(&targets(2), &[1, 2, 3], ScanOptions::new().with_scan_id("flaky"))
        .await
        .unwrap();

    assert_eq!(summary.jobs_dispatched, 6);
    assert_eq!(summary.jobs_failed, 4);

    let stats = scanner.get_scan_result("flaky").unwrap();
    assert_eq!(stats.requests_count, 2);
    assert_eq!(stats.errors.len(), 4);
    assert_eq!(
        stats.errors.iter().filter(|e| e.contains("connection reset")).count(),
        2
    );
    assert_eq!(
        stats.errors.iter().filter(|e| e.contains("detector crashed")).count(),
        2
    );
}

/// Cancels the scan from inside the first job
struct CancellingRunner {
    token: CancellationToken,
    calls: AtomicUsize,
}

#[async_trait::async_trait]
impl JobRunner for CancellingRunner {
    async fn run(&self, _job: Job, ctx: JobContext) -> Result<(), JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.token.cancel();
        assert!(ctx.is_cancelled());
        Ok(())
    }
}

#[tokio::test]
async fn test_cancellation_stops_submission() {
    let token = CancellationToken::new();
    let runner = Arc::new(CancellingRunner {
        token: token.clone(),
        calls: AtomicUsize::new(0),
    });
    let scanner = Scanner::builder(runner.clone())
        .with_config(ScannerConfig::default().with_concurrency(1))
        .build(&signature_set())
        .unwrap();

    let summary = scanner
        .run_scan(
            &targets(20),
            &[1],
            ScanOptions::new()
                .with_scan_id("cancel")
                .with_cancellation(token),
        )
        .await
        .unwrap();

    assert!(summary.cancelled);
    assert!(summary.jobs_dispatched < summary.jobs_planned);
    assert_eq!(runner.calls.load(Ordering::SeqCst), summary.jobs_dispatched);
}

struct FindingRunner;

#[async_trait::async_trait]
impl JobRunner for FindingRunner {
    async fn run(&self, job: Job, ctx: JobContext) -> Result<(), JobError> {
        ctx.report_finding(
            Vulnerability::new(
                "",
                1,
                job.signature.name(),
                &job.url,
                Severity::High,
            )
            .with_evidence("reflected"),
        );
        Ok(())
    }
}

#[tokio::test]
async fn test_findings_attach_before_first_report() {
    let scanner = Scanner::new(&signature_set(), Arc::new(FindingRunner)).unwrap();

    scanner
        .run_scan(&targets(1), &[1], ScanOptions::new().with_scan_id("findings"))
        .await
        .unwrap();

    let stats = scanner.get_scan_result("findings").unwrap();
    assert_eq!(stats.requests_count, 0);
    assert_eq!(stats.vulnerabilities.len(), 1);
    assert_eq!(stats.vulnerabilities[0].scan_id, "findings");
    assert_eq!(stats.vulnerabilities[0].signature_name, "Reflected parameter");
}

#[tokio::test]
async fn test_result_round_trip() {
    let scanner = Scanner::new(&signature_set(), Arc::new(CountingRunner::default())).unwrap();

    scanner
        .run_scan(&targets(1), &[1, 3], ScanOptions::new().with_scan_id("round-trip"))
        .await
        .unwrap();

    let stats = scanner.get_scan_result("round-trip").unwrap();
    assert_eq!(stats.scan_id, "round-trip");
    assert_eq!(stats.requests_count, 2);

    scanner.clear_scan_result("round-trip");
    scanner.clear_scan_result("round-trip");
    assert!(matches!(
        scanner.get_scan_result("round-trip"),
        Err(ScannerError::ScanNotFound { .. })
    ));
}

#[tokio::test]
async fn test_update_signatures_applies_to_next_scan() {
    let runner = Arc::new(CountingRunner::default());
    let scanner = Scanner::new(&signature_set(), runner.clone()).unwrap();
    assert!(scanner.plan(&targets(1), &[4]).is_err());

    let mut updated = signature_set();
    updated.insert(4, "requests:\n  - method: HEAD\n".to_string());
    scanner.update_signatures(&updated).unwrap();

    let jobs = scanner.plan(&targets(1), &[4]).unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].signature.requests[0].method, "HEAD");
}
