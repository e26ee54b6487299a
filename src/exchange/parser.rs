// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Raw HTTP Exchange Parser
 * Parses Burp-style raw request/response dumps into structured messages
 *
 * © 2026 Bountyy Oy
 */

use tracing::debug;
use url::Url;

use super::message::{HttpRequest, HttpResponse};
use crate::errors::{ScannerError, ScannerResult};
use crate::signature::Header;

/// Turns decoded raw exchange bytes into structured messages
pub trait ExchangeParser: Send + Sync {
    /// A non-empty `url_override` becomes the request URL and replaces URL derivation entirely
    fn parse_request(&self, raw: &[u8], url_override: Option<&str>) -> ScannerResult<HttpRequest>;

    /// The originating request is available for parsers that need it to interpret the response
    fn parse_response(&self, raw_request: &[u8], raw_response: &[u8]) -> ScannerResult<HttpResponse>;
}

/// Default parser for HTTP/1.x wire-format dumps
#[derive(Debug, Default, Clone)]
pub struct RawHttpParser;

impl RawHttpParser {
    pub fn new() -> Self {
        Self
    }

    fn build_url(target: &str, headers: &[Header]) -> ScannerResult<String> {
        let url = if target.starts_with("http://") || target.starts_with("https://") {
            target.to_string()
        } else {
            let host = headers
                .iter()
                .find(|h| h.name.eq_ignore_ascii_case("host"))
                .map(|h| h.value.trim())
                .filter(|h| !h.is_empty())
                .ok_or_else(|| {
                    ScannerError::ExchangeParse(format!(
                        "request target '{}' is relative and no Host header is present",
                        target
                    ))
                })?;

            let scheme = if host.ends_with(":443") { "https" } else { "http" };
            if target.starts_with('/') {
                format!("{}://{}{}", scheme, host, target)
            } else {
                format!("{}://{}/{}", scheme, host, target)
            }
        };

        Url::parse(&url)
            .map_err(|e| ScannerError::ExchangeParse(format!("invalid URL '{}': {}", url, e)))?;

        Ok(url)
    }
}

impl ExchangeParser for RawHttpParser {
    fn parse_request(&self, raw: &[u8], url_override: Option<&str>) -> ScannerResult<HttpRequest> {
        let (head, body) = split_message(raw);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines().map(|l| l.trim_end_matches('\r'));

        let request_line = lines
            .by_ref()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| ScannerError::ExchangeParse("empty request".to_string()))?;

        let mut parts = request_line.split_whitespace();
        let (method, target) = match (parts.next(), parts.next()) {
            (Some(method), Some(target)) => (method, target),
            _ => {
                return Err(ScannerError::ExchangeParse(format!(
                    "malformed request line: '{}'",
                    request_line
                )))
            }
        };

        let headers = parse_headers(lines);
        let url = match url_override.filter(|u| !u.is_empty()) {
            Some(url) => url.to_string(),
            None => Self::build_url(target, &headers)?,
        };

        Ok(HttpRequest {
            method: method.to_ascii_uppercase(),
            url,
            headers,
            body: body.to_vec(),
        })
    }

    fn parse_response(&self, _raw_request: &[u8], raw_response: &[u8]) -> ScannerResult<HttpResponse> {
        let (head, body) = split_message(raw_response);
        let head = String::from_utf8_lossy(head);
        let mut lines = head.lines().map(|l| l.trim_end_matches('\r'));

        let status_line = lines
            .by_ref()
            .find(|l| !l.trim().is_empty())
            .ok_or_else(|| ScannerError::ExchangeParse("empty response".to_string()))?;

        let mut parts = status_line.splitn(3, ' ');
        let version = parts.next().unwrap_or_default();
        if !version.starts_with("HTTP/") {
            return Err(ScannerError::ExchangeParse(format!(
                "malformed status line: '{}'",
                status_line
            )));
        }

        let status_code = parts
            .next()
            .and_then(|code| code.trim().parse::<u16>().ok())
            .ok_or_else(|| {
                ScannerError::ExchangeParse(format!("invalid status code in '{}'", status_line))
            })?;

        Ok(HttpResponse {
            status_code,
            status: parts.next().unwrap_or_default().trim().to_string(),
            headers: parse_headers(lines),
            body: body.to_vec(),
        })
    }
}

/// Split at the first blank line. Accepts CRLF and bare LF framing. The body is left untouched.
fn split_message(raw: &[u8]) -> (&[u8], &[u8]) {
    let crlf = find(raw, b"\r\n\r\n").map(|i| (i, 4));
    let lf = find(raw, b"\n\n").map(|i| (i, 2));

    let split = match (crlf, lf) {
        (Some(a), Some(b)) => Some(if a.0 <= b.0 { a } else { b }),
        (a, b) => a.or(b),
    };

    match split {
        Some((index, len)) => (&raw[..index], &raw[index + len..]),
        None => (raw, &raw[raw.len()..]),
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn parse_headers<'a>(lines: impl Iterator<Item = &'a str>) -> Vec<Header> {
    let mut headers = Vec::new();
    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        match line.split_once(':') {
            Some((name, value)) => headers.push(Header::new(name.trim(), value.trim())),
            None => debug!("Skipping malformed header line: {}", line),
        }
    }
    headers
}
