// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Signature Parser
 * Turns raw signature definitions into structured signatures
 *
 * The YAML parser only extracts structure (kind, info, request templates).
 * Detection expressions are passed through verbatim for the job runner.
 *
 * © 2026 Bountyy Oy
 */

use serde::Deserialize;
use serde_yaml::Value;
use thiserror::Error;

use super::model::{Header, RequestTemplate, Signature, SignatureInfo, SignatureKind};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("YAML syntax error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("signature defines no requests")]
    MissingRequests,

    #[error("request #{index}: {reason}")]
    InvalidRequest { index: usize, reason: String },
}

/// Parses one raw signature definition
pub trait SignatureParser: Send + Sync {
    fn parse(&self, content: &str) -> Result<Signature, ParseError>;
}

#[derive(Debug, Deserialize)]
struct RawSignature {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    info: RawInfo,
    #[serde(default)]
    requests: Option<Vec<RawRequest>>,
}

#[derive(Debug, Default, Deserialize)]
struct RawInfo {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    risk: Option<String>,
    #[serde(default)]
    confidence: Option<String>,
    #[serde(default)]
    category: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    #[serde(default)]
    method: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    headers: Option<Vec<serde_yaml::Mapping>>,
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    detections: Option<Vec<String>>,
}

/// Default parser for YAML signature documents
#[derive(Debug, Default, Clone)]
pub struct YamlSignatureParser;

impl YamlSignatureParser {
    pub fn new() -> Self {
        Self
    }

    fn convert_request(index: usize, raw: RawRequest) -> Result<RequestTemplate, ParseError> {
        let mut headers = Vec::new();
        for entry in raw.headers.unwrap_or_default() {
            for (name, value) in entry {
                let name = scalar_to_string(&name).ok_or_else(|| ParseError::InvalidRequest {
                    index,
                    reason: "header name must be a scalar".to_string(),
                })?;
                let value = scalar_to_string(&value).ok_or_else(|| ParseError::InvalidRequest {
                    index,
                    reason: format!("header '{}' must have a scalar value", name),
                })?;
                headers.push(Header::new(name, value));
            }
        }

        let body = match raw.body {
            None => Vec::new(),
            Some(value) => scalar_to_string(&value)
                .map(String::into_bytes)
                .ok_or_else(|| ParseError::InvalidRequest {
                    index,
                    reason: "body must be a scalar".to_string(),
                })?,
        };

        Ok(RequestTemplate {
            method: raw.method.unwrap_or_default().trim().to_ascii_uppercase(),
            url: raw.url.unwrap_or_default(),
            headers,
            body,
            detections: raw.detections.unwrap_or_default(),
        })
    }
}

impl SignatureParser for YamlSignatureParser {
    fn parse(&self, content: &str) -> Result<Signature, ParseError> {
        let raw: RawSignature = serde_yaml::from_str(content)?;

        let raw_requests = match raw.requests {
            Some(requests) if !requests.is_empty() => requests,
            _ => return Err(ParseError::MissingRequests),
        };

        let requests = raw_requests
            .into_iter()
            .enumerate()
            .map(|(index, request)| Self::convert_request(index, request))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Signature {
            id: raw.id.unwrap_or_default(),
            kind: raw.kind.as_deref().map(SignatureKind::from).unwrap_or_default(),
            info: SignatureInfo {
                name: raw.info.name.unwrap_or_default(),
                risk: raw.info.risk.unwrap_or_default(),
                confidence: raw.info.confidence.unwrap_or_default(),
                category: raw.info.category.unwrap_or_default(),
            },
            requests,
        })
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null => Some(String::new()),
        _ => None,
    }
}
