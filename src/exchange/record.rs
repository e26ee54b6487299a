// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use super::message::{HttpRequest, HttpResponse};
use super::parser::ExchangeParser;
use crate::errors::{ScannerError, ScannerResult};

/// Caller-supplied captured exchange, base64-encoded as captured on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawExchange {
    pub raw_req: String,
    #[serde(default)]
    pub raw_res: Option<String>,
    /// Overrides the URL parsed from the raw request
    #[serde(default)]
    pub url: Option<String>,
}

impl RawExchange {
    pub fn new(raw_request: impl AsRef<[u8]>) -> Self {
        Self {
            raw_req: BASE64.encode(raw_request),
            raw_res: None,
            url: None,
        }
    }

    pub fn with_response(mut self, raw_response: impl AsRef<[u8]>) -> Self {
        self.raw_res = Some(BASE64.encode(raw_response));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Parsed form of one captured exchange
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetRecord {
    pub origin_req: HttpRequest,
    pub origin_res: Option<HttpResponse>,
}

impl TargetRecord {
    pub fn from_exchange(exchange: &RawExchange, parser: &dyn ExchangeParser) -> ScannerResult<Self> {
        let raw_req = BASE64
            .decode(exchange.raw_req.trim())
            .map_err(|source| ScannerError::Decode {
                field: "rawReq",
                source,
            })?;

        let url_override = exchange.url.as_deref().filter(|u| !u.is_empty());
        let origin_req = parser.parse_request(&raw_req, url_override)?;

        let origin_res = match exchange.raw_res.as_deref().map(str::trim) {
            Some(encoded) if !encoded.is_empty() => {
                let raw_res = BASE64.decode(encoded).map_err(|source| ScannerError::Decode {
                    field: "rawRes",
                    source,
                })?;
                Some(parser.parse_response(&raw_req, &raw_res)?)
            }
            _ => None,
        };

        Ok(Self {
            origin_req,
            origin_res,
        })
    }

    pub fn url(&self) -> &str {
        &self.origin_req.url
    }
}
