// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

use crate::signature::Header;

/// Bodies are raw bytes; captured payloads are not guaranteed to be UTF-8
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpRequest {
    pub method: String,
    pub url: String,
    pub headers: Vec<Header>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
}

impl HttpRequest {
    /// First header value matching `name`, case-insensitive
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpResponse {
    pub status_code: u16,
    pub status: String,
    pub headers: Vec<Header>,
    #[serde(with = "body_base64")]
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.eq_ignore_ascii_case(name))
        .map(|h| h.value.as_str())
}

/// Serde adapter carrying message bodies as standard base64 strings
pub mod body_base64 {
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(body: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64.encode(body))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        BASE64
            .decode(encoded.trim())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_body_survives_json() {
        let request = HttpRequest {
            method: "POST".to_string(),
            url: "http://example.com/upload".to_string(),
            headers: vec![Header::new("Content-Encoding", "gzip")],
            body: vec![0x1f, 0x8b, 0xff, 0x00],
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["body"], "H4v/AA==");

        let back: HttpRequest = serde_json::from_value(json).unwrap();
        assert_eq!(back, request);
    }
}
