// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

use serde::{Deserialize, Serialize};

/// Dense numeric key a signature is registered under
pub type SignatureId = u32;

/// Expansion kind of a signature
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SignatureKind {
    #[default]
    Single,
    List,
    /// Templates are partial and inherit missing fields from the captured request
    Fuzz,
    Other(String),
}

impl SignatureKind {
    pub fn as_str(&self) -> &str {
        match self {
            SignatureKind::Single => "single",
            SignatureKind::List => "list",
            SignatureKind::Fuzz => "fuzz",
            SignatureKind::Other(kind) => kind,
        }
    }
}

impl From<&str> for SignatureKind {
    fn from(kind: &str) -> Self {
        match kind.trim().to_ascii_lowercase().as_str() {
            "" | "single" => SignatureKind::Single,
            "list" => SignatureKind::List,
            "fuzz" => SignatureKind::Fuzz,
            other => SignatureKind::Other(other.to_string()),
        }
    }
}

impl From<String> for SignatureKind {
    fn from(kind: String) -> Self {
        SignatureKind::from(kind.as_str())
    }
}

impl From<SignatureKind> for String {
    fn from(kind: SignatureKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for SignatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// One probe request of a signature. Empty fields mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestTemplate {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub headers: Vec<Header>,
    #[serde(default, with = "crate::exchange::message::body_base64")]
    pub body: Vec<u8>,
    /// Detection expressions, evaluated by the job runner
    #[serde(default)]
    pub detections: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub risk: String,
    #[serde(default)]
    pub confidence: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    pub id: String,
    pub kind: SignatureKind,
    pub info: SignatureInfo,
    pub requests: Vec<RequestTemplate>,
}

impl Signature {
    pub fn is_fuzz(&self) -> bool {
        self.kind == SignatureKind::Fuzz
    }

    /// Display name, falling back to the id
    pub fn name(&self) -> &str {
        if self.info.name.is_empty() {
            &self.id
        } else {
            &self.info.name
        }
    }
}
