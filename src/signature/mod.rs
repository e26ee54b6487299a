// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Signature Module
 * Signature model, parsing and the hot-swappable signature store
 *
 * © 2026 Bountyy Oy
 */

pub mod model;
pub mod parser;
pub mod store;

pub use model::{Header, RequestTemplate, Signature, SignatureId, SignatureInfo, SignatureKind};
pub use parser::{ParseError, SignatureParser, YamlSignatureParser};
pub use store::{SignatureSet, SignatureStore};
