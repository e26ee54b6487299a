// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Job Expansion
 * Pairs target records with signatures and resolves fuzz templates
 * against the captured request
 *
 * © 2026 Bountyy Oy
 */

use std::sync::Arc;

use crate::exchange::{HttpRequest, TargetRecord};
use crate::runner::Job;
use crate::signature::{RequestTemplate, Signature};

/// Fill every empty template field from the captured request. Set fields are kept.
pub fn resolve_template(template: &RequestTemplate, origin: &HttpRequest) -> RequestTemplate {
    let mut resolved = template.clone();

    if resolved.method.is_empty() {
        resolved.method = origin.method.clone();
    }
    if resolved.url.is_empty() {
        resolved.url = origin.url.clone();
    }
    if resolved.headers.is_empty() {
        resolved.headers = origin.headers.clone();
    }
    if resolved.body.is_empty() {
        resolved.body = origin.body.clone();
    }

    resolved
}

/// Build the job for one (target, signature) pair
pub fn expand(record: &Arc<TargetRecord>, signature: &Arc<Signature>) -> Job {
    let signature = if signature.is_fuzz() {
        let requests = signature
            .requests
            .iter()
            .map(|template| resolve_template(template, &record.origin_req))
            .collect();

        // New value; the stored signature is shared with other scans
        Arc::new(Signature {
            id: signature.id.clone(),
            kind: signature.kind.clone(),
            info: signature.info.clone(),
            requests,
        })
    } else {
        Arc::clone(signature)
    };

    Job {
        url: record.origin_req.url.clone(),
        signature,
        origin: Arc::clone(record),
    }
}

/// Lazily expand every target × signature pair, targets-major
pub fn expand_all<'a>(
    records: &'a [Arc<TargetRecord>],
    signatures: &'a [Arc<Signature>],
) -> impl Iterator<Item = Job> + 'a {
    records.iter().flat_map(move |record| {
        signatures
            .iter()
            .map(move |signature| expand(record, signature))
    })
}
