// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

/**
 * Signature Store
 * Atomically swappable snapshot of parsed signatures
 *
 * Readers load the snapshot pointer without taking a lock, so a lookup
 * never waits on a concurrent replace. Writers parse the full replacement
 * first and only then swap the pointer, so a failed parse never touches
 * the active set.
 *
 * © 2026 Bountyy Oy
 */

use arc_swap::ArcSwap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::model::{Signature, SignatureId};
use super::parser::SignatureParser;
use crate::errors::{ScannerError, ScannerResult};

/// Immutable set of parsed signatures keyed by id
#[derive(Debug, Default)]
pub struct SignatureSet {
    signatures: HashMap<SignatureId, Arc<Signature>>,
}

impl SignatureSet {
    pub fn get(&self, id: SignatureId) -> Option<Arc<Signature>> {
        self.signatures.get(&id).cloned()
    }

    /// Resolve ids in request order. On any miss, returns every missing id instead.
    pub fn resolve(&self, ids: &[SignatureId]) -> Result<Vec<Arc<Signature>>, Vec<SignatureId>> {
        let mut resolved = Vec::with_capacity(ids.len());
        let mut unknown: Vec<SignatureId> = Vec::new();

        for &id in ids {
            match self.signatures.get(&id) {
                Some(signature) => resolved.push(Arc::clone(signature)),
                None if !unknown.contains(&id) => unknown.push(id),
                None => {}
            }
        }

        if unknown.is_empty() {
            Ok(resolved)
        } else {
            Err(unknown)
        }
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }

    /// Sorted ids
    pub fn ids(&self) -> Vec<SignatureId> {
        let mut ids: Vec<_> = self.signatures.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}

pub struct SignatureStore {
    active: ArcSwap<SignatureSet>,
    parser: Arc<dyn SignatureParser>,
}

impl std::fmt::Debug for SignatureStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureStore")
            .field("signatures", &self.active.load().len())
            .finish()
    }
}

impl SignatureStore {
    /// Parse every signature and install the result as the active snapshot
    pub fn load(
        signatures: &HashMap<SignatureId, String>,
        parser: Arc<dyn SignatureParser>,
    ) -> ScannerResult<Self> {
        let set = build_set(parser.as_ref(), signatures)?;
        info!("Loaded {} signatures", set.len());

        Ok(Self {
            active: ArcSwap::from_pointee(set),
            parser,
        })
    }

    /// Parse a full replacement set and swap it in. The old set stays active on failure.
    pub fn replace(&self, signatures: &HashMap<SignatureId, String>) -> ScannerResult<()> {
        let set = match build_set(self.parser.as_ref(), signatures) {
            Ok(set) => set,
            Err(e) => {
                warn!("Signature replacement rejected: {}", e);
                return Err(e);
            }
        };

        let count = set.len();
        self.active.store(Arc::new(set));
        info!("Replaced active signature set ({} signatures)", count);
        Ok(())
    }

    /// Consistent view of the active set
    pub fn snapshot(&self) -> Arc<SignatureSet> {
        self.active.load_full()
    }

    pub fn lookup(&self, id: SignatureId) -> Option<Arc<Signature>> {
        self.active.load().get(id)
    }

    pub fn len(&self) -> usize {
        self.active.load().len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.load().is_empty()
    }

    pub fn ids(&self) -> Vec<SignatureId> {
        self.active.load().ids()
    }
}

fn build_set(
    parser: &dyn SignatureParser,
    signatures: &HashMap<SignatureId, String>,
) -> ScannerResult<SignatureSet> {
    // Sorted so the reported failure is deterministic
    let mut ids: Vec<_> = signatures.keys().copied().collect();
    ids.sort_unstable();

    let mut parsed = HashMap::with_capacity(ids.len());
    for id in ids {
        let content = &signatures[&id];
        let mut signature = parser
            .parse(content)
            .map_err(|e| ScannerError::SignatureParse {
                id,
                reason: e.to_string(),
            })?;

        if !signature.id.is_empty() && signature.id != id.to_string() {
            debug!("Re-keying signature '{}' as {}", signature.id, id);
        }
        signature.id = id.to_string();
        parsed.insert(id, Arc::new(signature));
    }

    Ok(SignatureSet { signatures: parsed })
}
