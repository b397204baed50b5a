//! Per-endpoint verdicts.
//!
//! Backed by `DashMap` for lock-free reads from the caller's thread while
//! validations write from the pool.

use crate::validation::endpoint::EndpointKey;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;

/// Outcome recorded for an endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accepted,
    Rejected { reason: String },
}

impl Verdict {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Verdict::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }
}

/// Append-only verdict cache. Clones share the same map.
///
/// One map holds both outcomes, so a key can never be both accepted and
/// rejected. The first verdict for a key is final.
#[derive(Clone, Default)]
pub struct EndpointResultCache {
    entries: Arc<DashMap<EndpointKey, Verdict>>,
}

impl EndpointResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, key: &EndpointKey) -> bool {
        self.record(key, Verdict::Accepted)
    }

    pub fn record_failure(&self, key: &EndpointKey, reason: impl Into<String>) -> bool {
        self.record(key, Verdict::rejected(reason))
    }

    /// Store `verdict` unless `key` already has one. Returns whether it was stored.
    pub fn record(&self, key: &EndpointKey, verdict: Verdict) -> bool {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(existing) => {
                tracing::debug!(
                    endpoint = %key,
                    kept = ?existing.get(),
                    dropped = ?verdict,
                    "verdict already recorded"
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(verdict);
                true
            }
        }
    }

    /// `None` means the endpoint has not been decided yet.
    pub fn lookup(&self, key: &EndpointKey) -> Option<Verdict> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn successes(&self) -> usize {
        self.entries.iter().filter(|e| e.value().is_accepted()).count()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_accepted()).count()
    }
}
