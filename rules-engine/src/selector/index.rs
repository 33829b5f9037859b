//! Selector index
//! ==============
//! Built once while the engine loads its signatures, read-only afterwards.
//!
//! Entries are bucketed by `source → name`, where `name` is either a literal
//! event name or `*`. A lookup touches at most two buckets (the literal name
//! and the wildcard) and then filters by origin, so its cost depends on the
//! number of interested signatures, not on the total number of selectors.

use std::collections::{BTreeSet, HashMap, HashSet};

use shared::SignatureEventSelector;
use shared::constants::ALL_EVENT_TYPES;

use super::{NativeSelector, NormalizedSelector, OriginFilter};

/// Position of an active signature in the engine's load order.
pub type SignatureId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IndexEntry {
    signature: SignatureId,
    origin: OriginFilter,
}

#[derive(Debug, Default)]
pub struct SelectorIndex {
    buckets: HashMap<String, HashMap<String, Vec<IndexEntry>>>,
    interest: HashSet<SignatureEventSelector>,
}

impl SelectorIndex {
    pub fn insert(&mut self, signature: SignatureId, selector: &NormalizedSelector) {
        self.buckets
            .entry(selector.source.clone())
            .or_default()
            .entry(selector.name.clone())
            .or_default()
            .push(IndexEntry { signature, origin: selector.origin });
        self.interest.insert(selector.into());
    }

    /// Signatures subscribed to `native`, once per matching selector.
    ///
    /// A signature that declared both the literal name and `*` for the same
    /// source appears twice.
    pub fn lookup(&self, native: &NativeSelector<'_>) -> Vec<SignatureId> {
        let Some(by_name) = self.buckets.get(native.source) else {
            return Vec::new();
        };

        let exact = (native.name != ALL_EVENT_TYPES)
            .then(|| by_name.get(native.name))
            .flatten();
        let wildcard = by_name.get(ALL_EVENT_TYPES);

        exact
            .into_iter()
            .chain(wildcard)
            .flatten()
            .filter(|e| e.origin.admits(native.origin))
            .map(|e| e.signature)
            .collect()
    }

    /// Every signature with at least one selector on `source`.
    pub fn subscribers(&self, source: &str) -> BTreeSet<SignatureId> {
        self.buckets
            .get(source)
            .into_iter()
            .flat_map(|by_name| by_name.values().flatten())
            .map(|e| e.signature)
            .collect()
    }

    /// Deduplicated union of every indexed selector, with wildcards spelled `*`.
    pub fn interest(&self) -> &HashSet<SignatureEventSelector> {
        &self.interest
    }
}
