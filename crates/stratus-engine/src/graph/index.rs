//! ServiceNodeIndex: every node id discovered per service, across the whole scan.

use std::collections::{BTreeMap, BTreeSet};

/// Keyed by service key. Ordered so glob resolution is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceNodeIndex {
    by_service: BTreeMap<String, BTreeSet<String>>,
}

impl ServiceNodeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if the id was already indexed for this service.
    pub fn insert(&mut self, service: &str, id: impl Into<String>) -> bool {
        self.by_service
            .entry(service.to_string())
            .or_default()
            .insert(id.into())
    }

    pub fn ids(&self, service: &str) -> Option<&BTreeSet<String>> {
        self.by_service.get(service)
    }

    pub fn contains(&self, service: &str, id: &str) -> bool {
        self.by_service
            .get(service)
            .is_some_and(|ids| ids.contains(id))
    }

    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.by_service.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_service.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_service.values().all(BTreeSet::is_empty)
    }

    pub fn merge(&mut self, other: ServiceNodeIndex) {
        for (service, ids) in other.by_service {
            self.by_service.entry(service).or_default().extend(ids);
        }
    }
}
