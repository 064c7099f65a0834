//! [`ObservationStore`] – last observed modifier per perceived symbol.
//!
//! Last write wins; no history and no cross-key atomicity.

use std::collections::BTreeMap;

use dashmap::DashMap;

#[derive(Debug, Default)]
pub struct ObservationStore {
    latest: DashMap<String, String>,
}

impl ObservationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `modifier` as the latest observation of `symbol`.
    pub fn observe(&self, symbol: &str, modifier: &str) {
        self.latest.insert(symbol.to_string(), modifier.to_string());
    }

    pub fn latest(&self, symbol: &str) -> Option<String> {
        self.latest.get(symbol).map(|m| m.value().clone())
    }

    /// Ordered copy of every observation.
    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.latest
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn observation_overwrites_previous_value() {
        let store = ObservationStore::new();
        store.observe("face", "smile");
        store.observe("face", "frown");
        assert_eq!(store.latest("face").as_deref(), Some("frown"));
        assert_eq!(store.snapshot().len(), 1);
    }

    #[test]
    fn unknown_symbol_has_no_observation() {
        assert!(ObservationStore::new().latest("distance").is_none());
    }

    #[test]
    fn snapshot_is_ordered_by_symbol() {
        let store = ObservationStore::new();
        store.observe("touch", "head");
        store.observe("distance", "near");
        let keys: Vec<_> = store.snapshot().into_keys().collect();
        assert_eq!(keys, vec!["distance".to_string(), "touch".to_string()]);
    }
}
