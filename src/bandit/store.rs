//! Ordered arm-label → posterior mapping.

use indexmap::IndexMap;
use serde::Serialize;

use super::params::Posterior;

/// Posterior records keyed by arm label, iterated in insertion order.
///
/// Re-inserting an existing label replaces its record in place and keeps the
/// original position, so the arm enumeration order never changes once an arm
/// exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PosteriorStore<P> {
    arms: IndexMap<String, P>,
}

impl<P> Default for PosteriorStore<P> {
    fn default() -> Self {
        Self {
            arms: IndexMap::new(),
        }
    }
}

impl<P: Posterior> PosteriorStore<P> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite the record for `label`.
    pub fn insert(&mut self, label: impl Into<String>, mut params: P) {
        params.enforce_floor();
        self.arms.insert(label.into(), params);
    }

    #[must_use]
    pub fn get(&self, label: &str) -> Option<&P> {
        self.arms.get(label)
    }

    pub(crate) fn get_mut(&mut self, label: &str) -> Option<&mut P> {
        self.arms.get_mut(label)
    }

    #[must_use]
    pub fn contains(&self, label: &str) -> bool {
        self.arms.contains_key(label)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.arms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arms.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &P)> {
        self.arms.iter().map(|(label, params)| (label.as_str(), params))
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.arms.keys().map(String::as_str)
    }

    /// Copy of the store with every record rounded for display.
    #[must_use]
    pub fn rounded(&self, places: u32) -> Self {
        Self {
            arms: self
                .arms
                .iter()
                .map(|(label, params)| (label.clone(), params.rounded(places)))
                .collect(),
        }
    }
}

impl<P: Posterior, L: Into<String>> FromIterator<(L, P)> for PosteriorStore<P> {
    fn from_iter<I: IntoIterator<Item = (L, P)>>(iter: I) -> Self {
        let mut store = Self::new();
        for (label, params) in iter {
            store.insert(label, params);
        }
        store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bandit::params::{BetaParams, MIN_PARAM};

    #[test]
    fn insertion_order_is_iteration_order() {
        let store: PosteriorStore<BetaParams> = ["c", "a", "b"]
            .into_iter()
            .map(|label| (label, BetaParams::UNIFORM))
            .collect();
        let labels: Vec<_> = store.labels().collect();
        assert_eq!(labels, vec!["c", "a", "b"]);
    }

    #[test]
    fn overwrite_keeps_position() {
        let mut store = PosteriorStore::new();
        store.insert("first", BetaParams::UNIFORM);
        store.insert("second", BetaParams::UNIFORM);
        store.insert("first", BetaParams { a: 4.0, b: 2.0 });
        assert_eq!(store.len(), 2);
        let (label, params) = store.iter().next().unwrap();
        assert_eq!(label, "first");
        assert_eq!(params.a, 4.0);
    }

    #[test]
    fn insert_enforces_floor() {
        let mut store = PosteriorStore::new();
        store.insert("degenerate", BetaParams { a: 0.0, b: 1.0 });
        assert_eq!(store.get("degenerate").unwrap().a, MIN_PARAM);
    }

    #[test]
    fn serializes_as_ordered_map() {
        let mut store = PosteriorStore::new();
        store.insert("z", BetaParams::UNIFORM);
        store.insert("a", BetaParams { a: 2.0, b: 1.0 });
        let json = serde_json::to_string(&store).unwrap();
        assert_eq!(json, r#"{"z":{"a":1.0,"b":1.0},"a":{"a":2.0,"b":1.0}}"#);
    }
}
