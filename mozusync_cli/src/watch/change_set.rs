//! Paths touched since the last flush

use mozusync_core::events::ChangeKind;
use std::collections::BTreeMap;

/// Path to last change kind; always-included paths carry no kind until touched
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    entries: BTreeMap<String, Option<ChangeKind>>,
    always: Vec<String>,
}

impl ChangeSet {
    pub fn new(always: Vec<String>) -> Self {
        let mut set = Self {
            entries: BTreeMap::new(),
            always,
        };
        set.reset();
        set
    }

    /// Last write wins
    pub fn record(&mut self, path: impl Into<String>, kind: ChangeKind) {
        self.entries.insert(path.into(), Some(kind));
    }

    /// Back to just the always-included paths
    pub fn reset(&mut self) {
        self.entries.clear();
        for path in &self.always {
            self.entries.insert(path.clone(), None);
        }
    }

    /// Paths in sorted order
    pub fn paths(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    pub fn kind(&self, path: &str) -> Option<ChangeKind> {
        self.entries.get(path).copied().flatten()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_last_kind_wins() {
        let mut set = ChangeSet::default();
        set.record("a.js", ChangeKind::Added);
        set.record("a.js", ChangeKind::Changed);

        assert_eq!(set.len(), 1);
        assert_eq!(set.kind("a.js"), Some(ChangeKind::Changed));
    }

    #[test]
    fn test_always_paths_survive_reset() {
        let mut set = ChangeSet::new(vec!["theme.json".to_string()]);
        set.record("b.js", ChangeKind::Changed);
        set.record("theme.json", ChangeKind::Changed);
        assert_eq!(set.paths(), vec!["b.js", "theme.json"]);

        set.reset();
        assert_eq!(set.paths(), vec!["theme.json"]);
        assert_eq!(set.kind("theme.json"), None);
    }

    fn kind() -> impl Strategy<Value = ChangeKind> {
        prop_oneof![
            Just(ChangeKind::Changed),
            Just(ChangeKind::Added),
            Just(ChangeKind::Deleted),
        ]
    }

    proptest! {
        #[test]
        fn prop_paths_are_sorted_and_unique(
            changes in prop::collection::vec(("[a-d]{1,2}\\.js", kind()), 0..40),
            always in prop::collection::vec("[a-d]\\.css", 0..3),
        ) {
            let mut set = ChangeSet::new(always.clone());
            for (path, kind) in &changes {
                set.record(path.clone(), *kind);
            }

            let paths = set.paths();
            let mut expected = paths.clone();
            expected.sort();
            expected.dedup();
            prop_assert_eq!(&paths, &expected);

            for (path, _) in &changes {
                let last = changes.iter().rev().find(|(p, _)| p == path).map(|(_, k)| *k);
                prop_assert_eq!(set.kind(path), last);
            }
            for path in &always {
                prop_assert!(set.contains(path));
            }

            set.reset();
            let mut always_sorted = always.clone();
            always_sorted.sort();
            always_sorted.dedup();
            prop_assert_eq!(set.paths(), always_sorted);
        }
    }
}
