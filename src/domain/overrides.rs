use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Requirement ids the user has manually marked as fulfilled.
///
/// An override short-circuits evaluation of the requirement it names, and
/// only that requirement: ancestors and descendants are still evaluated on
/// their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Overrides(BTreeSet<String>);

impl Overrides {
    /// An empty override set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeSet::new())
    }

    /// Whether `id` has been manually fulfilled.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Mark `id` as manually fulfilled.
    ///
    /// Returns `true` if the override was not already present.
    pub fn fulfill(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    /// Remove a manual fulfillment.
    ///
    /// Returns `true` if the override was present.
    pub fn unfulfill(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    /// Iterate over overridden ids in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Number of overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for Overrides {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::Overrides;

    #[test]
    fn fulfill_and_unfulfill_report_changes() {
        let mut overrides = Overrides::new();
        assert!(overrides.fulfill("elwr"));
        assert!(!overrides.fulfill("elwr"));
        assert!(overrides.contains("elwr"));
        assert!(overrides.unfulfill("elwr"));
        assert!(!overrides.unfulfill("elwr"));
        assert!(overrides.is_empty());
    }

    #[test]
    fn serializes_as_sorted_list() {
        let overrides: Overrides = ["b", "a"].into_iter().collect();
        assert_eq!(serde_yaml::to_string(&overrides).unwrap(), "- a\n- b\n");
    }
}
