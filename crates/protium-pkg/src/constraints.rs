//! Recorded version constraints, one per package name.

use std::collections::btree_map;
use std::collections::BTreeMap;

/// Package name to version-specifier expression (e.g. `==1.2.0`).
///
/// Exclusively owned and mutated by
/// [`PackageInstaller`](crate::PackageInstaller): entries are overwritten
/// with exact pins after every successful install and are never removed
/// except explicitly. Iteration order is deterministic.
#[derive(Debug, Clone, Default)]
pub struct ConstraintStore {
    entries: BTreeMap<String, String>,
}

impl ConstraintStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded specifier for a package, if any.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(name).map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Record or overwrite the specifier for a package.
    pub fn set(&mut self, name: impl Into<String>, specifier: impl Into<String>) {
        self.entries.insert(name.into(), specifier.into());
    }

    /// Drop the entry for a package, returning the old specifier.
    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.entries.remove(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, String, String> {
        self.entries.iter()
    }

    /// The assembled constraint list: one `<name><specifier>` expression
    /// per recorded entry, in name order.
    pub fn snapshot(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|(name, specifier)| format!("{name}{specifier}"))
            .collect()
    }
}

impl<'a> IntoIterator for &'a ConstraintStore {
    type Item = (&'a String, &'a String);
    type IntoIter = btree_map::Iter<'a, String, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
