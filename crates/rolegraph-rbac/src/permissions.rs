//! Permission sets.
//!
//! A permission is an opaque string capability. Membership is the only
//! thing that matters, so the set keeps names sorted for stable snapshots
//! and readable `Debug` output.

use std::collections::BTreeSet;
use std::collections::btree_set;

use serde::{Deserialize, Serialize};

/// Set of permission names granted to a role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionSet {
    permissions: BTreeSet<String>,
}

impl PermissionSet {
    /// Creates an empty permission set.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns whether this set contains the given permission.
    pub fn contains(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }

    /// Returns whether this set contains every given permission.
    ///
    /// An empty list is vacuously contained.
    pub fn contains_all(&self, permissions: &[&str]) -> bool {
        permissions.iter().all(|p| self.contains(p))
    }

    /// Adds a permission. Returns `false` if it was already present.
    pub fn insert(&mut self, permission: impl Into<String>) -> bool {
        self.permissions.insert(permission.into())
    }

    /// Removes a permission. Returns `false` if it was absent.
    pub fn remove(&mut self, permission: &str) -> bool {
        self.permissions.remove(permission)
    }

    /// Adds every permission of `other` to this set.
    pub fn union_with(&mut self, other: &PermissionSet) {
        self.permissions.extend(other.permissions.iter().cloned());
    }

    /// Returns all permissions in the set, in name order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.permissions.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.permissions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for PermissionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            permissions: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> From<Vec<S>> for PermissionSet {
    fn from(permissions: Vec<S>) -> Self {
        permissions.into_iter().collect()
    }
}

impl IntoIterator for PermissionSet {
    type Item = String;
    type IntoIter = btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.into_iter()
    }
}

impl<'a> IntoIterator for &'a PermissionSet {
    type Item = &'a String;
    type IntoIter = btree_set::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.permissions.iter()
    }
}
