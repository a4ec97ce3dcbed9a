// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Sorted set of unique strings.

use std::collections::BTreeSet;

/// A set of strings with sorted iteration order.
///
/// [`UniqueStrings::to_vec`] is stable for equal contents, so entry fields built from it
/// do not change between reconciliations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UniqueStrings(BTreeSet<String>);

impl UniqueStrings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a string, returns whether it was new.
    pub fn add(&mut self, s: impl Into<String>) -> bool {
        self.0.insert(s.into())
    }

    /// Removes a string, returns whether it was present.
    pub fn remove(&mut self, s: &str) -> bool {
        self.0.remove(s)
    }

    #[must_use]
    pub fn contains(&self, s: &str) -> bool {
        self.0.contains(s)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Sorted copy of the strings.
    #[must_use]
    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }

    /// Sorted strings contained in `self` but not in `other`.
    #[must_use]
    pub fn difference(&self, other: &UniqueStrings) -> Vec<String> {
        self.0.difference(&other.0).cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for UniqueStrings {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
#[path = "unique_strings_tests.rs"]
mod unique_strings_tests;
