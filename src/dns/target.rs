// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Record targets.

use crate::dns::records::{Record, RecordType};
use std::fmt;
use std::ops::Deref;

/// One record value with its type, TTL and IP stack.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Target {
    /// Record type
    pub record_type: RecordType,
    /// Record value
    pub value: String,
    /// Time to live in seconds
    pub ttl: i64,
    /// IP stack for alias records (`ipv4`, `dual-stack`, `ipv6`), empty if not set
    pub ip_stack: String,
}

impl Target {
    pub fn new(record_type: RecordType, value: impl Into<String>, ttl: i64) -> Self {
        Self {
            record_type,
            value: value.into(),
            ttl,
            ip_stack: String::new(),
        }
    }

    /// Creates a TXT target.
    pub fn text(value: impl Into<String>, ttl: i64) -> Self {
        Self::new(RecordType::TXT, value, ttl)
    }

    /// Creates a target with an IP stack.
    pub fn with_ip_stack(
        record_type: RecordType,
        value: impl Into<String>,
        ttl: i64,
        ip_stack: impl Into<String>,
    ) -> Self {
        Self {
            record_type,
            value: value.into(),
            ttl,
            ip_stack: ip_stack.into(),
        }
    }

    #[must_use]
    pub fn as_record(&self) -> Record {
        Record::new(self.value.clone())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.record_type, self.value)
    }
}

/// An ordered sequence of targets with set-style comparison.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Targets(Vec<Target>);

impl Targets {
    /// Whether a target with the same type, value, IP stack and TTL is present.
    #[must_use]
    pub fn has(&self, target: &Target) -> bool {
        self.0.iter().any(|t| {
            t.record_type == target.record_type
                && t.value == target.value
                && t.ip_stack == target.ip_stack
                && t.ttl == target.ttl
        })
    }

    /// Whether the targets differ from `other`, ignoring order but not duplicates.
    #[must_use]
    pub fn differ_from(&self, other: &Targets) -> bool {
        if self.0.len() != other.0.len() {
            return true;
        }
        let mut mine: Vec<&Target> = self.0.iter().collect();
        let mut theirs: Vec<&Target> = other.0.iter().collect();
        mine.sort_unstable();
        theirs.sort_unstable();
        mine != theirs
    }

    pub fn push(&mut self, target: Target) {
        self.0.push(target);
    }
}

impl Deref for Targets {
    type Target = [Target];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<Vec<Target>> for Targets {
    fn from(targets: Vec<Target>) -> Self {
        Self(targets)
    }
}

impl FromIterator<Target> for Targets {
    fn from_iter<I: IntoIterator<Item = Target>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "target_tests.rs"]
mod target_tests;
