// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS records and record sets.
//!
//! A [`RecordSet`] is the set of records of one type for one DNS name. Record order is
//! not significant: [`RecordSet::matches`] compares records by value.
//!
//! Alias record types (`ALIAS`, `ALIAS_AAAA`) carry no TTL of their own at the provider,
//! so their TTL is ignored when comparing record sets.

use crate::dns::routing_policy::RoutingPolicy;
use crate::dns::target::Targets;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

/// TTL of record sets created for TXT attributes
pub const ATTR_RECORD_SET_TTL: i64 = 600;

/// DNS record type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    /// Name server record
    #[serde(rename = "NS")]
    NS,
    /// Text record
    #[serde(rename = "TXT")]
    TXT,
    /// Canonical name record
    #[serde(rename = "CNAME")]
    CNAME,
    /// IPv4 address record
    #[serde(rename = "A")]
    A,
    /// IPv6 address record
    #[serde(rename = "AAAA")]
    AAAA,
    /// Provider specific alias for a CNAME (AWS alias target A)
    #[serde(rename = "ALIAS")]
    AliasA,
    /// Provider specific alias for a CNAME (AWS alias target AAAA)
    #[serde(rename = "ALIAS_AAAA")]
    AliasAAAA,
}

impl RecordType {
    /// Wire name of the record type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::NS => "NS",
            RecordType::TXT => "TXT",
            RecordType::CNAME => "CNAME",
            RecordType::A => "A",
            RecordType::AAAA => "AAAA",
            RecordType::AliasA => "ALIAS",
            RecordType::AliasAAAA => "ALIAS_AAAA",
        }
    }

    /// Whether the type is a provider specific alias type without own TTL.
    #[must_use]
    pub fn is_alias(self) -> bool {
        matches!(self, RecordType::AliasA | RecordType::AliasAAAA)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single record value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Record value, e.g. an IP address or a host name
    pub value: String,
}

impl Record {
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
        }
    }
}

fn sorted_values(records: &[Record]) -> Vec<&str> {
    let mut values: Vec<&str> = records.iter().map(|r| r.value.as_str()).collect();
    values.sort_unstable();
    values
}

/// The records of one type for one DNS name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Record type
    #[serde(rename = "type")]
    pub type_: RecordType,
    /// Time to live in seconds
    pub ttl: i64,
    /// Skip TTL comparison (provider does not report TTLs)
    #[serde(default)]
    pub ignore_ttl: bool,
    /// Record values
    #[serde(default)]
    pub records: Vec<Record>,
    /// Optional routing policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<RoutingPolicy>,
}

impl RecordSet {
    /// Creates a record set without routing policy.
    #[must_use]
    pub fn new(type_: RecordType, ttl: i64, records: Vec<Record>) -> Self {
        Self {
            type_,
            ttl,
            ignore_ttl: false,
            records,
            routing_policy: None,
        }
    }

    /// Creates a record set from plain values.
    #[must_use]
    pub fn from_values<S: AsRef<str>>(type_: RecordType, ttl: i64, values: &[S]) -> Self {
        Self::new(
            type_,
            ttl,
            values.iter().map(|v| Record::new(v.as_ref())).collect(),
        )
    }

    /// Sets the routing policy.
    #[must_use]
    pub fn with_routing_policy(mut self, policy: Option<RoutingPolicy>) -> Self {
        self.routing_policy = policy;
        self
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the set has no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends records.
    pub fn add(&mut self, records: impl IntoIterator<Item = Record>) -> &mut Self {
        self.records.extend(records);
        self
    }

    /// Compares two record sets.
    ///
    /// Record sets match if they hold the same record values with the same
    /// multiplicity, the routing policies are equal, and the TTLs are equal. TTLs are not
    /// compared for alias types or if either side ignores TTLs.
    #[must_use]
    pub fn matches(&self, other: &RecordSet) -> bool {
        if self.records.len() != other.records.len() {
            return false;
        }

        if !self.type_.is_alias() && !self.ignore_ttl && !other.ignore_ttl && self.ttl != other.ttl
        {
            return false;
        }

        if sorted_values(&self.records) != sorted_values(&other.records) {
            return false;
        }

        self.routing_policy == other.routing_policy
    }

    /// Computes the changes needed to turn `other` into `self`.
    ///
    /// Returns the records only in `self` (new), the records in both sets if the TTLs
    /// differ (update), and the records only in `other` (delete).
    #[must_use]
    pub fn diff_to(&self, other: &RecordSet) -> (Vec<Record>, Vec<Record>, Vec<Record>) {
        let mut new = Vec::new();
        let mut update = Vec::new();
        for r in &self.records {
            if other.records.iter().any(|o| o.value == r.value) {
                if self.ttl != other.ttl {
                    update.push(r.clone());
                }
            } else {
                new.push(r.clone());
            }
        }
        let delete = other
            .records
            .iter()
            .filter(|o| !self.records.iter().any(|r| r.value == o.value))
            .cloned()
            .collect();
        (new, update, delete)
    }

    /// Returns a TXT attribute value stored as `"name=value"`, or an empty string.
    #[must_use]
    pub fn get_attr(&self, name: &str) -> String {
        if self.type_ != RecordType::TXT {
            return String::new();
        }
        let prefix = attr_key_prefix(name);
        self.records
            .iter()
            .find_map(|r| {
                r.value
                    .strip_prefix(&prefix)
                    .map(|rest| rest.strip_suffix('"').unwrap_or(rest).to_string())
            })
            .unwrap_or_default()
    }

    /// Sets a TXT attribute, replacing an existing one of the same name.
    pub fn set_attr(&mut self, name: &str, value: &str) {
        let prefix = attr_key_prefix(name);
        let attr = attr_value(name, value);
        match self.records.iter_mut().find(|r| r.value.starts_with(&prefix)) {
            Some(record) => record.value = attr,
            None => self.records.push(Record::new(attr)),
        }
    }

    /// Deletes a TXT attribute.
    pub fn delete_attr(&mut self, name: &str) {
        let prefix = attr_key_prefix(name);
        if let Some(pos) = self.records.iter().position(|r| r.value.starts_with(&prefix)) {
            self.records.remove(pos);
        }
    }

    /// Creates a TXT record set holding a single attribute.
    #[must_use]
    pub fn new_attr(name: &str, value: &str) -> Self {
        Self::new(
            RecordType::TXT,
            ATTR_RECORD_SET_TTL,
            vec![Record::new(attr_value(name, value))],
        )
    }

    /// Human readable list of the record values.
    #[must_use]
    pub fn record_string(&self) -> String {
        if self.records.is_empty() {
            return "no records".to_string();
        }
        format!(
            "[{}]",
            self.records
                .iter()
                .map(|r| r.value.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl fmt::Display for RecordSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<&str> = self.records.iter().map(|r| r.value.as_str()).collect();
        f.write_str(&values.join(","))
    }
}

fn attr_key_prefix(name: &str) -> String {
    format!("\"{name}=")
}

fn attr_value(name: &str, value: &str) -> String {
    format!("\"{name}={value}\"")
}

/// Record sets of one DNS name, keyed by record type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSets(BTreeMap<RecordType, RecordSet>);

impl RecordSets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a record, creating the record set of the type with the given TTL if needed.
    pub fn add_record(&mut self, type_: RecordType, value: &str, ttl: i64) {
        self.0
            .entry(type_)
            .or_insert_with(|| RecordSet::new(type_, ttl, Vec::new()))
            .records
            .push(Record::new(value));
    }

    /// Groups targets into record sets by record type.
    ///
    /// The TTL of a record set is the TTL of the first target of its type.
    #[must_use]
    pub fn from_targets(targets: &Targets) -> Self {
        let mut sets = Self::new();
        for target in targets.iter() {
            sets.add_record(target.record_type, &target.value, target.ttl);
        }
        sets
    }
}

impl Deref for RecordSets {
    type Target = BTreeMap<RecordType, RecordSet>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for RecordSets {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl FromIterator<RecordSet> for RecordSets {
    fn from_iter<I: IntoIterator<Item = RecordSet>>(iter: I) -> Self {
        Self(iter.into_iter().map(|rs| (rs.type_, rs)).collect())
    }
}

#[cfg(test)]
#[path = "records_tests.rs"]
mod records_tests;
