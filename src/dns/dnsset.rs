// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS sets: all record sets of one DNS name.
//!
//! Names are stored normalized (see [`crate::dns::normalize_domain_name`]). A
//! [`DNSSets`] map never holds a [`DNSSet`] without record sets.

use crate::crd;
use crate::dns::normalize_domain_name;
use crate::dns::records::{Record, RecordSet, RecordSets, RecordType};
use crate::dns::routing_policy::RoutingPolicy;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Deref;

/// Name of a DNS set: a domain name plus the set identifier of a routing policy.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DNSSetName {
    /// Domain name
    pub dns_name: String,
    /// Set identifier, empty without routing policy
    pub set_identifier: String,
}

impl DNSSetName {
    /// Creates a normalized name without set identifier.
    pub fn new(dns_name: &str) -> Self {
        Self {
            dns_name: normalize_domain_name(dns_name),
            set_identifier: String::new(),
        }
    }

    /// Creates the name of a `DNSEntry`, using the set identifier of its routing policy.
    pub fn for_entry(dns_name: &str, routing_policy: Option<&crd::RoutingPolicy>) -> Self {
        Self {
            dns_name: normalize_domain_name(dns_name),
            set_identifier: routing_policy
                .map(|p| p.set_identifier.clone())
                .unwrap_or_default(),
        }
    }

    /// Returns a copy with the same set identifier and another domain name.
    #[must_use]
    pub fn with_dns_name(&self, dns_name: &str) -> Self {
        Self {
            dns_name: normalize_domain_name(dns_name),
            set_identifier: self.set_identifier.clone(),
        }
    }

    /// Returns the normalized name.
    #[must_use]
    pub fn normalize(&self) -> Self {
        self.with_dns_name(&self.dns_name)
    }
}

impl fmt::Display for DNSSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.set_identifier.is_empty() {
            f.write_str(&self.dns_name)
        } else {
            write!(f, "{}#{}", self.dns_name, self.set_identifier)
        }
    }
}

/// All record sets of one DNS set name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSSet {
    /// Normalized name
    pub name: DNSSetName,
    /// Discriminator for record sets that must be updated together
    pub update_group: String,
    /// Record sets by type
    pub sets: RecordSets,
    /// Routing policy shared by the record sets
    pub routing_policy: Option<RoutingPolicy>,
}

impl DNSSet {
    pub fn new(name: &DNSSetName, routing_policy: Option<RoutingPolicy>) -> Self {
        Self {
            name: name.normalize(),
            update_group: String::new(),
            sets: RecordSets::new(),
            routing_policy,
        }
    }

    /// Replaces the record set of the given type.
    pub fn set_record_set<S: AsRef<str>>(
        &mut self,
        record_type: RecordType,
        ttl: i64,
        values: &[S],
    ) {
        let records = values.iter().map(|v| Record::new(v.as_ref())).collect();
        self.sets
            .insert(record_type, RecordSet::new(record_type, ttl, records));
    }

    /// Compares name, routing policy and all record sets.
    #[must_use]
    pub fn matches(&self, other: &DNSSet) -> bool {
        if self.name != other.name || self.routing_policy != other.routing_policy {
            return false;
        }
        self.sets.len() == other.sets.len()
            && self
                .sets
                .iter()
                .all(|(k, v)| other.sets.get(k).is_some_and(|w| v.matches(w)))
    }

    /// Compares name, routing policy and the record sets of a single type.
    ///
    /// Sets missing the type on both sides match.
    #[must_use]
    pub fn match_record_type_subset(&self, other: &DNSSet, record_type: RecordType) -> bool {
        if self.name != other.name || self.routing_policy != other.routing_policy {
            return false;
        }
        match (self.sets.get(&record_type), other.sets.get(&record_type)) {
            (Some(a), Some(b)) => a.matches(b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// DNS sets keyed by normalized name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DNSSets(BTreeMap<DNSSetName, DNSSet>);

impl DNSSets {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a record set.
    ///
    /// The routing policy of the DNS set is set to `routing_policy`. CNAME record values
    /// are normalized.
    pub fn add_record_set(
        &mut self,
        name: &DNSSetName,
        routing_policy: Option<RoutingPolicy>,
        mut record_set: RecordSet,
    ) {
        let name = name.normalize();
        if record_set.type_ == RecordType::CNAME {
            for record in &mut record_set.records {
                record.value = normalize_domain_name(&record.value);
            }
        }
        let dnsset = self
            .0
            .entry(name.clone())
            .or_insert_with(|| DNSSet::new(&name, None));
        dnsset.routing_policy = routing_policy;
        dnsset.sets.insert(record_set.type_, record_set);
    }

    /// Removes a record set, and the DNS set if it has no record sets left.
    pub fn remove_record_set(&mut self, name: &DNSSetName, record_type: RecordType) {
        let name = name.normalize();
        let now_empty = match self.0.get_mut(&name) {
            Some(dnsset) => {
                dnsset.sets.remove(&record_type);
                dnsset.sets.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.0.remove(&name);
        }
    }
}

impl Deref for DNSSets {
    type Target = BTreeMap<DNSSetName, DNSSet>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
#[path = "dnsset_tests.rs"]
mod dnsset_tests;
