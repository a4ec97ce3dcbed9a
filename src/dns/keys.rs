// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Zone scoped keys for DNS sets and record sets.

use crate::dns::dnsset::DNSSetName;
use crate::dns::records::RecordType;
use std::fmt;

/// Identifies a hosted zone of a provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneID {
    /// Provider type, e.g. `aws-route53`
    pub provider_type: String,
    /// Provider specific zone identifier
    pub id: String,
}

impl ZoneID {
    pub fn new(provider_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            provider_type: provider_type.into(),
            id: id.into(),
        }
    }

    /// Whether neither provider type nor ID is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.provider_type.is_empty() && self.id.is_empty()
    }
}

impl fmt::Display for ZoneID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.provider_type, self.id)
    }
}

/// A DNS set name qualified by its zone.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullDNSSetName {
    pub zone_id: ZoneID,
    pub name: DNSSetName,
}

impl FullDNSSetName {
    pub fn new(zone_id: ZoneID, name: DNSSetName) -> Self {
        Self { zone_id, name }
    }

    /// Key of the record set of the given type.
    #[must_use]
    pub fn record_set_key(&self, record_type: RecordType) -> FullRecordSetKey {
        FullRecordSetKey {
            name: self.clone(),
            record_type,
        }
    }
}

impl fmt::Display for FullDNSSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.zone_id, self.name)
    }
}

/// A record set identity qualified by its zone.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FullRecordSetKey {
    pub name: FullDNSSetName,
    pub record_type: RecordType,
}

impl fmt::Display for FullRecordSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.name, self.record_type)
    }
}

#[cfg(test)]
#[path = "keys_tests.rs"]
mod keys_tests;
