// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! DNS domain model.
//!
//! Value types describing DNS records and their comparison rules:
//!
//! - [`records`] - [`RecordType`], [`Record`], [`RecordSet`] and [`RecordSets`]
//! - [`dnsset`] - [`DNSSetName`], [`DNSSet`] and [`DNSSets`]
//! - [`routing_policy`] - [`RoutingPolicy`] and parameter validation
//! - [`target`] - [`Target`] and [`Targets`]
//! - [`keys`] - zone scoped compound keys
//!
//! This module also hosts the DNS class helpers. A DNS class partitions objects between
//! controller deployments; an unset class is the default class.
//!
//! # Example
//!
//! ```rust
//! use dnsman::dns::{class_source_finalizer, normalize_class};
//!
//! let finalizer = class_source_finalizer(&normalize_class(""), "service-dns");
//! assert_eq!(finalizer, "gardendns.dns.gardener.cloud/service-dns");
//! ```

pub mod dnsset;
pub mod keys;
pub mod records;
pub mod routing_policy;
pub mod target;

pub use dnsset::{DNSSet, DNSSetName, DNSSets};
pub use keys::{FullDNSSetName, FullRecordSetKey, ZoneID};
pub use records::{Record, RecordSet, RecordSets, RecordType};
pub use routing_policy::{RoutingPolicy, RoutingPolicyType};
pub use target::{Target, Targets};

use crate::labels::{DEFAULT_CLASS, FINALIZER_DOMAIN};

/// Returns the class, or the default class if the class is empty.
#[must_use]
pub fn normalize_class(class: &str) -> String {
    if class.is_empty() {
        DEFAULT_CLASS.to_string()
    } else {
        class.to_string()
    }
}

/// Returns whether both classes are the same after normalization.
#[must_use]
pub fn equivalent_class(a: &str, b: &str) -> bool {
    normalize_class(a) == normalize_class(b)
}

/// Returns whether the class is empty or the default class.
#[must_use]
pub fn is_default_class(class: &str) -> bool {
    class.is_empty() || class == DEFAULT_CLASS
}

/// Builds the finalizer a source controller sets on its source objects.
///
/// The name is unique per class and controller so that several source controllers can
/// share a cluster.
#[must_use]
pub fn class_source_finalizer(normalized_class: &str, local_name: &str) -> String {
    format!("{normalized_class}.{FINALIZER_DOMAIN}/{local_name}")
}

/// Normalizes a domain name.
///
/// Removes a trailing dot, lower-cases the name and replaces an escaped wildcard label
/// (`\052`) by `*`.
#[must_use]
pub fn normalize_domain_name(name: &str) -> String {
    let name = name.strip_suffix('.').unwrap_or(name);
    let name = match name.strip_prefix("\\052") {
        Some(rest) => format!("*{rest}"),
        None => name.to_string(),
    };
    name.to_lowercase()
}

#[cfg(test)]
mod mod_tests;
