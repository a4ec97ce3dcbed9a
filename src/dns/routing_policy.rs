// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Routing policies for record sets.
//!
//! A routing policy lets several record sets share one DNS name, discriminated by a set
//! identifier (see [`crate::dns::DNSSetName`]). Providers interpret the parameters; this
//! module only validates their shape.

use crate::crd;
use crate::dns_errors::RoutingPolicyError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Supported routing policy types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RoutingPolicyType {
    /// Weighted round robin
    #[serde(rename = "weighted")]
    Weighted,
    /// Latency based routing
    #[serde(rename = "latency")]
    Latency,
    /// Geolocation based routing
    #[serde(rename = "geolocation")]
    GeoLocation,
    /// Client IP (CIDR) based routing
    #[serde(rename = "ip-based")]
    IpBased,
    /// Active/passive failover
    #[serde(rename = "failover")]
    Failover,
}

impl RoutingPolicyType {
    /// All supported types.
    pub const ALL: [RoutingPolicyType; 5] = [
        RoutingPolicyType::Weighted,
        RoutingPolicyType::Latency,
        RoutingPolicyType::GeoLocation,
        RoutingPolicyType::IpBased,
        RoutingPolicyType::Failover,
    ];

    /// Wire name of the type.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RoutingPolicyType::Weighted => "weighted",
            RoutingPolicyType::Latency => "latency",
            RoutingPolicyType::GeoLocation => "geolocation",
            RoutingPolicyType::IpBased => "ip-based",
            RoutingPolicyType::Failover => "failover",
        }
    }
}

impl fmt::Display for RoutingPolicyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoutingPolicyType {
    type Err = RoutingPolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoutingPolicyType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| RoutingPolicyError::UnknownType(s.to_string()))
    }
}

/// Routing policy of a record set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingPolicy {
    /// Policy type
    #[serde(rename = "type")]
    pub type_: RoutingPolicyType,
    /// Policy parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

impl RoutingPolicy {
    /// Creates a routing policy from key/value pairs.
    #[must_use]
    pub fn new(type_: RoutingPolicyType, parameters: &[(&str, &str)]) -> Self {
        Self {
            type_,
            parameters: parameters
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
        }
    }

    /// Converts the routing policy of a `DNSEntry` into the domain representation.
    ///
    /// The set identifier is not part of the result; it belongs to the
    /// [`crate::dns::DNSSetName`].
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError::UnknownType`] if the type is not supported.
    pub fn from_entry_policy(policy: &crd::RoutingPolicy) -> Result<Self, RoutingPolicyError> {
        Ok(Self {
            type_: policy.type_.parse()?,
            parameters: policy.parameters.clone(),
        })
    }

    /// Validates the parameter keys against the required and optional keys of a provider.
    ///
    /// # Errors
    ///
    /// Returns [`RoutingPolicyError::MissingKeys`] if a required key is missing, and
    /// [`RoutingPolicyError::UnexpectedKeys`] if a key is neither required nor optional.
    pub fn check_parameter_keys(
        &self,
        required: &[&str],
        optional: &[&str],
    ) -> Result<(), RoutingPolicyError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|key| !self.parameters.contains_key(**key))
            .map(|key| (*key).to_string())
            .collect();
        if !missing.is_empty() {
            return Err(RoutingPolicyError::MissingKeys {
                policy: self.type_.to_string(),
                keys: missing,
            });
        }

        let unexpected: Vec<String> = self
            .parameters
            .keys()
            .filter(|key| !required.contains(&key.as_str()) && !optional.contains(&key.as_str()))
            .cloned()
            .collect();
        if !unexpected.is_empty() {
            return Err(RoutingPolicyError::UnexpectedKeys {
                policy: self.type_.to_string(),
                keys: unexpected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "routing_policy_tests.rs"]
mod routing_policy_tests;
