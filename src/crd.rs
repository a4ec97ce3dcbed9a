// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Custom Resource Definitions (CRDs) for DNS management.
//!
//! # Resource Types
//!
//! - [`DNSEntry`] - One desired DNS name with its targets. Source controllers create
//!   these in the control plane cluster on behalf of Services, Ingresses and
//!   DNSEntries in the source cluster.
//! - [`DNSAnnotation`] - Injects annotations into a source object without touching it,
//!   e.g. when the object is owned by another tool.
//!
//! # Example: A DNS entry
//!
//! ```rust,no_run
//! use dnsman::crd::{DNSEntry, DNSEntrySpec};
//!
//! let entry = DNSEntry::new(
//!     "www",
//!     DNSEntrySpec {
//!         dns_name: "www.example.com".to_string(),
//!         targets: vec!["192.0.2.1".to_string()],
//!         ttl: Some(300),
//!         ..Default::default()
//!     },
//! );
//! ```

use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Routing policy of a `DNSEntry` as it appears in the API.
///
/// The domain representation used for record comparison is
/// [`crate::dns::RoutingPolicy`], which drops the set identifier into the
/// record set name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoutingPolicy {
    /// Policy type. Allowed values are provider dependent, e.g. `weighted`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Identifier of the record set
    #[serde(default)]
    pub set_identifier: String,

    /// Policy specific parameters
    #[serde(default)]
    pub parameters: BTreeMap<String, String>,
}

/// `DNSEntry` describes one DNS name and the records that should exist for it.
///
/// # Example
///
/// ```yaml
/// apiVersion: dns.gardener.cloud/v1alpha1
/// kind: DNSEntry
/// metadata:
///   name: www
/// spec:
///   dnsName: www.example.com
///   targets:
///     - 192.0.2.1
///   ttl: 300
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.gardener.cloud",
    version = "v1alpha1",
    kind = "DNSEntry",
    namespaced,
    shortname = "dnse",
    derive = "PartialEq",
    doc = "DNSEntry describes a DNS name with its target records. Entries are provisioned in the DNS provider owning the matching zone."
)]
#[kube(status = "DNSEntryStatus")]
#[kube(printcolumn = r#"{"name":"DNS","type":"string","jsonPath":".spec.dnsName"}"#)]
#[kube(printcolumn = r#"{"name":"STATUS","type":"string","jsonPath":".status.state"}"#)]
#[serde(rename_all = "camelCase")]
pub struct DNSEntrySpec {
    /// Fully qualified domain name
    pub dns_name: String,

    /// Time to live for records in the external DNS system
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    /// Lookup interval for CNAMEs that must be resolved to IP addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cname_lookup_interval: Option<i64>,

    /// Text records, either text or targets must be specified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub text: Vec<String>,

    /// Target records (CNAME or A records), either text or targets must be specified
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Optional routing policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<RoutingPolicy>,

    /// Resolve CNAME targets to A/AAAA records
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolve_targets_to_addresses: Option<bool>,
}

/// Status of a `DNSEntry`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSEntryStatus {
    /// Generation last processed by the entry controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observed_generation: Option<i64>,

    /// Entry state (e.g. `Ready`, `Pending`, `Error`)
    #[serde(default)]
    pub state: String,

    /// Message describing the reason for the state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Provider type used for the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider_type: Option<String>,

    /// Assigned provider (namespace/name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,

    /// Zone used for the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,

    /// Effective DNS name, if it differs from the spec
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_name: Option<String>,

    /// Time to live used for the entry
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<i64>,

    /// Effective targets generated for the entry
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<String>,

    /// Effective routing policy
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_policy: Option<RoutingPolicy>,
}

/// Reference to a source object by API version, kind, namespace and name.
///
/// Used as the key of the annotation state and as the target of a `DNSAnnotation`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResourceReference {
    /// API version of the referenced object (e.g. `v1`, `networking.k8s.io/v1`)
    pub api_version: String,

    /// Kind of the referenced object
    pub kind: String,

    /// Name of the referenced object
    pub name: String,

    /// Namespace of the referenced object
    #[serde(default)]
    pub namespace: String,
}

impl std::fmt::Display for ResourceReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.api_version, self.kind, self.namespace, self.name
        )
    }
}

/// `DNSAnnotation` adds annotations to a source object for DNS processing.
///
/// # Example
///
/// ```yaml
/// apiVersion: dns.gardener.cloud/v1alpha1
/// kind: DNSAnnotation
/// metadata:
///   name: my-service
/// spec:
///   resourceRef:
///     apiVersion: v1
///     kind: Service
///     name: my-service
///     namespace: default
///   annotations:
///     dns.gardener.cloud/dnsnames: echo.example.com
/// ```
#[derive(CustomResource, Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "dns.gardener.cloud",
    version = "v1alpha1",
    kind = "DNSAnnotation",
    namespaced,
    shortname = "dnsa",
    doc = "DNSAnnotation injects DNS annotations into a referenced source object without modifying it."
)]
#[kube(status = "DNSAnnotationStatus")]
#[serde(rename_all = "camelCase")]
pub struct DNSAnnotationSpec {
    /// The annotated object
    pub resource_ref: ResourceReference,

    /// Annotations applied to the referenced object
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,
}

/// Status of a `DNSAnnotation`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DNSAnnotationStatus {
    /// Whether the annotations are currently applied to an active source
    #[serde(default)]
    pub active: bool,

    /// Message describing the state
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}
