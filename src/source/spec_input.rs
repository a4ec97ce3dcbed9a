// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Desired DNS state of a source object.
//!
//! [`DNSSpecInput`] is computed fresh on every reconciliation from the merged annotations
//! (external `DNSAnnotation` annotations first, the object's own annotations override)
//! and the kind specific parts of the object, such as load balancer status and ingress
//! rules. It is never persisted; [`modify_entry_for`] turns it into the spec of one
//! generated `DNSEntry` per DNS name.
//!
//! # Example
//!
//! ```rust
//! use dnsman::source::spec_input::augment;
//! use dnsman::source::DNSSpecInput;
//! use std::collections::BTreeMap;
//!
//! let annotations = BTreeMap::from([
//!     ("dns.gardener.cloud/ttl".to_string(), "0".to_string()),
//! ]);
//! let input = augment(&annotations, DNSSpecInput::default()).unwrap();
//! assert_eq!(input.ttl, None);
//! ```

use crate::config::SourceControllerConfig;
use crate::crd::{self, DNSEntry, ResourceReference};
use crate::dns::is_default_class;
use crate::dns_errors::SpecInputError;
use crate::labels::{
    ANNOTATION_AWS_LOAD_BALANCER_IP_ADDRESS_TYPE, ANNOTATION_CLASS,
    ANNOTATION_CNAME_LOOKUP_INTERVAL, ANNOTATION_DNS_NAMES, ANNOTATION_IGNORE,
    ANNOTATION_IP_STACK, ANNOTATION_OPENSTACK_LOAD_BALANCER_ADDRESS,
    ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES, ANNOTATION_ROUTING_POLICY, ANNOTATION_TTL,
    AWS_IP_ADDRESS_TYPE_DUAL_STACK, IGNORE_VALUE_FULL, IGNORE_VALUE_RECONCILE,
    IGNORE_VALUE_TRUE, IP_STACK_DUAL_STACK,
};
use crate::source::ownership::api_version;
use crate::source::UniqueStrings;
use crate::state::AnnotationState;
use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::GroupVersionKind;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use tracing::debug;

/// How the DNS entry controller treats a generated entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreMode {
    /// Provider records are left untouched while the entry exists
    Reconcile,
    /// Provider records are left untouched, also on deletion of the entry
    Full,
}

impl IgnoreMode {
    /// Parses an ignore annotation value. `true` is an alias of `reconcile`.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            IGNORE_VALUE_TRUE | IGNORE_VALUE_RECONCILE => Some(IgnoreMode::Reconcile),
            IGNORE_VALUE_FULL => Some(IgnoreMode::Full),
            _ => None,
        }
    }

    /// The annotation value written on generated entries.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IgnoreMode::Reconcile => IGNORE_VALUE_RECONCILE,
            IgnoreMode::Full => IGNORE_VALUE_FULL,
        }
    }
}

/// Names, targets and policies for the entries of one source object.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DNSSpecInput {
    /// DNS names, one generated entry per name
    pub names: UniqueStrings,
    pub ttl: Option<i64>,
    pub cname_lookup_interval: Option<i64>,
    /// Record values (IP addresses or host names)
    pub targets: UniqueStrings,
    /// TXT record values
    pub text: UniqueStrings,
    pub routing_policy: Option<crd::RoutingPolicy>,
    /// Value of the IP stack annotation, empty if unset
    pub ip_stack: String,
    pub resolve_targets_to_addresses: Option<bool>,
    /// Ignore annotation value as found on the source
    pub ignore: String,
}

impl DNSSpecInput {
    #[must_use]
    pub fn ignore_mode(&self) -> Option<IgnoreMode> {
        IgnoreMode::parse(&self.ignore)
    }
}

/// Fills the optional fields of `input` from the common annotations.
///
/// Empty annotation values are treated like absent ones. A TTL or CNAME lookup
/// interval of `0` leaves the field unset.
///
/// # Errors
///
/// Returns an error if the routing policy is not valid JSON or if the TTL or the
/// CNAME lookup interval is not an integer.
pub fn augment(
    annotations: &BTreeMap<String, String>,
    mut input: DNSSpecInput,
) -> Result<DNSSpecInput, SpecInputError> {
    if annotations.is_empty() {
        return Ok(input);
    }
    let get = |key: &str| {
        annotations
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    };

    if let Some(value) = get(ANNOTATION_ROUTING_POLICY) {
        let policy: crd::RoutingPolicy = serde_json::from_str(value)
            .map_err(|source| SpecInputError::InvalidRoutingPolicy { source })?;
        input.routing_policy = Some(policy);
    }

    if let Some(value) = get(ANNOTATION_TTL) {
        let ttl: i64 = value
            .parse()
            .map_err(|source| SpecInputError::InvalidTtl { source })?;
        if ttl != 0 {
            input.ttl = Some(ttl);
        }
    }

    if let Some(value) = get(ANNOTATION_IGNORE) {
        input.ignore = value.to_string();
    }

    if let Some(value) = get(ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES) {
        input.resolve_targets_to_addresses = Some(value == "true");
    }

    if let Some(value) = get(ANNOTATION_CNAME_LOOKUP_INTERVAL) {
        let interval: i64 = value
            .parse()
            .map_err(|source| SpecInputError::InvalidCNameLookupInterval { source })?;
        if interval != 0 {
            input.cname_lookup_interval = Some(interval);
        }
    }

    Ok(input)
}

/// Reads the DNS names annotation.
///
/// Returns `None` if the annotation is absent.
///
/// # Errors
///
/// Returns an error if the annotation is present with an empty value.
pub fn dns_names_from_annotations(
    annotations: &BTreeMap<String, String>,
) -> Result<Option<UniqueStrings>, SpecInputError> {
    let Some(value) = annotations.get(ANNOTATION_DNS_NAMES) else {
        debug!(key = ANNOTATION_DNS_NAMES, "No DNS names annotation");
        return Ok(None);
    };
    if value.is_empty() {
        return Err(SpecInputError::EmptyAnnotation {
            key: ANNOTATION_DNS_NAMES.to_string(),
        });
    }
    Ok(Some(
        value
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .collect(),
    ))
}

/// Computes the desired state of a load balancer service.
///
/// # Errors
///
/// Returns an error for an empty or wildcard names annotation and for malformed
/// common annotations.
pub fn service_spec_input(
    svc: &Service,
    annotations: &BTreeMap<String, String>,
) -> Result<Option<DNSSpecInput>, SpecInputError> {
    let Some(names) = dns_names_from_annotations(annotations)? else {
        return Ok(None);
    };
    if names.contains("*") {
        return Err(SpecInputError::WildcardNotAllowed {
            kind: "service".to_string(),
        });
    }

    let openstack_address = annotations
        .get(ANNOTATION_OPENSTACK_LOAD_BALANCER_ADDRESS)
        .filter(|a| !a.is_empty());
    let mut targets = UniqueStrings::new();
    let lb_ingress = svc
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref());
    for ingress in lb_ingress.into_iter().flatten() {
        let hostname = ingress.hostname.as_deref().unwrap_or_default();
        let ip = ingress.ip.as_deref().unwrap_or_default();
        if !hostname.is_empty() && ip.is_empty() {
            // PROXY protocol on OpenStack needs a hostname on the load balancer, the
            // address is then published in an annotation
            match openstack_address {
                Some(address) => targets.add(address.as_str()),
                None => targets.add(hostname),
            };
        } else if !ip.is_empty() {
            targets.add(ip);
        }
    }

    let mut ip_stack = annotations
        .get(ANNOTATION_IP_STACK)
        .cloned()
        .unwrap_or_default();
    if annotations
        .get(ANNOTATION_AWS_LOAD_BALANCER_IP_ADDRESS_TYPE)
        .is_some_and(|t| t == AWS_IP_ADDRESS_TYPE_DUAL_STACK)
    {
        ip_stack = IP_STACK_DUAL_STACK.to_string();
    }

    augment(
        annotations,
        DNSSpecInput {
            names,
            targets,
            ip_stack,
            ..Default::default()
        },
    )
    .map(Some)
}

/// Computes the desired state of an ingress.
///
/// The annotated names must be declared as rule hosts. `*` selects all rule hosts.
///
/// # Errors
///
/// Returns an error for an empty names annotation, for annotated names missing from
/// the rules and for malformed common annotations.
pub fn ingress_spec_input(
    ingress: &Ingress,
    annotations: &BTreeMap<String, String>,
) -> Result<Option<DNSSpecInput>, SpecInputError> {
    let Some(names) = ingress_dns_names(ingress, annotations)? else {
        return Ok(None);
    };
    augment(
        annotations,
        DNSSpecInput {
            names,
            targets: ingress_targets(ingress),
            ip_stack: annotations
                .get(ANNOTATION_IP_STACK)
                .cloned()
                .unwrap_or_default(),
            ..Default::default()
        },
    )
    .map(Some)
}

fn ingress_dns_names(
    ingress: &Ingress,
    annotations: &BTreeMap<String, String>,
) -> Result<Option<UniqueStrings>, SpecInputError> {
    let Some(mut annotated) = dns_names_from_annotations(annotations)? else {
        return Ok(None);
    };

    let all = annotated.contains("*");
    let rules = ingress.spec.as_ref().and_then(|s| s.rules.as_ref());
    let names: UniqueStrings = rules
        .into_iter()
        .flatten()
        .filter_map(|rule| rule.host.as_deref())
        .filter(|host| !host.is_empty() && (all || annotated.contains(host)))
        .collect();

    annotated.remove("*");
    let undeclared = annotated.difference(&names);
    if !undeclared.is_empty() {
        return Err(SpecInputError::UndeclaredNames { names: undeclared });
    }
    Ok(Some(names))
}

/// IP addresses of the ingress load balancers, or their host names if there is no IP.
fn ingress_targets(ingress: &Ingress) -> UniqueStrings {
    let mut ips = UniqueStrings::new();
    let mut hosts = UniqueStrings::new();
    let lb_ingress = ingress
        .status
        .as_ref()
        .and_then(|s| s.load_balancer.as_ref())
        .and_then(|lb| lb.ingress.as_ref());
    for lb in lb_ingress.into_iter().flatten() {
        if let Some(ip) = lb.ip.as_deref().filter(|ip| !ip.is_empty()) {
            ips.add(ip);
        }
        if let Some(host) = lb.hostname.as_deref().filter(|h| !h.is_empty()) {
            hosts.add(host);
        }
    }
    if ips.is_empty() {
        hosts
    } else {
        ips
    }
}

/// Computes the desired state of a `DNSEntry` used as a source.
///
/// Records come from the entry spec; only the IP stack and the ignore mode are read
/// from the annotations. Returns `None` for an entry without DNS name.
#[must_use]
pub fn dnsentry_spec_input(
    entry: &DNSEntry,
    annotations: &BTreeMap<String, String>,
) -> Option<DNSSpecInput> {
    let spec = &entry.spec;
    if spec.dns_name.is_empty() {
        return None;
    }
    let annotation = |key: &str| annotations.get(key).cloned().unwrap_or_default();
    Some(DNSSpecInput {
        names: [spec.dns_name.as_str()].into_iter().collect(),
        ttl: spec.ttl,
        cname_lookup_interval: spec.cname_lookup_interval,
        targets: spec.targets.iter().map(String::as_str).collect(),
        text: spec.text.iter().map(String::as_str).collect(),
        routing_policy: spec.routing_policy.clone(),
        ip_stack: annotation(ANNOTATION_IP_STACK),
        resolve_targets_to_addresses: spec.resolve_targets_to_addresses,
        ignore: annotation(ANNOTATION_IGNORE),
    })
}

/// Reference of a source object in the annotation state.
pub fn build_resource_reference<K: Resource>(gvk: &GroupVersionKind, obj: &K) -> ResourceReference {
    ResourceReference {
        api_version: api_version(gvk),
        kind: gvk.kind.clone(),
        name: obj.name_any(),
        namespace: obj.namespace().unwrap_or_default(),
    }
}

/// Annotations of a source object including those injected by a `DNSAnnotation`.
///
/// The object's own annotations win on conflicting keys.
pub fn merged_annotations<K: Resource>(
    state: &AnnotationState,
    gvk: &GroupVersionKind,
    obj: &K,
) -> BTreeMap<String, String> {
    let mut annotations = state
        .resource_annotation_status(&build_resource_reference(gvk, obj))
        .annotations;
    annotations.extend(obj.annotations().clone());
    annotations
}

/// Writes the desired state for `dns_name` into a generated entry.
///
/// Applying it twice with the same arguments changes nothing.
pub fn modify_entry_for(
    entry: &mut DNSEntry,
    config: &SourceControllerConfig,
    input: &DNSSpecInput,
    dns_name: &str,
) {
    let target_class = config.effective_target_class();
    if !is_default_class(target_class) {
        entry
            .annotations_mut()
            .insert(ANNOTATION_CLASS.to_string(), target_class.to_string());
    }
    if !config.target_labels.is_empty() {
        entry.labels_mut().extend(
            config
                .target_labels
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
    }

    entry.spec.dns_name = dns_name.to_string();
    entry.spec.targets = input.targets.to_vec();
    entry.spec.text = input.text.to_vec();
    entry.spec.ttl = input.ttl;
    entry.spec.routing_policy = input.routing_policy.clone();
    entry.spec.resolve_targets_to_addresses = input.resolve_targets_to_addresses;
    entry.spec.cname_lookup_interval = input.cname_lookup_interval;

    if !input.ip_stack.is_empty() {
        entry
            .annotations_mut()
            .insert(ANNOTATION_IP_STACK.to_string(), input.ip_stack.clone());
    }
    match input.ignore_mode() {
        Some(mode) => {
            entry
                .annotations_mut()
                .insert(ANNOTATION_IGNORE.to_string(), mode.as_str().to_string());
        }
        None => {
            if let Some(annotations) = entry.metadata.annotations.as_mut() {
                annotations.remove(ANNOTATION_IGNORE);
            }
        }
    }
}

#[cfg(test)]
#[path = "spec_input_tests.rs"]
mod spec_input_tests;
