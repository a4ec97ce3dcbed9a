// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Annotation keys and values shared by source objects and generated `DNSEntry` objects.
//!
//! The keys are part of the persisted protocol: source objects are configured through
//! them, and ownership of generated entries is recorded in [`ANNOTATION_OWNERS`].

// ============================================================================
// DNS Class
// ============================================================================

/// Default DNS class used when no class annotation is set
pub const DEFAULT_CLASS: &str = "gardendns";

/// Annotation key selecting the DNS class of an object
pub const ANNOTATION_CLASS: &str = "dns.gardener.cloud/class";

// ============================================================================
// Source Object Annotations
// ============================================================================

/// Comma-separated list of DNS names to create entries for (`*` = all ingress hosts)
pub const ANNOTATION_DNS_NAMES: &str = "dns.gardener.cloud/dnsnames";

/// TTL for the generated records, in seconds
pub const ANNOTATION_TTL: &str = "dns.gardener.cloud/ttl";

/// Lookup interval for CNAME targets that are resolved to addresses, in seconds
pub const ANNOTATION_CNAME_LOOKUP_INTERVAL: &str = "dns.gardener.cloud/cname-lookup-interval";

/// JSON encoded routing policy
pub const ANNOTATION_ROUTING_POLICY: &str = "dns.gardener.cloud/routing-policy";

/// Whether CNAME targets should be resolved to A/AAAA records
pub const ANNOTATION_RESOLVE_TARGETS_TO_ADDRESSES: &str =
    "dns.gardener.cloud/resolve-targets-to-addresses";

/// IP stack for generated alias records (`ipv4`, `dual-stack`, `ipv6`)
pub const ANNOTATION_IP_STACK: &str = "dns.gardener.cloud/ip-stack";

/// IPv4-only IP stack
pub const IP_STACK_IPV4: &str = "ipv4";

/// Dual-stack (IPv4 and IPv6) IP stack
pub const IP_STACK_DUAL_STACK: &str = "dual-stack";

/// IPv6-only IP stack
pub const IP_STACK_IPV6: &str = "ipv6";

/// Ignore marker for source objects and entries
pub const ANNOTATION_IGNORE: &str = "dns.gardener.cloud/ignore";

/// Ignore on reconciliation (same as [`IGNORE_VALUE_RECONCILE`])
pub const IGNORE_VALUE_TRUE: &str = "true";

/// Ignore on reconciliation (same as [`IGNORE_VALUE_TRUE`])
pub const IGNORE_VALUE_RECONCILE: &str = "reconcile";

/// Ignore on reconciliation and deletion. Entries marked this way may be orphaned.
pub const IGNORE_VALUE_FULL: &str = "full";

/// Target-only ignore marker, never propagated from source objects
pub const ANNOTATION_HARD_IGNORE: &str = "dns.gardener.cloud/target-hard-ignore";

/// `namespace/name` of the generated target entry, written onto sources that mirror its status
pub const ANNOTATION_TARGET_ENTRY: &str = "dns.gardener.cloud/target-entry";

// ============================================================================
// Ownership
// ============================================================================

/// Comma-joined list of `[clusterID:]group/kind/namespace/name` owner tokens
pub const ANNOTATION_OWNERS: &str = "resources.gardener.cloud/owners";

/// Domain suffix used to build class scoped source finalizers
pub const FINALIZER_DOMAIN: &str = "dns.gardener.cloud";

// ============================================================================
// Cloud Provider Annotations
// ============================================================================

/// OpenStack load balancer address, set when the service uses a hostname for PROXY protocol
pub const ANNOTATION_OPENSTACK_LOAD_BALANCER_ADDRESS: &str =
    "loadbalancer.openstack.org/load-balancer-address";

/// AWS load balancer IP address type
pub const ANNOTATION_AWS_LOAD_BALANCER_IP_ADDRESS_TYPE: &str =
    "service.beta.kubernetes.io/aws-load-balancer-ip-address-type";

/// AWS dual-stack load balancer value
pub const AWS_IP_ADDRESS_TYPE_DUAL_STACK: &str = "dualstack";
