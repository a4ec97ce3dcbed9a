// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Global constants for the DNS source controllers.
//!
//! This module contains the numeric and string constants used throughout the codebase.
//! Constants are organized by category for easy maintenance.

// ============================================================================
// API Constants
// ============================================================================

/// API group of the `DNSEntry` and `DNSAnnotation` CRDs
pub const API_GROUP: &str = "dns.gardener.cloud";

/// API version of the `DNSEntry` and `DNSAnnotation` CRDs
pub const API_VERSION: &str = "v1alpha1";

/// Fully qualified API version (group/version)
pub const API_GROUP_VERSION: &str = "dns.gardener.cloud/v1alpha1";

/// Kind name for `DNSEntry` resource
pub const KIND_DNS_ENTRY: &str = "DNSEntry";

/// Kind name for `DNSAnnotation` resource
pub const KIND_DNS_ANNOTATION: &str = "DNSAnnotation";

/// Kind name for core `Service` resource
pub const KIND_SERVICE: &str = "Service";

/// Kind name for networking `Ingress` resource
pub const KIND_INGRESS: &str = "Ingress";

/// `DNSEntry` state reported once records are provisioned
pub const ENTRY_STATE_READY: &str = "Ready";

// ============================================================================
// Controller Constants
// ============================================================================

/// Default number of concurrently running reconciliations per source controller
pub const DEFAULT_CONCURRENT_SYNCS: u16 = 2;

/// Requeue duration for controller errors (30 seconds)
pub const ERROR_REQUEUE_DURATION_SECS: u64 = 30;

/// Window in which identical events for the same object are recorded only once (5 minutes)
pub const DEFAULT_EVENT_DEDUP_TTL_SECS: u64 = 300;

/// Finalizer guarding `DNSAnnotation` objects while they are registered in the annotation state
pub const DNS_ANNOTATION_FINALIZER: &str = "dns.gardener.cloud/dnsannotation";

// ============================================================================
// Runtime Constants
// ============================================================================

/// Number of worker threads for Tokio runtime
pub const TOKIO_WORKER_THREADS: usize = 4;

// ============================================================================
// Metrics Server Constants
// ============================================================================

/// Port for Prometheus metrics HTTP server
pub const METRICS_SERVER_PORT: u16 = 8080;

/// Path for Prometheus metrics endpoint
pub const METRICS_SERVER_PATH: &str = "/metrics";

/// Bind address for metrics HTTP server
pub const METRICS_SERVER_BIND_ADDRESS: &str = "0.0.0.0";
