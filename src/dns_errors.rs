// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Error types for the DNS source controllers.
//!
//! This module provides specialized error types for:
//! - User configuration errors found while reading source object annotations
//! - Routing policy validation
//! - Object store (Kubernetes API) failures
//! - Annotation state conflicts
//! - Reconciliation failures, wrapping the above with object context
//!
//! User configuration errors fail identically until the annotation is fixed; they are
//! reported as warning events on the source object. Store errors are transient and
//! retried by the controller's error policy.

use thiserror::Error;

/// Errors found while computing the desired DNS state from a source object.
///
/// All variants are caused by user misconfiguration of annotations or of the
/// source object itself.
#[derive(Error, Debug)]
pub enum SpecInputError {
    /// The DNS names annotation is present but has an empty value
    ///
    /// An absent annotation means "not relevant"; an empty one is a misconfiguration.
    #[error("empty value for annotation \"{key}\"")]
    EmptyAnnotation {
        /// The annotation key
        key: String,
    },

    /// The `*` wildcard name is used on a kind without host declarations
    #[error("domain name annotation value '*' is not allowed for {kind} objects")]
    WildcardNotAllowed {
        /// Lower-case kind name, e.g. `service`
        kind: String,
    },

    /// Annotated DNS names that are not declared by the ingress rules
    #[error("annotated dns names {} not declared by ingress", names.join(", "))]
    UndeclaredNames {
        /// The offending names
        names: Vec<String>,
    },

    /// The TTL annotation is not an integer
    #[error("invalid TTL: {source}")]
    InvalidTtl {
        /// Parse failure
        #[source]
        source: std::num::ParseIntError,
    },

    /// The CNAME lookup interval annotation is not an integer
    #[error("invalid CNameLookupInterval: {source}")]
    InvalidCNameLookupInterval {
        /// Parse failure
        #[source]
        source: std::num::ParseIntError,
    },

    /// The routing policy annotation is not valid JSON
    #[error("invalid routing policy: {source}")]
    InvalidRoutingPolicy {
        /// Decode failure
        #[source]
        source: serde_json::Error,
    },
}

/// Errors raised when validating or converting routing policies.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoutingPolicyError {
    /// Routing policy type is not one of the supported types
    #[error("unknown routing policy type \"{0}\"")]
    UnknownType(String),

    /// Required parameter keys are missing
    #[error("missing required parameter keys for routing policy {policy}: {}", keys.join(", "))]
    MissingKeys {
        /// Policy type
        policy: String,
        /// Missing keys
        keys: Vec<String>,
    },

    /// Parameter keys that are neither required nor optional
    #[error("unexpected parameter keys for routing policy {policy}: {}", keys.join(", "))]
    UnexpectedKeys {
        /// Policy type
        policy: String,
        /// Unexpected keys
        keys: Vec<String>,
    },
}

/// Errors of the object stores used by the reconcilers.
#[derive(Error, Debug)]
pub enum StoreError {
    /// Object does not exist
    #[error("{kind} {key} not found")]
    NotFound {
        /// Object kind
        kind: String,
        /// `namespace/name` of the object
        key: String,
    },

    /// Object already exists on create
    #[error("{kind} {key} already exists")]
    AlreadyExists {
        /// Object kind
        kind: String,
        /// `namespace/name` of the object
        key: String,
    },

    /// Optimistic concurrency failure (stale resource version)
    #[error("conflict updating {kind} {key}: the object has been modified")]
    Conflict {
        /// Object kind
        kind: String,
        /// `namespace/name` of the object
        key: String,
    },

    /// Object cannot be stored as given (e.g. it has neither name nor generate name)
    #[error("invalid {kind}: {reason}")]
    Invalid {
        /// Object kind
        kind: String,
        /// What is wrong
        reason: String,
    },

    /// Kubernetes API error
    #[error(transparent)]
    Kube(kube::Error),

    /// Serialization error while patching objects
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the error means the object does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            StoreError::NotFound { .. } => true,
            StoreError::Kube(kube::Error::Api(api_err)) => api_err.code == 404,
            _ => false,
        }
    }
}

impl From<kube::Error> for StoreError {
    fn from(err: kube::Error) -> Self {
        StoreError::Kube(err)
    }
}

/// Invalid combination of command line settings.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The `DNSEntry` source controller would read the entries it generates
    #[error(
        "dnsentry controller needs a different target class or cluster: source and target \
         are both class \"{class}\" in the same cluster"
    )]
    DnsEntrySourceIsTarget {
        /// Normalized class of source and target
        class: String,
    },
}

/// Errors of the annotation state shared by the source controllers.
#[derive(Error, Debug)]
pub enum StateError {
    /// Another `DNSAnnotation` already targets the resource
    #[error("conflicting DNSAnnotation for the same resource reference: {existing}")]
    ConflictingAnnotation {
        /// `namespace/name` of the `DNSAnnotation` holding the reference
        existing: String,
    },

    /// The state lock was poisoned by a panicking thread
    #[error("annotation state lock poisoned")]
    LockPoisoned,

    /// Updating the `DNSAnnotation` status failed
    #[error("failed to update status of DNSAnnotation {key}: {source}")]
    StatusUpdate {
        /// `namespace/name` of the `DNSAnnotation`
        key: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },
}

/// Reconciliation failure of a source object.
///
/// The controller's error policy requeues the object with a delay for every variant.
#[derive(Error, Debug)]
pub enum ReconcileError {
    /// Desired state could not be computed from the source object
    #[error(transparent)]
    SpecInput(#[from] SpecInputError),

    /// An object store operation failed
    #[error("{context}: {source}")]
    Store {
        /// What was attempted, including object kind and name
        context: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// The annotation state rejected the request
    #[error(transparent)]
    State(#[from] StateError),
}

impl ReconcileError {
    /// Wrap a store error with context.
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        ReconcileError::Store {
            context: context.into(),
            source,
        }
    }
}
