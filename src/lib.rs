// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! # dnsman - DNS source controllers for Kubernetes
//!
//! dnsman watches Kubernetes objects that ask for DNS names and maintains one
//! `DNSEntry` per requested name in a control plane cluster, which may be a different
//! cluster than the one holding the source objects. The entries are provisioned in the
//! DNS providers by a separate entry controller.
//!
//! ## Overview
//!
//! Supported source objects:
//!
//! - `Service` objects of type `LoadBalancer`
//! - `Ingress` objects
//! - `DNSEntry` objects of another DNS class
//!
//! A source object requests DNS names with the `dns.gardener.cloud/dnsnames` annotation.
//! Further annotations control TTL, routing policy, IP stack and more, and can be
//! injected without touching the object through a `DNSAnnotation`.
//!
//! ## Modules
//!
//! - [`crd`] - `DNSEntry` and `DNSAnnotation` custom resources
//! - [`dns`] - DNS record model and DNS class helpers
//! - [`source`] - Ownership protocol and desired state of source objects
//! - [`reconcilers`] - Reconciliation engine and source kind adapters
//! - [`controller`] - Kubernetes runtime wiring
//! - [`store`] - Object store seams with Kubernetes and in-memory implementations
//! - [`state`] - Annotations injected by `DNSAnnotation` objects
//! - [`recorder`] - Events on source objects
//!
//! ## Example
//!
//! ```rust
//! use dnsman::crd::{DNSEntry, DNSEntrySpec};
//! use dnsman::source::OwnerData;
//! use kube::core::GroupVersionKind;
//! use k8s_openapi::api::core::v1::Service;
//! use kube::api::ObjectMeta;
//!
//! let svc = Service {
//!     metadata: ObjectMeta {
//!         name: Some("web".to_string()),
//!         namespace: Some("default".to_string()),
//!         uid: Some("1234".to_string()),
//!         ..Default::default()
//!     },
//!     ..Default::default()
//! };
//! let owner = OwnerData::for_object(&svc, "", &GroupVersionKind::gvk("", "v1", "Service"));
//!
//! let mut entry = DNSEntry::new("web-service-abcde", DNSEntrySpec::default());
//! entry.metadata.namespace = Some("dns".to_string());
//! assert!(owner.add_owner(&mut entry.metadata, ""));
//! assert!(owner.has_owner(&entry.metadata, ""));
//! ```

pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod dns;
pub mod dns_errors;
pub mod labels;
pub mod metrics;
pub mod reconcilers;
pub mod recorder;
pub mod source;
pub mod state;
pub mod store;
