// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Reconciliation logic of the source controllers.
//!
//! # Reconciliation Architecture
//!
//! Every source controller follows the same pattern:
//!
//! 1. **Watch** - Source objects, `DNSAnnotation` objects and generated entries
//! 2. **Extract** - Compute the desired DNS state from the source object
//! 3. **Apply** - Create, patch and delete the generated `DNSEntry` objects
//! 4. **Report** - Events on the source object, `DNSAnnotation` status
//!
//! The generic part lives in [`source::SourceReconciler`]; the source kinds plug in
//! through [`source::SourceActuator`].
//!
//! # Available Reconcilers
//!
//! - [`service::ServiceActuator`] - `Service` objects of type `LoadBalancer`
//! - [`ingress::IngressActuator`] - `Ingress` objects
//! - [`dnsentry::DNSEntryActuator`] - `DNSEntry` objects of the source cluster
//! - [`dnsannotation::reconcile_dnsannotation`] - `DNSAnnotation` objects
//!
//! # Example: Reconciling a Service
//!
//! ```rust,no_run
//! use dnsman::config::SourceControllerConfig;
//! use dnsman::controller::{kube_reconciler, Clusters};
//! use dnsman::reconcilers::service::ServiceActuator;
//! use dnsman::state::AnnotationState;
//! use dnsman::store::ObjectKey;
//! use kube::Client;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! async fn reconcile_service(client: Client) -> anyhow::Result<()> {
//!     let clusters = Clusters { source: client.clone(), control_plane: client };
//!     let reconciler = kube_reconciler(
//!         Arc::new(ServiceActuator),
//!         SourceControllerConfig::default(),
//!         &clusters,
//!         Arc::new(AnnotationState::default()),
//!         Duration::from_secs(300),
//!     );
//!     reconciler.reconcile(&ObjectKey::new("default", "web")).await?;
//!     Ok(())
//! }
//! ```

pub mod dnsannotation;
pub mod dnsentry;
pub mod feedback;
pub mod finalizers;
pub mod ingress;
pub mod predicates;
pub mod service;
pub mod source;

#[cfg(test)]
pub(crate) mod test_support;
