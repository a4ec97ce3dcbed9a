// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! `DNSAnnotation` reconciliation.
//!
//! Feeds the annotations of `DNSAnnotation` objects into the shared
//! [`AnnotationState`]. The source controllers watch `DNSAnnotation` objects as well and
//! pick up the injected annotations on their next reconciliation.
//!
//! A `DNSAnnotation` may only reference objects in its own namespace, and only one
//! `DNSAnnotation` may reference a given object. Violations are reported in the status
//! and are not retried.

use crate::constants::{DNS_ANNOTATION_FINALIZER, KIND_DNS_ANNOTATION};
use crate::crd::{DNSAnnotation, DNSAnnotationStatus};
use crate::dns_errors::{ReconcileError, StoreError};
use crate::state::AnnotationState;
use crate::store::ObjectKey;
use kube::api::{Patch, PatchParams};
use kube::runtime::controller::Action;
use kube::runtime::finalizer;
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

/// Message reported for annotations of objects in other namespaces
pub const CROSS_NAMESPACE_MESSAGE: &str = "cross-namespace annotation not allowed";

/// Context of the `DNSAnnotation` controller.
pub struct AnnotationContext {
    pub client: Client,
    pub state: Arc<AnnotationState>,
}

/// Registers the annotations of a `DNSAnnotation` and returns its new status.
pub fn apply_annotation(
    state: &AnnotationState,
    annotation: &DNSAnnotation,
) -> DNSAnnotationStatus {
    let key = ObjectKey::of(annotation);
    let resource_ref = &annotation.spec.resource_ref;
    state.release_other_resources(&key, resource_ref);

    if resource_ref.namespace != key.namespace {
        state.delete_by_annotation_key(&key);
        return DNSAnnotationStatus {
            active: false,
            message: CROSS_NAMESPACE_MESSAGE.to_string(),
        };
    }

    match state.set_resource_annotations(resource_ref, &key, annotation.spec.annotations.clone()) {
        Ok(()) => DNSAnnotationStatus {
            active: state.resource_annotation_status(resource_ref).active,
            message: String::new(),
        },
        Err(e) => DNSAnnotationStatus {
            active: false,
            message: e.to_string(),
        },
    }
}

/// Forgets the annotations of a deleted `DNSAnnotation`.
pub fn cleanup_annotation(state: &AnnotationState, annotation: &DNSAnnotation) {
    state.delete_by_annotation_key(&ObjectKey::of(annotation));
}

async fn patch_status(
    api: &Api<DNSAnnotation>,
    annotation: &DNSAnnotation,
    status: DNSAnnotationStatus,
) -> Result<(), ReconcileError> {
    if annotation.status.as_ref() == Some(&status) {
        return Ok(());
    }
    debug!(
        annotation = %ObjectKey::of(annotation),
        active = status.active,
        message = %status.message,
        "Updating DNSAnnotation status"
    );
    let patch = json!({ "status": { "active": status.active, "message": status.message } });
    api.patch_status(
        &annotation.name_any(),
        &PatchParams::default(),
        &Patch::Merge(&patch),
    )
    .await
    .map_err(|e| {
        ReconcileError::store(
            format!("failed to update status of DNSAnnotation {}", ObjectKey::of(annotation)),
            e.into(),
        )
    })?;
    Ok(())
}

/// Reconciles a `DNSAnnotation`.
///
/// # Errors
///
/// Returns an error if the finalizer or the status cannot be written.
pub async fn reconcile_dnsannotation(
    annotation: Arc<DNSAnnotation>,
    ctx: Arc<AnnotationContext>,
) -> Result<Action, ReconcileError> {
    let start = std::time::Instant::now();
    let key = ObjectKey::of(annotation.as_ref());
    let api: Api<DNSAnnotation> = Api::namespaced(ctx.client.clone(), &key.namespace);

    let result = finalizer(&api, DNS_ANNOTATION_FINALIZER, annotation, |event| async {
        match event {
            finalizer::Event::Apply(annotation) => {
                let status = apply_annotation(&ctx.state, &annotation);
                patch_status(&api, &annotation, status).await?;
                Ok(Action::await_change())
            }
            finalizer::Event::Cleanup(annotation) => {
                cleanup_annotation(&ctx.state, &annotation);
                info!("Removed annotations of {} {}", KIND_DNS_ANNOTATION, key);
                Ok(Action::await_change())
            }
        }
    })
    .await;

    let duration = start.elapsed();
    if result.is_ok() {
        crate::metrics::record_reconciliation_success("dnsannotation", duration);
    } else {
        crate::metrics::record_reconciliation_error("dnsannotation", duration);
    }

    result.map_err(|e: finalizer::Error<ReconcileError>| match e {
        finalizer::Error::ApplyFailed(err) | finalizer::Error::CleanupFailed(err) => err,
        finalizer::Error::AddFinalizer(err) => ReconcileError::store(
            format!("failed to add finalizer to {KIND_DNS_ANNOTATION} {key}"),
            err.into(),
        ),
        finalizer::Error::RemoveFinalizer(err) => ReconcileError::store(
            format!("failed to remove finalizer from {KIND_DNS_ANNOTATION} {key}"),
            err.into(),
        ),
        other @ (finalizer::Error::UnnamedObject | finalizer::Error::InvalidFinalizer) => {
            ReconcileError::store(
                format!("cannot manage finalizer of {KIND_DNS_ANNOTATION} {key}"),
                StoreError::Invalid {
                    kind: KIND_DNS_ANNOTATION.to_string(),
                    reason: other.to_string(),
                },
            )
        }
    })
}

#[cfg(test)]
#[path = "dnsannotation_tests.rs"]
mod dnsannotation_tests;
