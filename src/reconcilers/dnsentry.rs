// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Source controller for `DNSEntry` objects of the source cluster.
//!
//! Each `DNSEntry` of the source class is mirrored to one `DNSEntry` of the target class
//! in the control plane cluster. The generated entry is recorded on the source in the
//! target entry annotation, and its status is copied back to the source after every
//! successful reconciliation.

use crate::constants::{API_GROUP, API_VERSION, KIND_DNS_ENTRY};
use crate::crd::DNSEntry;
use crate::dns::equivalent_class;
use crate::dns_errors::ReconcileError;
use crate::labels::{ANNOTATION_CLASS, ANNOTATION_TARGET_ENTRY};
use crate::recorder::EventType;
use crate::reconcilers::source::{SourceActuator, SourceReconciler};
use crate::source::ownership::map_entry_to_sources;
use crate::source::spec_input::dnsentry_spec_input;
use crate::store::{is_deleting, ObjectKey};
use async_trait::async_trait;
use kube::core::GroupVersionKind;
use kube::ResourceExt;
use std::collections::BTreeMap;
use tracing::{debug, error};

/// Actuator for `dns.gardener.cloud/v1alpha1` `DNSEntry` objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct DNSEntryActuator;

/// Entries of the source class are relevant unless they were generated by a
/// `DNSEntry` source controller themselves.
fn is_relevant(
    reconciler: &SourceReconciler<DNSEntry>,
    entry: &DNSEntry,
    annotations: &BTreeMap<String, String>,
) -> bool {
    if !map_entry_to_sources(&entry.metadata, reconciler.gvk()).is_empty() {
        return false;
    }
    let class = annotations
        .get(ANNOTATION_CLASS)
        .map(String::as_str)
        .unwrap_or_default();
    equivalent_class(class, reconciler.config().source_class())
}

/// Parses the `namespace/name` value of the target entry annotation.
#[must_use]
pub fn parse_target_entry(value: &str) -> Option<ObjectKey> {
    match value.split('/').collect::<Vec<_>>().as_slice() {
        [namespace, name] => Some(ObjectKey::new(*namespace, *name)),
        _ => None,
    }
}

/// Copies the status of the generated entry to the source entry.
async fn mirror_target_status(
    reconciler: &SourceReconciler<DNSEntry>,
    source: &DNSEntry,
) -> Result<(), ReconcileError> {
    let Some(value) = source.annotations().get(ANNOTATION_TARGET_ENTRY) else {
        return Ok(());
    };
    let Some(key) = parse_target_entry(value) else {
        error!(
            entry = %ObjectKey::of(source),
            annotation = %value,
            "Invalid target entry annotation"
        );
        return Ok(());
    };

    let target = reconciler.entries().get(&key).await.map_err(|e| {
        ReconcileError::store(format!("failed to get target DNSEntry {key}"), e)
    })?;
    let Some(target) = target.filter(|t| !is_deleting(t)) else {
        return Ok(());
    };

    let mut status = target.status.clone().unwrap_or_default();
    status.observed_generation = source.metadata.generation;
    if source.status.as_ref() == Some(&status) {
        return Ok(());
    }
    debug!(entry = %ObjectKey::of(source), target = %key, "Mirroring target entry status");
    let value = serde_json::to_value(&status).map_err(|e| {
        ReconcileError::store(
            format!("failed to encode status of DNSEntry {}", ObjectKey::of(source)),
            e.into(),
        )
    })?;
    reconciler
        .sources()
        .patch_status(source, value)
        .await
        .map_err(|e| {
            ReconcileError::store(
                format!("failed to update status of DNSEntry {}", ObjectKey::of(source)),
                e,
            )
        })
}

#[async_trait]
impl SourceActuator<DNSEntry> for DNSEntryActuator {
    async fn reconcile_source_object(
        &self,
        reconciler: &SourceReconciler<DNSEntry>,
        entry: &DNSEntry,
    ) -> Result<(), ReconcileError> {
        let annotations = reconciler.merged_annotations(entry);
        let input = if is_relevant(reconciler, entry, &annotations) {
            dnsentry_spec_input(entry, &annotations)
        } else {
            None
        };

        if let Err(e) = reconciler.do_reconcile(entry, input).await {
            reconciler
                .recorder()
                .dedup_event(entry, EventType::Warning, "ReconcileError", &e.to_string())
                .await;
            return Err(e);
        }
        mirror_target_status(reconciler, entry).await
    }

    fn is_relevant_source_object(
        &self,
        reconciler: &SourceReconciler<DNSEntry>,
        entry: &DNSEntry,
    ) -> bool {
        is_relevant(reconciler, entry, &reconciler.merged_annotations(entry))
    }

    fn controller_name(&self) -> &'static str {
        "dnsentry-source"
    }

    fn finalizer_local_name(&self) -> &'static str {
        "dnsentry-source"
    }

    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk(API_GROUP, API_VERSION, KIND_DNS_ENTRY)
    }

    fn should_set_target_entry_annotation(&self) -> bool {
        true
    }
}

#[cfg(test)]
#[path = "dnsentry_tests.rs"]
mod dnsentry_tests;
