// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Source controller for ingresses.
//!
//! An `Ingress` with the DNS names annotation gets one `DNSEntry` per annotated rule
//! host. The wildcard name `*` selects all rule hosts.

use crate::constants::KIND_INGRESS;
use crate::dns::equivalent_class;
use crate::dns_errors::ReconcileError;
use crate::labels::{ANNOTATION_CLASS, ANNOTATION_DNS_NAMES};
use crate::recorder::EventType;
use crate::reconcilers::source::{SourceActuator, SourceReconciler};
use crate::source::spec_input::ingress_spec_input;
use async_trait::async_trait;
use k8s_openapi::api::networking::v1::Ingress;
use kube::core::GroupVersionKind;
use std::collections::BTreeMap;

/// Actuator for `networking.k8s.io/v1` `Ingress` objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct IngressActuator;

fn is_relevant(
    reconciler: &SourceReconciler<Ingress>,
    annotations: &BTreeMap<String, String>,
) -> bool {
    let class = annotations
        .get(ANNOTATION_CLASS)
        .map(String::as_str)
        .unwrap_or_default();
    equivalent_class(class, reconciler.config().source_class())
        && annotations.contains_key(ANNOTATION_DNS_NAMES)
}

#[async_trait]
impl SourceActuator<Ingress> for IngressActuator {
    async fn reconcile_source_object(
        &self,
        reconciler: &SourceReconciler<Ingress>,
        ingress: &Ingress,
    ) -> Result<(), ReconcileError> {
        let annotations = reconciler.merged_annotations(ingress);
        let input = if is_relevant(reconciler, &annotations) {
            match ingress_spec_input(ingress, &annotations) {
                Ok(input) => input,
                Err(e) => {
                    reconciler
                        .recorder()
                        .dedup_event(ingress, EventType::Warning, "Invalid", &e.to_string())
                        .await;
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let result = reconciler.do_reconcile(ingress, input).await;
        if let Err(e) = &result {
            reconciler
                .recorder()
                .dedup_event(ingress, EventType::Warning, "ReconcileError", &e.to_string())
                .await;
        }
        result
    }

    fn is_relevant_source_object(
        &self,
        reconciler: &SourceReconciler<Ingress>,
        ingress: &Ingress,
    ) -> bool {
        is_relevant(reconciler, &reconciler.merged_annotations(ingress))
    }

    fn controller_name(&self) -> &'static str {
        "ingress-source"
    }

    fn finalizer_local_name(&self) -> &'static str {
        "ingress-dns"
    }

    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk("networking.k8s.io", "v1", KIND_INGRESS)
    }
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod ingress_tests;
