// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Source controller for load balancer services.
//!
//! A `Service` of type `LoadBalancer` with the DNS names annotation gets one `DNSEntry`
//! per name, pointing to the addresses (or host names) of its load balancer.

use crate::constants::KIND_SERVICE;
use crate::dns::equivalent_class;
use crate::dns_errors::ReconcileError;
use crate::labels::{ANNOTATION_CLASS, ANNOTATION_DNS_NAMES};
use crate::recorder::EventType;
use crate::reconcilers::source::{SourceActuator, SourceReconciler};
use crate::source::spec_input::service_spec_input;
use async_trait::async_trait;
use k8s_openapi::api::core::v1::Service;
use kube::core::GroupVersionKind;
use std::collections::BTreeMap;

/// Service type handled by the controller
const SERVICE_TYPE_LOAD_BALANCER: &str = "LoadBalancer";

/// Actuator for `v1` `Service` objects.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceActuator;

impl ServiceActuator {
    fn is_relevant(
        reconciler: &SourceReconciler<Service>,
        svc: &Service,
        annotations: &BTreeMap<String, String>,
    ) -> bool {
        let is_load_balancer = svc
            .spec
            .as_ref()
            .and_then(|s| s.type_.as_deref())
            .is_some_and(|t| t == SERVICE_TYPE_LOAD_BALANCER);
        let class = annotations
            .get(ANNOTATION_CLASS)
            .map(String::as_str)
            .unwrap_or_default();
        is_load_balancer
            && equivalent_class(class, reconciler.config().source_class())
            && annotations.contains_key(ANNOTATION_DNS_NAMES)
    }
}

#[async_trait]
impl SourceActuator<Service> for ServiceActuator {
    async fn reconcile_source_object(
        &self,
        reconciler: &SourceReconciler<Service>,
        svc: &Service,
    ) -> Result<(), ReconcileError> {
        let annotations = reconciler.merged_annotations(svc);
        let input = if Self::is_relevant(reconciler, svc, &annotations) {
            match service_spec_input(svc, &annotations) {
                Ok(input) => input,
                Err(e) => {
                    reconciler
                        .recorder()
                        .dedup_event(svc, EventType::Warning, "Invalid", &e.to_string())
                        .await;
                    return Err(e.into());
                }
            }
        } else {
            None
        };

        let result = reconciler.do_reconcile(svc, input).await;
        if let Err(e) = &result {
            reconciler
                .recorder()
                .dedup_event(svc, EventType::Warning, "ReconcileError", &e.to_string())
                .await;
        }
        result
    }

    fn is_relevant_source_object(
        &self,
        reconciler: &SourceReconciler<Service>,
        svc: &Service,
    ) -> bool {
        Self::is_relevant(reconciler, svc, &reconciler.merged_annotations(svc))
    }

    fn controller_name(&self) -> &'static str {
        "service-source"
    }

    fn finalizer_local_name(&self) -> &'static str {
        "service-dns"
    }

    fn gvk(&self) -> GroupVersionKind {
        GroupVersionKind::gvk("", "v1", KIND_SERVICE)
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod service_tests;
