// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Process wide annotation state.
//!
//! `DNSAnnotation` objects inject annotations into source objects without modifying
//! them. The `dnsannotation` controller records them here, keyed by the referenced
//! resource, and every source controller merges them into the annotations of the
//! source object before computing its desired state.
//!
//! The source controllers report back whether the annotations are in use
//! ([`AnnotationState::update_status`]), which is mirrored into the `DNSAnnotation`
//! status if a `DNSAnnotation` store is configured.
//!
//! The state is constructed once in `main` and shared by reference with all
//! controllers.

use crate::crd::{DNSAnnotation, ResourceReference};
use crate::dns_errors::StateError;
use crate::store::kubernetes::KubeStore;
use crate::store::{ObjectKey, ObjectStore};
use kube::Client;
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

#[derive(Clone, Debug)]
struct AnnotationData {
    annotations: BTreeMap<String, String>,
    annotation_key: ObjectKey,
    message: String,
    active: bool,
}

/// Injected annotations of a resource and their status.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ResourceAnnotationStatus {
    pub annotations: BTreeMap<String, String>,
    pub message: String,
    pub active: bool,
}

/// Injected annotations of all resources, keyed by resource reference.
#[derive(Default)]
pub struct AnnotationState {
    resources: Mutex<HashMap<String, AnnotationData>>,
    annotations: Option<Arc<dyn ObjectStore<DNSAnnotation>>>,
}

impl AnnotationState {
    /// State that mirrors status changes into the `DNSAnnotation` objects of the cluster.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self::with_store(Arc::new(KubeStore::<DNSAnnotation>::new(client)))
    }

    /// State that mirrors status changes into the `DNSAnnotation` objects of `store`.
    #[must_use]
    pub fn with_store(store: Arc<dyn ObjectStore<DNSAnnotation>>) -> Self {
        Self {
            resources: Mutex::default(),
            annotations: Some(store),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, HashMap<String, AnnotationData>>, StateError> {
        self.resources.lock().map_err(|_| StateError::LockPoisoned)
    }

    /// Records the annotations `annotation_key` injects into `resource`.
    ///
    /// # Errors
    ///
    /// Returns an error if another `DNSAnnotation` already targets the resource.
    pub fn set_resource_annotations(
        &self,
        resource: &ResourceReference,
        annotation_key: &ObjectKey,
        annotations: BTreeMap<String, String>,
    ) -> Result<(), StateError> {
        let mut resources = self.lock()?;
        let key = resource.to_string();
        match resources.get_mut(&key) {
            Some(data) if data.annotation_key != *annotation_key => {
                Err(StateError::ConflictingAnnotation {
                    existing: data.annotation_key.to_string(),
                })
            }
            Some(data) => {
                data.annotations = annotations;
                Ok(())
            }
            None => {
                resources.insert(
                    key,
                    AnnotationData {
                        annotations,
                        annotation_key: annotation_key.clone(),
                        message: String::new(),
                        active: false,
                    },
                );
                Ok(())
            }
        }
    }

    /// Injected annotations and status of `resource`; empty if there are none.
    pub fn resource_annotation_status(
        &self,
        resource: &ResourceReference,
    ) -> ResourceAnnotationStatus {
        let Ok(resources) = self.lock() else {
            return ResourceAnnotationStatus::default();
        };
        resources
            .get(&resource.to_string())
            .map(|data| ResourceAnnotationStatus {
                annotations: data.annotations.clone(),
                message: data.message.clone(),
                active: data.active,
            })
            .unwrap_or_default()
    }

    /// Forgets the injected annotations of `resource`.
    pub fn delete_resource_annotations(&self, resource: &ResourceReference) {
        if let Ok(mut resources) = self.lock() {
            resources.remove(&resource.to_string());
        }
    }

    /// Forgets all annotations injected by the `DNSAnnotation` `annotation_key`.
    pub fn delete_by_annotation_key(&self, annotation_key: &ObjectKey) {
        if let Ok(mut resources) = self.lock() {
            resources.retain(|_, data| data.annotation_key != *annotation_key);
        }
    }

    /// Forgets the annotations `annotation_key` injects into resources other than `keep`.
    pub fn release_other_resources(&self, annotation_key: &ObjectKey, keep: &ResourceReference) {
        let keep = keep.to_string();
        if let Ok(mut resources) = self.lock() {
            resources.retain(|resource, data| {
                data.annotation_key != *annotation_key || *resource == keep
            });
        }
    }

    /// Forgets everything.
    pub fn reset(&self) {
        if let Ok(mut resources) = self.lock() {
            resources.clear();
        }
    }

    /// Number of resources with injected annotations.
    pub fn len(&self) -> usize {
        self.lock().map(|r| r.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records whether the injected annotations of `resource` are in use.
    ///
    /// Does nothing for resources without injected annotations. The `DNSAnnotation`
    /// status is only patched if the state changed, and the state only changes once the
    /// patch succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if patching the `DNSAnnotation` status fails.
    pub async fn update_status(
        &self,
        resource: &ResourceReference,
        active: bool,
    ) -> Result<(), StateError> {
        let annotation_key = {
            let resources = self.lock()?;
            let Some(data) = resources.get(&resource.to_string()) else {
                return Ok(());
            };
            if data.active == active && data.message.is_empty() {
                return Ok(());
            }
            data.annotation_key.clone()
        };

        if let Some(store) = &self.annotations {
            write_status(store.as_ref(), &annotation_key, resource, active).await?;
        }

        let mut resources = self.lock()?;
        if let Some(data) = resources
            .get_mut(&resource.to_string())
            .filter(|data| data.annotation_key == annotation_key)
        {
            data.active = active;
            data.message.clear();
        }
        Ok(())
    }
}

async fn write_status(
    store: &dyn ObjectStore<DNSAnnotation>,
    annotation_key: &ObjectKey,
    resource: &ResourceReference,
    active: bool,
) -> Result<(), StateError> {
    let status_error = |source| StateError::StatusUpdate {
        key: annotation_key.to_string(),
        source,
    };
    let Some(annotation) = store.get(annotation_key).await.map_err(status_error)? else {
        return Ok(());
    };
    debug!(
        annotation = %annotation_key,
        resource = %resource,
        active,
        "Updating DNSAnnotation status"
    );
    match store
        .patch_status(&annotation, json!({ "active": active, "message": "" }))
        .await
    {
        Err(e) if e.is_not_found() => Ok(()),
        result => result.map_err(status_error),
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod state_tests;
