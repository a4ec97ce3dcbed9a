// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Generic source reconciliation engine.
//!
//! [`SourceReconciler`] keeps the `DNSEntry` objects generated for one source object in
//! line with the desired state computed from it. The kind specific parts (relevance,
//! desired state extraction, events on invalid input) are supplied by a
//! [`SourceActuator`].
//!
//! # Reconciliation Flow
//!
//! 1. **Fetch** the source object. A missing object is treated as already deleted.
//! 2. **Discover** the owned entries in the target namespace.
//! 3. **Plan** one entry per desired DNS name, reusing the first owned entry with the
//!    same DNS name. All other owned entries are obsolete, including further entries
//!    for a kept DNS name.
//! 4. **Delete** obsolete entries, before anything is created, so that renaming a DNS
//!    name never leaves two entries behind.
//! 5. **Create or patch** the kept entries. Events are only recorded for real changes.
//! 6. **Finalizer** on the source object while it owns entries.
//! 7. **Status** of injected `DNSAnnotation` annotations.

use crate::config::SourceControllerConfig;
use crate::crd::{DNSEntry, DNSEntrySpec};
use crate::dns::{class_source_finalizer, normalize_class};
use crate::dns_errors::ReconcileError;
use crate::recorder::{DedupRecorder, EventType};
use crate::source::spec_input::{build_resource_reference, merged_annotations, modify_entry_for};
use crate::source::{DNSSpecInput, EntryOwnerData, OwnerData};
use crate::state::AnnotationState;
use crate::store::{
    create_or_patch, has_finalizer, is_deleting, ObjectKey, ObjectStore, OperationResult,
    StoredObject,
};
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::GroupVersionKind;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Kind specific part of a source controller.
#[async_trait]
pub trait SourceActuator<T: StoredObject>: Send + Sync {
    /// Computes the desired state of the object and applies it with
    /// [`SourceReconciler::do_reconcile`].
    async fn reconcile_source_object(
        &self,
        reconciler: &SourceReconciler<T>,
        obj: &T,
    ) -> Result<(), ReconcileError>;

    /// Whether the object asks for DNS entries.
    fn is_relevant_source_object(&self, reconciler: &SourceReconciler<T>, obj: &T) -> bool;

    /// Name of the controller, used in logs and metrics.
    fn controller_name(&self) -> &'static str;

    /// Controller specific part of the source finalizer.
    fn finalizer_local_name(&self) -> &'static str;

    fn gvk(&self) -> GroupVersionKind;

    /// Whether the source object records its generated entry in the target entry
    /// annotation.
    fn should_set_target_entry_annotation(&self) -> bool {
        false
    }

    /// Called when the source object is gone or being deleted.
    fn on_delete(&self, _key: &ObjectKey) {}
}

/// Reconciler of the entries generated for one source kind.
pub struct SourceReconciler<T: StoredObject> {
    actuator: Arc<dyn SourceActuator<T>>,
    sources: Arc<dyn ObjectStore<T>>,
    entries: Arc<dyn ObjectStore<DNSEntry>>,
    recorder: Arc<DedupRecorder>,
    state: Arc<AnnotationState>,
    config: SourceControllerConfig,
    gvk: GroupVersionKind,
    finalizer_name: String,
}

impl<T: StoredObject> SourceReconciler<T> {
    /// Creates the reconciler.
    ///
    /// `sources` accesses the source cluster, `entries` the control plane cluster.
    pub fn new(
        actuator: Arc<dyn SourceActuator<T>>,
        config: SourceControllerConfig,
        sources: Arc<dyn ObjectStore<T>>,
        entries: Arc<dyn ObjectStore<DNSEntry>>,
        recorder: Arc<DedupRecorder>,
        state: Arc<AnnotationState>,
    ) -> Self {
        let gvk = actuator.gvk();
        let finalizer_name = class_source_finalizer(
            &normalize_class(config.source_class()),
            actuator.finalizer_local_name(),
        );
        Self {
            actuator,
            sources,
            entries,
            recorder,
            state,
            config,
            gvk,
            finalizer_name,
        }
    }

    #[must_use]
    pub fn actuator(&self) -> &dyn SourceActuator<T> {
        self.actuator.as_ref()
    }

    #[must_use]
    pub fn config(&self) -> &SourceControllerConfig {
        &self.config
    }

    #[must_use]
    pub fn gvk(&self) -> &GroupVersionKind {
        &self.gvk
    }

    #[must_use]
    pub fn controller_name(&self) -> &'static str {
        self.actuator.controller_name()
    }

    /// Finalizer set on source objects owning entries.
    #[must_use]
    pub fn finalizer_name(&self) -> &str {
        &self.finalizer_name
    }

    #[must_use]
    pub fn sources(&self) -> &dyn ObjectStore<T> {
        self.sources.as_ref()
    }

    #[must_use]
    pub fn entries(&self) -> &dyn ObjectStore<DNSEntry> {
        self.entries.as_ref()
    }

    #[must_use]
    pub fn recorder(&self) -> &DedupRecorder {
        &self.recorder
    }

    #[must_use]
    pub fn state(&self) -> &AnnotationState {
        &self.state
    }

    /// Relevance of generated entries for this controller.
    #[must_use]
    pub fn entry_owner_data(&self) -> EntryOwnerData {
        EntryOwnerData::new(self.config.clone(), self.gvk.clone())
    }

    /// Annotations of the object merged with those injected by a `DNSAnnotation`.
    pub fn merged_annotations(&self, obj: &T) -> BTreeMap<String, String> {
        merged_annotations(&self.state, &self.gvk, obj)
    }

    /// Whether the actuator considers the object relevant.
    pub fn is_relevant(&self, obj: &T) -> bool {
        self.actuator.is_relevant_source_object(self, obj)
    }

    fn owner_data(&self, obj: &T) -> OwnerData {
        OwnerData::for_object(obj, self.config.source_cluster_id(), &self.gvk)
    }

    /// Namespace of the entries generated for the object.
    fn target_namespace(&self, obj: &T) -> String {
        self.config
            .target_namespace()
            .map(str::to_string)
            .unwrap_or_else(|| obj.namespace().unwrap_or_default())
    }

    fn new_entry(&self, obj: &T) -> DNSEntry {
        let generate_name = format!(
            "{}{}-{}-",
            self.config.target_name_prefix(),
            obj.name_any(),
            self.gvk.kind
        )
        .to_lowercase();
        DNSEntry {
            metadata: ObjectMeta {
                generate_name: Some(generate_name),
                namespace: Some(self.target_namespace(obj)),
                ..Default::default()
            },
            spec: DNSEntrySpec::default(),
            status: None,
        }
    }

    fn describe(&self, obj: &T) -> String {
        format!("{} {}", self.gvk.kind, ObjectKey::of(obj))
    }

    /// Reconciles the source object with the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or writing objects fails or if the desired state
    /// cannot be computed. The caller retries with backoff.
    pub async fn reconcile(&self, key: &ObjectKey) -> Result<(), ReconcileError> {
        let obj = self.sources.get(key).await.map_err(|e| {
            ReconcileError::store(format!("failed to get {} {key}", self.gvk.kind), e)
        })?;
        let Some(obj) = obj else {
            debug!(
                controller = self.controller_name(),
                object = %key,
                "Object is gone, stop reconciling"
            );
            self.actuator.on_delete(key);
            return Ok(());
        };

        if is_deleting(&obj) {
            self.actuator.on_delete(key);
            return self.do_delete(&obj).await;
        }
        self.actuator.reconcile_source_object(self, &obj).await
    }

    /// Applies the desired state to the entries owned by the object.
    ///
    /// Without input, or without DNS names, all owned entries are deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if an object store operation fails.
    pub async fn do_reconcile(
        &self,
        obj: &T,
        input: Option<DNSSpecInput>,
    ) -> Result<(), ReconcileError> {
        let Some(input) = input.filter(|i| !i.names.is_empty()) else {
            debug!(
                controller = self.controller_name(),
                object = %ObjectKey::of(obj),
                "No DNS names requested"
            );
            return self.do_delete(obj).await;
        };

        let owned = self.owned_entries(obj).await?;
        let mut planned: Vec<(&str, Option<DNSEntry>)> = Vec::with_capacity(input.names.len());
        for name in input.names.iter() {
            let existing = owned.iter().find(|e| e.spec.dns_name == name).cloned();
            planned.push((name, existing));
        }
        let kept: Vec<String> = planned
            .iter()
            .filter_map(|(_, existing)| existing.as_ref().map(ResourceExt::name_any))
            .collect();
        let obsolete: Vec<&DNSEntry> = owned
            .iter()
            .filter(|e| !kept.contains(&e.name_any()))
            .collect();

        for entry in obsolete {
            self.delete_entry(obj, entry).await?;
        }

        let owner = self.owner_data(obj);
        let target_cluster = self.config.target_cluster_id();
        for (dns_name, existing) in &planned {
            match existing {
                None => {
                    let mut entry = self.new_entry(obj);
                    owner.add_owner(&mut entry.metadata, target_cluster);
                    modify_entry_for(&mut entry, &self.config, &input, dns_name);
                    let created = self.entries.create(&entry).await.map_err(|e| {
                        ReconcileError::store(
                            format!("failed to create DNSEntry for {}", self.describe(obj)),
                            e,
                        )
                    })?;
                    self.entry_created(obj, dns_name, &created).await;
                }
                Some(entry) => {
                    let (patched, result) = create_or_patch(self.entries.as_ref(), entry, |e| {
                        owner.add_owner(&mut e.metadata, target_cluster);
                        modify_entry_for(e, &self.config, &input, dns_name);
                    })
                    .await
                    .map_err(|e| {
                        ReconcileError::store(
                            format!("failed to patch DNSEntry {}", ObjectKey::of(entry)),
                            e,
                        )
                    })?;
                    match result {
                        OperationResult::Created => {
                            self.entry_created(obj, dns_name, &patched).await;
                        }
                        OperationResult::Updated => {
                            info!(
                                controller = self.controller_name(),
                                dns_name = %dns_name,
                                entry = %ObjectKey::of(&patched),
                                "Updated DNSEntry"
                            );
                            crate::metrics::record_entry_operation(
                                self.controller_name(),
                                "updated",
                            );
                            self.recorder
                                .event(
                                    obj,
                                    EventType::Normal,
                                    "DNSEntryUpdated",
                                    &format!(
                                        "{dns_name}: updated entry {} in control plane",
                                        patched.name_any()
                                    ),
                                )
                                .await;
                        }
                        OperationResult::Unchanged => {}
                    }
                }
            }
        }

        self.add_finalizer(obj).await?;
        self.state
            .update_status(&build_resource_reference(&self.gvk, obj), true)
            .await?;
        Ok(())
    }

    /// Deletes all entries owned by the object and releases it.
    ///
    /// # Errors
    ///
    /// Returns an error if an object store operation fails.
    pub async fn do_delete(&self, obj: &T) -> Result<(), ReconcileError> {
        for entry in &self.owned_entries(obj).await? {
            self.delete_entry(obj, entry).await?;
        }
        self.remove_finalizer(obj).await?;
        self.state
            .update_status(&build_resource_reference(&self.gvk, obj), false)
            .await?;
        Ok(())
    }

    /// Entries in the target namespace owned by the object.
    async fn owned_entries(&self, obj: &T) -> Result<Vec<DNSEntry>, ReconcileError> {
        let namespace = self.target_namespace(obj);
        let entries = self.entries.list(&namespace).await.map_err(|e| {
            ReconcileError::store(
                format!("failed to list owned DNSEntries for {}", self.describe(obj)),
                e,
            )
        })?;
        let owner = self.owner_data(obj);
        let target_cluster = self.config.target_cluster_id();
        Ok(entries
            .into_iter()
            .filter(|e| owner.has_owner(&e.metadata, target_cluster))
            .collect())
    }

    async fn delete_entry(&self, obj: &T, entry: &DNSEntry) -> Result<(), ReconcileError> {
        let key = ObjectKey::of(entry);
        match self.entries.delete(&key).await {
            Ok(()) => {
                info!(
                    controller = self.controller_name(),
                    dns_name = %entry.spec.dns_name,
                    entry = %key,
                    "Deleted DNSEntry"
                );
                crate::metrics::record_entry_operation(self.controller_name(), "deleted");
                self.recorder
                    .dedup_event(
                        obj,
                        EventType::Normal,
                        "DNSEntryDeleted",
                        &format!(
                            "{}: deleted entry {} in control plane",
                            entry.spec.dns_name, key.name
                        ),
                    )
                    .await;
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(ReconcileError::store(
                format!("failed to delete obsolete owned DNSEntry {key}"),
                e,
            )),
        }
    }

    async fn entry_created(&self, obj: &T, dns_name: &str, entry: &DNSEntry) {
        info!(
            controller = self.controller_name(),
            dns_name = %dns_name,
            entry = %ObjectKey::of(entry),
            "Created DNSEntry"
        );
        crate::metrics::record_entry_operation(self.controller_name(), "created");
        self.recorder
            .event(
                obj,
                EventType::Normal,
                "DNSEntryCreated",
                &format!(
                    "{dns_name}: created entry {} in control plane",
                    entry.name_any()
                ),
            )
            .await;
    }

    async fn add_finalizer(&self, obj: &T) -> Result<(), ReconcileError> {
        if has_finalizer(obj, &self.finalizer_name) {
            return Ok(());
        }
        self.sources
            .add_finalizer(obj, &self.finalizer_name)
            .await
            .map_err(|e| {
                ReconcileError::store(
                    format!("failed to add finalizer to {}", self.describe(obj)),
                    e,
                )
            })
    }

    async fn remove_finalizer(&self, obj: &T) -> Result<(), ReconcileError> {
        if !has_finalizer(obj, &self.finalizer_name) {
            return Ok(());
        }
        match self.sources.remove_finalizer(obj, &self.finalizer_name).await {
            Err(e) if !e.is_not_found() => Err(ReconcileError::store(
                format!("failed to remove finalizer from {}", self.describe(obj)),
                e,
            )),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
#[path = "source_tests.rs"]
mod source_tests;
