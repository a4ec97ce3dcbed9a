// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Ownership of generated entries.
//!
//! A generated `DNSEntry` records the source object that caused it in one of two ways:
//!
//! - **Native owner reference**, if owner and entry live in the same namespace of the
//!   same cluster. The reference is a controller reference, de-duplicated by UID.
//! - **Owner annotation token** `[clusterID:]group/kind/namespace/name` in the
//!   comma-joined [`ANNOTATION_OWNERS`] annotation otherwise. The cluster prefix is
//!   present if the owner cluster differs from the entry cluster. Tokens are
//!   de-duplicated by exact match.
//!
//! An entry may carry both kinds of markers for different owners. [`OwnerMarker`] is
//! the single place where the locality decision is made.
//!
//! [`EntryOwnerData`] answers the inverse question for watch events: whether an entry
//! belongs to a source controller at all, and which source objects own it.

use crate::config::SourceControllerConfig;
use crate::crd::DNSEntry;
use crate::dns::equivalent_class;
use crate::labels::{ANNOTATION_CLASS, ANNOTATION_OWNERS};
use crate::store::ObjectKey;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, OwnerReference};
use kube::core::GroupVersionKind;
use kube::{Resource, ResourceExt};
use std::fmt;

/// Returns `group/version`, or `version` for the core group.
#[must_use]
pub fn api_version(gvk: &GroupVersionKind) -> String {
    if gvk.group.is_empty() {
        gvk.version.clone()
    } else {
        format!("{}/{}", gvk.group, gvk.version)
    }
}

/// Identity of a source object owning generated entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerData {
    /// Namespace of the owner
    pub namespace: String,
    /// Name of the owner
    pub name: String,
    /// UID of the owner
    pub uid: String,
    /// Cluster of the owner (empty for the default cluster)
    pub cluster_id: String,
    /// Kind of the owner
    pub gvk: GroupVersionKind,
}

/// How ownership is recorded on a target object.
#[derive(Clone, Debug, PartialEq)]
pub enum OwnerMarker {
    /// Controller owner reference (same namespace, same cluster)
    NativeRef(OwnerReference),
    /// `[clusterID:]group/kind/namespace/name` in the owners annotation
    AnnotationToken(String),
}

impl OwnerData {
    /// Builds the owner data of a source object.
    pub fn for_object<K: Resource>(obj: &K, cluster_id: &str, gvk: &GroupVersionKind) -> Self {
        Self {
            namespace: obj.namespace().unwrap_or_default(),
            name: obj.name_any(),
            uid: obj.uid().unwrap_or_default(),
            cluster_id: cluster_id.to_string(),
            gvk: gvk.clone(),
        }
    }

    /// The annotation token of the owner as seen from the given target cluster.
    #[must_use]
    pub fn as_annotation_ref(&self, target_cluster_id: &str) -> String {
        let basic = format!(
            "{}/{}/{}/{}",
            self.gvk.group, self.gvk.kind, self.namespace, self.name
        );
        if target_cluster_id == self.cluster_id {
            basic
        } else {
            format!("{}:{basic}", self.cluster_id)
        }
    }

    /// Controller reference pointing to the owner.
    #[must_use]
    pub fn controller_ref(&self) -> OwnerReference {
        OwnerReference {
            api_version: api_version(&self.gvk),
            kind: self.gvk.kind.clone(),
            name: self.name.clone(),
            uid: self.uid.clone(),
            controller: Some(true),
            block_owner_deletion: Some(true),
        }
    }

    /// Chooses the marker for a target object in `target_namespace` of `target_cluster_id`.
    #[must_use]
    pub fn marker_for(&self, target_namespace: &str, target_cluster_id: &str) -> OwnerMarker {
        if self.namespace == target_namespace && self.cluster_id == target_cluster_id {
            OwnerMarker::NativeRef(self.controller_ref())
        } else {
            OwnerMarker::AnnotationToken(self.as_annotation_ref(target_cluster_id))
        }
    }

    fn marker(&self, target: &ObjectMeta, target_cluster_id: &str) -> OwnerMarker {
        self.marker_for(
            target.namespace.as_deref().unwrap_or_default(),
            target_cluster_id,
        )
    }

    /// Records the owner on the target. Returns false if it was already recorded.
    pub fn add_owner(&self, target: &mut ObjectMeta, target_cluster_id: &str) -> bool {
        if self.has_owner(target, target_cluster_id) {
            return false;
        }
        match self.marker(target, target_cluster_id) {
            OwnerMarker::NativeRef(owner_ref) => {
                target
                    .owner_references
                    .get_or_insert_with(Vec::new)
                    .push(owner_ref);
            }
            OwnerMarker::AnnotationToken(token) => {
                let mut owners = annotated_owners(target);
                owners.push(token);
                set_owners_annotation(target, &owners);
            }
        }
        true
    }

    /// Whether the owner is recorded on the target.
    #[must_use]
    pub fn has_owner(&self, target: &ObjectMeta, target_cluster_id: &str) -> bool {
        match self.marker(target, target_cluster_id) {
            OwnerMarker::NativeRef(owner_ref) => target
                .owner_references
                .iter()
                .flatten()
                .any(|r| r.uid == owner_ref.uid),
            OwnerMarker::AnnotationToken(token) => annotated_owners(target).contains(&token),
        }
    }

    /// Removes the owner from the target. Returns whether a marker was removed.
    ///
    /// Removing the last annotation token leaves the owners annotation with an empty
    /// value.
    pub fn remove_owner(&self, target: &mut ObjectMeta, target_cluster_id: &str) -> bool {
        match self.marker(target, target_cluster_id) {
            OwnerMarker::NativeRef(owner_ref) => {
                let Some(refs) = target.owner_references.as_mut() else {
                    return false;
                };
                let before = refs.len();
                refs.retain(|r| r.uid != owner_ref.uid);
                before != refs.len()
            }
            OwnerMarker::AnnotationToken(token) => {
                let mut owners = annotated_owners(target);
                let before = owners.len();
                owners.retain(|o| *o != token);
                set_owners_annotation(target, &owners);
                before != owners.len()
            }
        }
    }
}

impl fmt::Display for OwnerData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_annotation_ref(""))
    }
}

/// A parsed owner annotation token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerToken {
    /// Cluster prefix, if present
    pub cluster_id: Option<String>,
    pub group: String,
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl OwnerToken {
    /// Parses `[clusterID:]group/kind/namespace/name`.
    ///
    /// The cluster prefix ends at the first colon. Returns `None` unless the remainder
    /// has exactly four `/` separated parts.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        let (cluster_id, rest) = match token.split_once(':') {
            Some((cluster, rest)) => (Some(cluster.to_string()), rest),
            None => (None, token),
        };
        let parts: Vec<&str> = rest.split('/').collect();
        let [group, kind, namespace, name] = parts.as_slice() else {
            return None;
        };
        Some(Self {
            cluster_id,
            group: (*group).to_string(),
            kind: (*kind).to_string(),
            namespace: (*namespace).to_string(),
            name: (*name).to_string(),
        })
    }

    fn matches_kind(&self, gvk: &GroupVersionKind) -> bool {
        self.group == gvk.group && self.kind == gvk.kind
    }

    fn object_key(&self) -> ObjectKey {
        ObjectKey::new(&self.namespace, &self.name)
    }
}

/// Owner tokens of the owners annotation, in order.
#[must_use]
pub fn annotated_owners(meta: &ObjectMeta) -> Vec<String> {
    meta.annotations
        .as_ref()
        .and_then(|a| a.get(ANNOTATION_OWNERS))
        .map(|value| {
            value
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn set_owners_annotation(meta: &mut ObjectMeta, owners: &[String]) {
    meta.annotations
        .get_or_insert_with(Default::default)
        .insert(ANNOTATION_OWNERS.to_string(), owners.join(","));
}

/// Relevance of generated entries for one source controller.
///
/// Unlike [`OwnerData`] this works without knowing the specific owner, matching owners
/// by kind only.
#[derive(Clone, Debug)]
pub struct EntryOwnerData {
    pub config: SourceControllerConfig,
    pub gvk: GroupVersionKind,
}

impl EntryOwnerData {
    pub fn new(config: SourceControllerConfig, gvk: GroupVersionKind) -> Self {
        Self { config, gvk }
    }

    /// Whether the entry has the target class, lives in the target namespace (if one is
    /// configured) and is owned by an object of the controller's kind.
    #[must_use]
    pub fn is_relevant_entry(&self, entry: &DNSEntry) -> bool {
        let class = entry
            .metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(ANNOTATION_CLASS))
            .map(String::as_str)
            .unwrap_or_default();
        if !equivalent_class(class, self.config.effective_target_class()) {
            return false;
        }
        if let Some(ns) = self.config.target_namespace() {
            if entry.metadata.namespace.as_deref() != Some(ns) {
                return false;
            }
        }
        !self.owner_object_keys(&entry.metadata).is_empty()
    }

    /// Keys of the owners of the controller's kind.
    ///
    /// Native references count only if source and target cluster are the same.
    /// Annotation tokens count if their cluster prefix is the one written for owners
    /// of the source cluster.
    #[must_use]
    pub fn owner_object_keys(&self, meta: &ObjectMeta) -> Vec<ObjectKey> {
        let source_cluster = self.config.source_cluster_id();
        let target_cluster = self.config.target_cluster_id();
        let mut keys = Vec::new();

        if source_cluster == target_cluster {
            let api_version = api_version(&self.gvk);
            let namespace = meta.namespace.as_deref().unwrap_or_default();
            keys.extend(
                meta.owner_references
                    .iter()
                    .flatten()
                    .filter(|r| r.kind == self.gvk.kind && r.api_version == api_version)
                    .map(|r| ObjectKey::new(namespace, &r.name)),
            );
        }

        let expected_cluster = (source_cluster != target_cluster).then_some(source_cluster);
        keys.extend(
            annotated_owners(meta)
                .iter()
                .filter_map(|t| OwnerToken::parse(t))
                .filter(|t| t.matches_kind(&self.gvk))
                .filter(|t| t.cluster_id.as_deref() == expected_cluster)
                .map(|t| t.object_key()),
        );
        keys
    }
}

/// Maps an entry to the source objects of the given kind owning it.
///
/// The first matching native owner reference wins. Without one, every owner token
/// of the kind yields a key, whatever its cluster prefix.
#[must_use]
pub fn map_entry_to_sources(meta: &ObjectMeta, gvk: &GroupVersionKind) -> Vec<ObjectKey> {
    let api_version = api_version(gvk);
    if let Some(owner) = meta
        .owner_references
        .iter()
        .flatten()
        .find(|r| r.kind == gvk.kind && r.api_version == api_version)
    {
        return vec![ObjectKey::new(
            meta.namespace.as_deref().unwrap_or_default(),
            &owner.name,
        )];
    }

    annotated_owners(meta)
        .iter()
        .filter_map(|t| OwnerToken::parse(t))
        .filter(|t| t.matches_kind(gvk))
        .map(|t| t.object_key())
        .collect()
}

#[cfg(test)]
#[path = "ownership_tests.rs"]
mod ownership_tests;
