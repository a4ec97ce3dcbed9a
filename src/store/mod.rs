// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object stores used by the reconcilers.
//!
//! The reconciliation engine talks to two clusters that may be the same: the source
//! cluster holding the watched objects and the control plane cluster holding the
//! generated `DNSEntry` objects. Both are accessed through [`ObjectStore`]:
//!
//! - [`kubernetes::KubeStore`] - backed by the Kubernetes API
//! - [`memory::MemoryStore`] - in-memory store with the same semantics for the parts the
//!   engine relies on (generate name, resource version conflicts, finalizer blocked
//!   deletion)
//!
//! [`create_or_patch`] implements the read-modify-write cycle for existing objects and
//! reports whether anything changed.

pub mod kubernetes;
pub mod memory;

use crate::dns_errors::StoreError;
use async_trait::async_trait;
use kube::core::NamespaceResourceScope;
use kube::{Resource, ResourceExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::fmt::Debug;

/// Objects that can be kept in an [`ObjectStore`].
pub trait StoredObject:
    Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + Debug
    + Serialize
    + DeserializeOwned
    + Send
    + Sync
    + 'static
{
}

impl<T> StoredObject for T where
    T: Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + Debug
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static
{
}

/// Namespace and name of an object.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectKey {
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Key of a stored object.
    pub fn of<K: Resource>(obj: &K) -> Self {
        Self::new(obj.namespace().unwrap_or_default(), obj.name_any())
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Outcome of [`create_or_patch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationResult {
    Created,
    Updated,
    Unchanged,
}

/// Access to the objects of one kind in one cluster.
#[async_trait]
pub trait ObjectStore<K: StoredObject>: Send + Sync {
    /// Returns the object, or `None` if it does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError>;

    /// Lists all objects in the namespace.
    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError>;

    /// Creates the object. A name is generated if only `generateName` is set.
    async fn create(&self, obj: &K) -> Result<K, StoreError>;

    /// Replaces the object. Fails with a conflict if the resource version is stale.
    async fn update(&self, obj: &K) -> Result<K, StoreError>;

    /// Deletes the object. Fails with `NotFound` if it does not exist.
    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError>;

    /// Adds the finalizer if missing.
    async fn add_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError>;

    /// Removes the finalizer if present.
    async fn remove_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError>;

    /// Sets a single annotation.
    async fn set_annotation(&self, obj: &K, key: &str, value: &str) -> Result<(), StoreError>;

    /// Merges `status` into the status of the object.
    async fn patch_status(&self, obj: &K, status: serde_json::Value) -> Result<(), StoreError>;
}

/// Applies `mutate` to the stored version of `obj` and writes it back if it changed.
///
/// Creates the mutated `obj` if it does not exist (anymore).
///
/// # Errors
///
/// Returns the store error of the read or the write.
pub async fn create_or_patch<K, S, F>(
    store: &S,
    obj: &K,
    mutate: F,
) -> Result<(K, OperationResult), StoreError>
where
    K: StoredObject,
    S: ObjectStore<K> + ?Sized,
    F: FnOnce(&mut K) + Send,
{
    let Some(current) = store.get(&ObjectKey::of(obj)).await? else {
        let mut created = obj.clone();
        mutate(&mut created);
        let created = store.create(&created).await?;
        return Ok((created, OperationResult::Created));
    };

    let before = serde_json::to_value(&current)?;
    let mut modified = current.clone();
    mutate(&mut modified);
    if serde_json::to_value(&modified)? == before {
        return Ok((current, OperationResult::Unchanged));
    }
    let updated = store.update(&modified).await?;
    Ok((updated, OperationResult::Updated))
}

/// Whether the object carries the finalizer.
pub fn has_finalizer<K: Resource>(obj: &K, finalizer: &str) -> bool {
    obj.finalizers().iter().any(|f| f == finalizer)
}

/// Whether the object is being deleted.
pub fn is_deleting<K: Resource>(obj: &K) -> bool {
    obj.meta().deletion_timestamp.is_some()
}
