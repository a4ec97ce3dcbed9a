// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! In-memory object store.
//!
//! Follows the API server behavior the reconcilers depend on:
//!
//! - `generateName` is completed with a unique suffix on create
//! - every write bumps the resource version, an update with a stale version conflicts
//! - deleting an object with finalizers only sets the deletion timestamp, the object
//!   is removed when its last finalizer is removed

use super::{ObjectKey, ObjectStore, StoredObject};
use crate::dns_errors::StoreError;
use async_trait::async_trait;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::Time;
use k8s_openapi::jiff::Timestamp;
use kube::Resource;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

/// In-memory store of one object kind.
#[derive(Debug)]
pub struct MemoryStore<K> {
    objects: Mutex<BTreeMap<ObjectKey, K>>,
    sequence: AtomicU64,
}

impl<K> Default for MemoryStore<K> {
    fn default() -> Self {
        Self {
            objects: Mutex::new(BTreeMap::new()),
            sequence: AtomicU64::new(0),
        }
    }
}

impl<K: StoredObject> MemoryStore<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<ObjectKey, K>>, StoreError> {
        self.objects.lock().map_err(|_| StoreError::Invalid {
            kind: K::kind(&()).to_string(),
            reason: "store lock poisoned".to_string(),
        })
    }

    fn not_found(key: &ObjectKey) -> StoreError {
        StoreError::NotFound {
            kind: K::kind(&()).to_string(),
            key: key.to_string(),
        }
    }

    /// Stores the object as is, replacing an existing one.
    ///
    /// Missing UID and resource version are filled in.
    ///
    /// # Errors
    ///
    /// Fails only if the store lock is poisoned.
    pub fn insert(&self, mut obj: K) -> Result<K, StoreError> {
        let seq = self.next();
        let meta = obj.meta_mut();
        meta.uid.get_or_insert_with(|| format!("uid-{seq}"));
        meta.resource_version = Some(seq.to_string());
        self.lock()?.insert(ObjectKey::of(&obj), obj.clone());
        Ok(obj)
    }

    /// Snapshot of all stored objects, ordered by key.
    ///
    /// # Errors
    ///
    /// Fails only if the store lock is poisoned.
    pub fn objects(&self) -> Result<Vec<K>, StoreError> {
        Ok(self.lock()?.values().cloned().collect())
    }

    /// Applies `change` to the stored object and bumps its resource version.
    ///
    /// A deleting object without finalizers is removed afterwards.
    fn modify(&self, key: &ObjectKey, change: impl FnOnce(&mut K)) -> Result<(), StoreError> {
        let seq = self.next();
        let mut objects = self.lock()?;
        let obj = objects.get_mut(key).ok_or_else(|| Self::not_found(key))?;
        change(obj);
        obj.meta_mut().resource_version = Some(seq.to_string());
        if is_released(obj) {
            objects.remove(key);
        }
        Ok(())
    }
}

fn is_released<K: Resource>(obj: &K) -> bool {
    let meta = obj.meta();
    meta.deletion_timestamp.is_some() && meta.finalizers.as_ref().is_none_or(Vec::is_empty)
}

/// JSON merge patch (RFC 7386).
fn merge_json(target: &mut Value, patch: Value) {
    match patch {
        Value::Object(fields) => {
            if !target.is_object() {
                *target = Value::Object(serde_json::Map::new());
            }
            if let Value::Object(target_fields) = target {
                for (key, value) in fields {
                    if value.is_null() {
                        target_fields.remove(&key);
                    } else {
                        merge_json(target_fields.entry(key).or_insert(Value::Null), value);
                    }
                }
            }
        }
        other => *target = other,
    }
}

#[async_trait]
impl<K: StoredObject> ObjectStore<K> for MemoryStore<K> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|(key, _)| key.namespace == namespace)
            .map(|(_, obj)| obj.clone())
            .collect())
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let seq = self.next();
        let mut created = obj.clone();
        let meta = created.meta_mut();
        if meta.name.as_deref().is_none_or(str::is_empty) {
            let Some(prefix) = meta.generate_name.as_deref().filter(|p| !p.is_empty()) else {
                return Err(StoreError::Invalid {
                    kind: K::kind(&()).to_string(),
                    reason: "name or generateName is required".to_string(),
                });
            };
            meta.name = Some(format!("{prefix}{seq:05x}"));
        }
        meta.uid = Some(format!("uid-{seq}"));
        meta.resource_version = Some(seq.to_string());
        meta.deletion_timestamp = None;

        let key = ObjectKey::of(&created);
        let mut objects = self.lock()?;
        if objects.contains_key(&key) {
            return Err(StoreError::AlreadyExists {
                kind: K::kind(&()).to_string(),
                key: key.to_string(),
            });
        }
        objects.insert(key, created.clone());
        Ok(created)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        let seq = self.next();
        let mut objects = self.lock()?;
        let current = objects.get(&key).ok_or_else(|| Self::not_found(&key))?;
        if obj.meta().resource_version.is_some()
            && obj.meta().resource_version != current.meta().resource_version
        {
            return Err(StoreError::Conflict {
                kind: K::kind(&()).to_string(),
                key: key.to_string(),
            });
        }

        let mut updated = obj.clone();
        let meta = updated.meta_mut();
        meta.uid.clone_from(&current.meta().uid);
        meta.deletion_timestamp.clone_from(&current.meta().deletion_timestamp);
        meta.resource_version = Some(seq.to_string());
        if is_released(&updated) {
            objects.remove(&key);
        } else {
            objects.insert(key, updated.clone());
        }
        Ok(updated)
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        let mut objects = self.lock()?;
        let obj = objects.get_mut(key).ok_or_else(|| Self::not_found(key))?;
        if obj.meta().finalizers.as_ref().is_none_or(Vec::is_empty) {
            objects.remove(key);
        } else if obj.meta().deletion_timestamp.is_none() {
            obj.meta_mut().deletion_timestamp = Some(Time(Timestamp::now()));
        }
        Ok(())
    }

    async fn add_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        self.modify(&ObjectKey::of(obj), |stored| {
            let finalizers = stored.meta_mut().finalizers.get_or_insert_with(Vec::new);
            if !finalizers.iter().any(|f| f == finalizer) {
                finalizers.push(finalizer.to_string());
            }
        })
    }

    async fn remove_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        self.modify(&ObjectKey::of(obj), |stored| {
            if let Some(finalizers) = stored.meta_mut().finalizers.as_mut() {
                finalizers.retain(|f| f != finalizer);
            }
        })
    }

    async fn set_annotation(&self, obj: &K, key: &str, value: &str) -> Result<(), StoreError> {
        self.modify(&ObjectKey::of(obj), |stored| {
            stored
                .meta_mut()
                .annotations
                .get_or_insert_with(BTreeMap::new)
                .insert(key.to_string(), value.to_string());
        })
    }

    async fn patch_status(&self, obj: &K, status: Value) -> Result<(), StoreError> {
        let key = ObjectKey::of(obj);
        let current = self.get(&key).await?.ok_or_else(|| Self::not_found(&key))?;
        let mut value = serde_json::to_value(&current)?;
        merge_json(&mut value, serde_json::json!({ "status": status }));
        let patched: K = serde_json::from_value(value)?;
        self.modify(&key, move |stored| *stored = patched)
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod memory_tests;
