// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Object store backed by the Kubernetes API.

use super::{ObjectKey, ObjectStore, StoredObject};
use crate::dns_errors::StoreError;
use crate::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
use async_trait::async_trait;
use kube::api::{DeleteParams, ListParams, Patch, PatchParams, PostParams};
use kube::{Api, Client, ResourceExt};
use serde_json::{json, Value};
use std::marker::PhantomData;
use tracing::debug;

/// Store of one namespaced kind in the cluster of `client`.
pub struct KubeStore<K> {
    client: Client,
    _kind: PhantomData<fn() -> K>,
}

impl<K: StoredObject> KubeStore<K> {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self {
            client,
            _kind: PhantomData,
        }
    }

    fn api(&self, namespace: &str) -> Api<K> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

/// Maps API status codes to the store error variants the reconcilers act on.
fn map_error(err: kube::Error, key: &ObjectKey, kind: &str) -> StoreError {
    match &err {
        kube::Error::Api(api_err) if api_err.code == 404 => StoreError::NotFound {
            kind: kind.to_string(),
            key: key.to_string(),
        },
        kube::Error::Api(api_err) if api_err.code == 409 && api_err.reason == "AlreadyExists" => {
            StoreError::AlreadyExists {
                kind: kind.to_string(),
                key: key.to_string(),
            }
        }
        kube::Error::Api(api_err) if api_err.code == 409 => StoreError::Conflict {
            kind: kind.to_string(),
            key: key.to_string(),
        },
        _ => StoreError::Kube(err),
    }
}

#[async_trait]
impl<K: StoredObject> ObjectStore<K> for KubeStore<K> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        self.api(&key.namespace)
            .get_opt(&key.name)
            .await
            .map_err(|e| map_error(e, key, &K::kind(&())))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        let list = self.api(namespace).list(&ListParams::default()).await?;
        Ok(list.items)
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        let created = self
            .api(&key.namespace)
            .create(&PostParams::default(), obj)
            .await
            .map_err(|e| map_error(e, &key, &K::kind(&())))?;
        debug!(
            namespace = %key.namespace,
            name = %created.name_any(),
            "Created {}",
            K::kind(&())
        );
        Ok(created)
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        let key = ObjectKey::of(obj);
        self.api(&key.namespace)
            .replace(&key.name, &PostParams::default(), obj)
            .await
            .map_err(|e| map_error(e, &key, &K::kind(&())))
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.api(&key.namespace)
            .delete(&key.name, &DeleteParams::default())
            .await
            .map_err(|e| map_error(e, key, &K::kind(&())))?;
        Ok(())
    }

    async fn add_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        ensure_finalizer(&self.client, obj, finalizer).await
    }

    async fn remove_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        remove_finalizer(&self.client, obj, finalizer).await
    }

    async fn set_annotation(&self, obj: &K, key: &str, value: &str) -> Result<(), StoreError> {
        let object_key = ObjectKey::of(obj);
        let patch = json!({ "metadata": { "annotations": { key: value } } });
        self.api(&object_key.namespace)
            .patch(&object_key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_error(e, &object_key, &K::kind(&())))?;
        Ok(())
    }

    async fn patch_status(&self, obj: &K, status: Value) -> Result<(), StoreError> {
        let key = ObjectKey::of(obj);
        let patch = json!({ "status": status });
        self.api(&key.namespace)
            .patch_status(&key.name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
            .map_err(|e| map_error(e, &key, &K::kind(&())))?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "kubernetes_tests.rs"]
mod kubernetes_tests;
