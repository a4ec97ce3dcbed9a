// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Finalizer management for namespaced Kubernetes resources.
//!
//! Source controllers keep a class and controller scoped finalizer on every source
//! object that owns generated entries, so the entries are removed before the source
//! object disappears.
//!
//! # Example
//!
//! ```rust,no_run
//! use dnsman::reconcilers::finalizers::{ensure_finalizer, remove_finalizer};
//! use k8s_openapi::api::core::v1::Service;
//! use kube::Client;
//!
//! # async fn example(client: Client, svc: Service) -> Result<(), dnsman::dns_errors::StoreError> {
//! const FINALIZER: &str = "gardendns.dns.gardener.cloud/service-dns";
//! ensure_finalizer(&client, &svc, FINALIZER).await?;
//! remove_finalizer(&client, &svc, FINALIZER).await?;
//! # Ok(())
//! # }
//! ```

use crate::dns_errors::StoreError;
use crate::store::{has_finalizer, StoredObject};
use kube::api::{Patch, PatchParams};
use kube::{Api, Client, ResourceExt};
use serde_json::json;
use tracing::info;

/// Add a finalizer to a resource if not already present.
///
/// The operation is idempotent - calling it multiple times has no effect if the
/// finalizer is already present.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn ensure_finalizer<T: StoredObject>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), StoreError> {
    if has_finalizer(resource, finalizer) {
        return Ok(());
    }
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    info!(
        "Adding finalizer {} to {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let mut finalizers = resource.finalizers().to_vec();
    finalizers.push(finalizer.to_string());
    patch_finalizers::<T>(client, &namespace, &name, &finalizers).await
}

/// Remove a finalizer from a resource.
///
/// The operation is idempotent - calling it multiple times has no effect if the
/// finalizer is already absent.
///
/// # Errors
///
/// Returns an error if the API patch operation fails.
pub async fn remove_finalizer<T: StoredObject>(
    client: &Client,
    resource: &T,
    finalizer: &str,
) -> Result<(), StoreError> {
    if !has_finalizer(resource, finalizer) {
        return Ok(());
    }
    let namespace = resource.namespace().unwrap_or_default();
    let name = resource.name_any();

    info!(
        "Removing finalizer {} from {}/{} {}",
        finalizer,
        namespace,
        name,
        T::kind(&())
    );

    let finalizers = remaining_finalizers(resource.finalizers(), finalizer);
    patch_finalizers::<T>(client, &namespace, &name, &finalizers).await
}

/// Finalizers left after removing `finalizer`.
pub(crate) fn remaining_finalizers(finalizers: &[String], finalizer: &str) -> Vec<String> {
    finalizers
        .iter()
        .filter(|f| *f != finalizer)
        .cloned()
        .collect()
}

async fn patch_finalizers<T: StoredObject>(
    client: &Client,
    namespace: &str,
    name: &str,
    finalizers: &[String],
) -> Result<(), StoreError> {
    let api: Api<T> = Api::namespaced(client.clone(), namespace);
    let patch = json!({ "metadata": { "finalizers": finalizers } });
    api.patch(name, &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

#[cfg(test)]
#[path = "finalizers_tests.rs"]
mod finalizers_tests;
