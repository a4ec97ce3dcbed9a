// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Fixtures shared by the reconciler tests.

use async_trait::async_trait;
use crate::config::SourceControllerConfig;
use crate::crd::DNSEntry;
use crate::dns_errors::StoreError;
use crate::recorder::{DedupRecorder, MemoryEventSink};
use crate::reconcilers::source::{SourceActuator, SourceReconciler};
use crate::state::AnnotationState;
use crate::store::memory::MemoryStore;
use crate::store::{ObjectKey, ObjectStore, StoredObject};
use k8s_openapi::api::core::v1::{
    LoadBalancerIngress, LoadBalancerStatus, Service, ServiceSpec, ServiceStatus,
};
use k8s_openapi::api::networking::v1::{
    Ingress, IngressLoadBalancerIngress, IngressLoadBalancerStatus, IngressRule, IngressSpec,
    IngressStatus,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::Status;
use kube::Resource;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const NAMESPACE: &str = "default";

pub fn annotations(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

/// Store operations a [`FaultyStore`] can fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum StoreOp {
    Get,
    List,
    Create,
    Update,
    Delete,
    AddFinalizer,
    RemoveFinalizer,
    SetAnnotation,
    PatchStatus,
}

/// Error returned by a failing [`FaultyStore`] operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Fault {
    /// `StoreError::NotFound`
    NotFound,
    /// HTTP 500 from the API server
    ServerError,
}

/// [`MemoryStore`] wrapper that fails selected operations and records every call.
pub struct FaultyStore<K> {
    inner: Arc<MemoryStore<K>>,
    faults: Mutex<BTreeMap<StoreOp, Fault>>,
    calls: Mutex<Vec<StoreOp>>,
}

impl<K: StoredObject> FaultyStore<K> {
    pub fn new(inner: Arc<MemoryStore<K>>) -> Self {
        Self {
            inner,
            faults: Mutex::default(),
            calls: Mutex::default(),
        }
    }

    /// Fails every following `op` with `fault`.
    pub fn fail(&self, op: StoreOp, fault: Fault) {
        self.faults.lock().unwrap().insert(op, fault);
    }

    /// Lets `op` succeed again.
    pub fn heal(&self, op: StoreOp) {
        self.faults.lock().unwrap().remove(&op);
    }

    /// Operations called so far, in order.
    pub fn calls(&self) -> Vec<StoreOp> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn check(&self, op: StoreOp, key: &str) -> Result<(), StoreError> {
        self.calls.lock().unwrap().push(op);
        match self.faults.lock().unwrap().get(&op) {
            None => Ok(()),
            Some(Fault::NotFound) => Err(StoreError::NotFound {
                kind: K::kind(&()).to_string(),
                key: key.to_string(),
            }),
            Some(Fault::ServerError) => Err(StoreError::Kube(kube::Error::Api(
                Status::failure("internal error", "InternalError")
                    .with_code(500)
                    .boxed(),
            ))),
        }
    }
}

#[async_trait]
impl<K: StoredObject> ObjectStore<K> for FaultyStore<K> {
    async fn get(&self, key: &ObjectKey) -> Result<Option<K>, StoreError> {
        self.check(StoreOp::Get, &key.to_string())?;
        self.inner.get(key).await
    }

    async fn list(&self, namespace: &str) -> Result<Vec<K>, StoreError> {
        self.check(StoreOp::List, namespace)?;
        self.inner.list(namespace).await
    }

    async fn create(&self, obj: &K) -> Result<K, StoreError> {
        self.check(StoreOp::Create, &ObjectKey::of(obj).to_string())?;
        self.inner.create(obj).await
    }

    async fn update(&self, obj: &K) -> Result<K, StoreError> {
        self.check(StoreOp::Update, &ObjectKey::of(obj).to_string())?;
        self.inner.update(obj).await
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.check(StoreOp::Delete, &key.to_string())?;
        self.inner.delete(key).await
    }

    async fn add_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        self.check(StoreOp::AddFinalizer, &ObjectKey::of(obj).to_string())?;
        self.inner.add_finalizer(obj, finalizer).await
    }

    async fn remove_finalizer(&self, obj: &K, finalizer: &str) -> Result<(), StoreError> {
        self.check(StoreOp::RemoveFinalizer, &ObjectKey::of(obj).to_string())?;
        self.inner.remove_finalizer(obj, finalizer).await
    }

    async fn set_annotation(&self, obj: &K, key: &str, value: &str) -> Result<(), StoreError> {
        self.check(StoreOp::SetAnnotation, &ObjectKey::of(obj).to_string())?;
        self.inner.set_annotation(obj, key, value).await
    }

    async fn patch_status(&self, obj: &K, status: serde_json::Value) -> Result<(), StoreError> {
        self.check(StoreOp::PatchStatus, &ObjectKey::of(obj).to_string())?;
        self.inner.patch_status(obj, status).await
    }
}

/// A reconciler working on in-memory stores.
///
/// The reconciler reaches the stores through [`FaultyStore`]s, the test reaches them
/// directly.
pub struct Harness<T: StoredObject> {
    pub sources: Arc<MemoryStore<T>>,
    pub entries: Arc<MemoryStore<DNSEntry>>,
    pub source_faults: Arc<FaultyStore<T>>,
    pub entry_faults: Arc<FaultyStore<DNSEntry>>,
    pub events: Arc<MemoryEventSink>,
    pub state: Arc<AnnotationState>,
    pub reconciler: SourceReconciler<T>,
}

impl<T: StoredObject> Harness<T> {
    pub fn new(actuator: Arc<dyn SourceActuator<T>>, config: SourceControllerConfig) -> Self {
        Self::with_stores(
            actuator,
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    fn with_stores(
        actuator: Arc<dyn SourceActuator<T>>,
        config: SourceControllerConfig,
        sources: Arc<MemoryStore<T>>,
        entries: Arc<MemoryStore<DNSEntry>>,
    ) -> Self {
        let source_faults = Arc::new(FaultyStore::new(sources.clone()));
        let entry_faults = Arc::new(FaultyStore::new(entries.clone()));
        let events = Arc::new(MemoryEventSink::default());
        let state = Arc::new(AnnotationState::default());
        let recorder = DedupRecorder::new(events.clone(), Duration::from_secs(300));
        let reconciler = SourceReconciler::new(
            actuator,
            config,
            source_faults.clone(),
            entry_faults.clone(),
            Arc::new(recorder),
            state.clone(),
        );
        Self {
            sources,
            entries,
            source_faults,
            entry_faults,
            events,
            state,
            reconciler,
        }
    }

    pub fn entries(&self) -> Vec<DNSEntry> {
        self.entries.objects().unwrap()
    }

    pub async fn source(&self, name: &str) -> Option<T> {
        self.sources
            .get(&ObjectKey::new(NAMESPACE, name))
            .await
            .unwrap()
    }

    pub async fn reconcile(&self, name: &str) -> Result<(), crate::dns_errors::ReconcileError> {
        self.reconciler
            .reconcile(&ObjectKey::new(NAMESPACE, name))
            .await
    }

    /// Replaces the annotations of a stored source object.
    pub async fn set_source_annotations(&self, name: &str, pairs: &[(&str, &str)]) {
        let mut obj = self.source(name).await.unwrap();
        obj.meta_mut().annotations = Some(annotations(pairs));
        self.sources.update(&obj).await.unwrap();
    }
}

impl Harness<DNSEntry> {
    /// A reconciler reading its source entries from the store it writes to.
    pub fn shared(
        actuator: Arc<dyn SourceActuator<DNSEntry>>,
        config: SourceControllerConfig,
    ) -> Self {
        let store = Arc::new(MemoryStore::new());
        Self::with_stores(actuator, config, store.clone(), store)
    }
}

/// A `LoadBalancer` service in the test namespace with one load balancer IP.
pub fn load_balancer_service(name: &str, pairs: &[(&str, &str)], ip: &str) -> Service {
    Service {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(annotations(pairs)),
            ..Default::default()
        },
        spec: Some(ServiceSpec {
            type_: Some("LoadBalancer".to_string()),
            ..Default::default()
        }),
        status: Some(ServiceStatus {
            load_balancer: Some(LoadBalancerStatus {
                ingress: Some(vec![LoadBalancerIngress {
                    ip: Some(ip.to_string()),
                    ..Default::default()
                }]),
            }),
            ..Default::default()
        }),
    }
}

/// An ingress in the test namespace with one rule per host and one load balancer IP.
pub fn ingress(name: &str, pairs: &[(&str, &str)], hosts: &[&str], ip: &str) -> Ingress {
    Ingress {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some(NAMESPACE.to_string()),
            annotations: Some(annotations(pairs)),
            ..Default::default()
        },
        spec: Some(IngressSpec {
            rules: Some(
                hosts
                    .iter()
                    .map(|host| IngressRule {
                        host: Some((*host).to_string()),
                        ..Default::default()
                    })
                    .collect(),
            ),
            ..Default::default()
        }),
        status: Some(IngressStatus {
            load_balancer: Some(IngressLoadBalancerStatus {
                ingress: Some(vec![IngressLoadBalancerIngress {
                    ip: Some(ip.to_string()),
                    ..Default::default()
                }]),
            }),
        }),
    }
}
