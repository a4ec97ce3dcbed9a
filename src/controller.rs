// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes runtime wiring of the source controllers.
//!
//! Each source controller watches
//!
//! - its source kind in the source cluster,
//! - `DNSAnnotation` objects in the source cluster, mapped to the referenced source object,
//! - the generated `DNSEntry` objects in the control plane cluster, mapped to their owners
//!   and reported back to them as events.
//!
//! The source and control plane clusters may be the same.

use crate::config::SourceControllerConfig;
use crate::constants::ERROR_REQUEUE_DURATION_SECS;
use crate::crd::{DNSAnnotation, DNSEntry};
use crate::dns_errors::ReconcileError;
use crate::recorder::{DedupRecorder, KubeEventSink};
use crate::reconcilers::dnsannotation::{reconcile_dnsannotation, AnnotationContext};
use crate::reconcilers::feedback::handle_entry_event;
use crate::reconcilers::predicates::{
    annotation_request, entry_event_requests, source_object_passes, EntryChangeTracker,
};
use crate::reconcilers::source::{SourceActuator, SourceReconciler};
use crate::state::AnnotationState;
use crate::store::kubernetes::KubeStore;
use crate::store::{ObjectKey, StoredObject};
use anyhow::{anyhow, Result};
use futures::channel::mpsc::{unbounded, UnboundedSender};
use futures::StreamExt;
use kube::runtime::controller::{self, Action};
use kube::runtime::reflector::ObjectRef;
use kube::runtime::watcher::{self, Config as WatcherConfig};
use kube::runtime::{Controller, WatchStreamExt};
use kube::{Api, Client};
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Clients of the clusters the controllers work with.
#[derive(Clone)]
pub struct Clusters {
    /// Cluster of the source objects
    pub source: Client,
    /// Cluster of the generated entries
    pub control_plane: Client,
}

/// Error policy for all controllers.
///
/// Returns an action to requeue the resource after a delay when reconciliation fails.
#[allow(clippy::needless_pass_by_value)] // Signature required by kube::runtime::Controller
fn error_policy<T, C>(resource: Arc<T>, err: &ReconcileError, _ctx: Arc<C>) -> Action
where
    T: Debug,
{
    error!(
        error = %err,
        resource = ?resource,
        "Reconciliation error - will retry in {}s",
        ERROR_REQUEUE_DURATION_SECS
    );
    Action::requeue(Duration::from_secs(ERROR_REQUEUE_DURATION_SECS))
}

fn object_ref<T: StoredObject>(key: &ObjectKey) -> ObjectRef<T> {
    ObjectRef::new(&key.name).within(&key.namespace)
}

/// Builds a reconciler backed by the Kubernetes API.
pub fn kube_reconciler<T: StoredObject>(
    actuator: Arc<dyn SourceActuator<T>>,
    config: SourceControllerConfig,
    clusters: &Clusters,
    state: Arc<AnnotationState>,
    event_dedup_ttl: Duration,
) -> SourceReconciler<T> {
    let sink = KubeEventSink::new(clusters.source.clone(), actuator.controller_name());
    let recorder = DedupRecorder::new(Arc::new(sink), event_dedup_ttl);
    SourceReconciler::new(
        actuator,
        config,
        Arc::new(KubeStore::<T>::new(clusters.source.clone())),
        Arc::new(KubeStore::<DNSEntry>::new(clusters.control_plane.clone())),
        Arc::new(recorder),
        state,
    )
}

async fn reconcile<T: StoredObject>(
    obj: Arc<T>,
    reconciler: Arc<SourceReconciler<T>>,
) -> Result<Action, ReconcileError> {
    let relevant = reconciler.is_relevant(obj.as_ref());
    if !source_object_passes(obj.as_ref(), reconciler.finalizer_name(), relevant) {
        return Ok(Action::await_change());
    }

    let start = Instant::now();
    let result = reconciler.reconcile(&ObjectKey::of(obj.as_ref())).await;
    let duration = start.elapsed();
    if result.is_ok() {
        crate::metrics::record_reconciliation_success(reconciler.controller_name(), duration);
    } else {
        crate::metrics::record_reconciliation_error(reconciler.controller_name(), duration);
    }
    result.map(|()| Action::await_change())
}

/// Watches the generated entries, reports their changes to the owners and triggers
/// the owners' reconciliation.
async fn watch_entries<T: StoredObject>(
    api: Api<DNSEntry>,
    reconciler: Arc<SourceReconciler<T>>,
    trigger: UnboundedSender<ObjectRef<T>>,
) {
    let owner_data = reconciler.entry_owner_data();
    let mut tracker = EntryChangeTracker::default();
    let mut stream = watcher::watcher(api, WatcherConfig::default())
        .default_backoff()
        .boxed();

    while let Some(event) = stream.next().await {
        let event = match event {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    controller = reconciler.controller_name(),
                    error = %e,
                    "DNSEntry watch failed"
                );
                continue;
            }
        };
        for change in tracker.observe(event) {
            handle_entry_event(&reconciler, &change).await;
            for key in entry_event_requests(&change, &owner_data) {
                if trigger.unbounded_send(object_ref(&key)).is_err() {
                    return;
                }
            }
        }
    }
}

/// Runs a source controller until its watch streams end.
///
/// # Errors
///
/// Returns an error if the watch of the generated entries ends.
pub async fn run_source_controller<T: StoredObject>(
    clusters: Clusters,
    reconciler: Arc<SourceReconciler<T>>,
) -> Result<()> {
    info!("Starting {} controller", reconciler.controller_name());

    let api = Api::<T>::all(clusters.source.clone());
    let annotations = Api::<DNSAnnotation>::all(clusters.source.clone());
    let entries = match reconciler.config().target_namespace() {
        Some(namespace) => Api::<DNSEntry>::namespaced(clusters.control_plane.clone(), namespace),
        None => Api::<DNSEntry>::all(clusters.control_plane.clone()),
    };

    let (trigger_tx, trigger_rx) = unbounded();
    let entry_watch = tokio::spawn(watch_entries(entries, reconciler.clone(), trigger_tx));

    let name = reconciler.controller_name();
    let gvk = reconciler.gvk().clone();
    let config = controller::Config::default().concurrency(reconciler.config().concurrent_syncs());
    let controller = Controller::new(api, WatcherConfig::default())
        .with_config(config)
        .watches(annotations, WatcherConfig::default(), move |annotation| {
            annotation_request(&annotation, &gvk).map(|key| object_ref::<T>(&key))
        })
        .reconcile_on(trigger_rx)
        .run(reconcile::<T>, error_policy, reconciler)
        .for_each(|_| futures::future::ready(()));

    supervise_entry_watch(name, controller, entry_watch).await
}

/// Drives the controller until it ends or the entry watch task stops.
///
/// The owners miss all entry changes once the entry watch is gone, so that ends the
/// controller with an error.
pub(crate) async fn supervise_entry_watch(
    name: &str,
    controller: impl Future<Output = ()>,
    entry_watch: JoinHandle<()>,
) -> Result<()> {
    tokio::select! {
        () = controller => Ok(()),
        result = entry_watch => {
            if let Err(e) = &result {
                error!(controller = name, error = %e, "DNSEntry watch task failed");
            } else {
                error!(controller = name, "DNSEntry watch ended");
            }
            Err(anyhow!("{name}: DNSEntry watch ended"))
        }
    }
}

/// Runs the `DNSAnnotation` controller feeding the annotation state.
///
/// # Errors
///
/// Returns an error if the controller cannot be started.
pub async fn run_dnsannotation_controller(
    client: Client,
    state: Arc<AnnotationState>,
) -> Result<()> {
    info!("Starting DNSAnnotation controller");

    let api = Api::<DNSAnnotation>::all(client.clone());
    let ctx = Arc::new(AnnotationContext { client, state });
    Controller::new(api, WatcherConfig::default())
        .run(reconcile_dnsannotation, error_policy, ctx)
        .for_each(|_| futures::future::ready(()))
        .await;

    Ok(())
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod controller_tests;
