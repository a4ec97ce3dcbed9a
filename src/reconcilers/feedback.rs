// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Feedback from generated entries to their source objects.
//!
//! The state of a generated `DNSEntry` is reported as events on the source object
//! owning it. Sources that want it also get the `namespace/name` of the generated
//! entry in the target entry annotation.

use crate::constants::ENTRY_STATE_READY;
use crate::crd::DNSEntry;
use crate::labels::ANNOTATION_TARGET_ENTRY;
use crate::recorder::EventType;
use crate::reconcilers::predicates::WatchEvent;
use crate::reconcilers::source::SourceReconciler;
use crate::source::ownership::map_entry_to_sources;
use crate::store::{is_deleting, ObjectKey, StoredObject};
use kube::ResourceExt;
use tracing::{debug, warn};

/// Reports a change of a generated entry to its owners.
///
/// Entries not relevant for the controller are ignored. Failures are logged.
pub async fn handle_entry_event<T: StoredObject>(
    reconciler: &SourceReconciler<T>,
    event: &WatchEvent<DNSEntry>,
) {
    let owner_data = reconciler.entry_owner_data();
    match event {
        WatchEvent::Create(entry) if owner_data.is_relevant_entry(entry) => {
            entry_created(reconciler, entry).await;
        }
        WatchEvent::Update { old, new } if owner_data.is_relevant_entry(new) => {
            entry_updated(reconciler, old, new).await;
        }
        _ => {}
    }
}

fn entry_state(entry: &DNSEntry) -> &str {
    entry.status.as_ref().map(|s| s.state.as_str()).unwrap_or_default()
}

fn observed_generation(entry: &DNSEntry) -> Option<i64> {
    entry.status.as_ref().and_then(|s| s.observed_generation)
}

/// DNS name reported by the entry controller, or the requested one.
fn effective_dns_name(entry: &DNSEntry) -> &str {
    entry
        .status
        .as_ref()
        .and_then(|s| s.dns_name.as_deref())
        .filter(|n| !n.is_empty())
        .unwrap_or(&entry.spec.dns_name)
}

async fn get_source<T: StoredObject>(
    reconciler: &SourceReconciler<T>,
    key: &ObjectKey,
) -> Option<T> {
    match reconciler.sources().get(key).await {
        Ok(source) => source,
        Err(e) => {
            warn!(
                controller = reconciler.controller_name(),
                object = %key,
                error = %e,
                "Failed to get source object for entry feedback"
            );
            None
        }
    }
}

async fn entry_created<T: StoredObject>(reconciler: &SourceReconciler<T>, entry: &DNSEntry) {
    let keys = map_entry_to_sources(&entry.metadata, reconciler.gvk());
    let [key] = keys.as_slice() else {
        return;
    };
    let Some(source) = get_source(reconciler, key).await else {
        return;
    };
    reconciler
        .recorder()
        .event(
            &source,
            EventType::Normal,
            "DNSEntryCreated",
            &format!("{}: created dns entry object", entry.spec.dns_name),
        )
        .await;
    set_target_entry_annotation(reconciler, &source, entry).await;
}

async fn entry_updated<T: StoredObject>(
    reconciler: &SourceReconciler<T>,
    old: &DNSEntry,
    new: &DNSEntry,
) {
    let state = entry_state(new);
    let reason = format!("DNSEntry{state}");
    let dns_name = effective_dns_name(new);
    let message = new
        .status
        .as_ref()
        .and_then(|s| s.message.as_deref())
        .unwrap_or_default();
    let became_ready = state == ENTRY_STATE_READY
        && !is_deleting(new)
        && (entry_state(old) != ENTRY_STATE_READY
            || observed_generation(old) != observed_generation(new));

    for key in map_entry_to_sources(&new.metadata, reconciler.gvk()) {
        let Some(source) = get_source(reconciler, &key).await else {
            continue;
        };
        let text = format!("{dns_name}: {message}");
        if became_ready {
            reconciler
                .recorder()
                .event(&source, EventType::Normal, &reason, &text)
                .await;
        } else if !state.is_empty() {
            reconciler
                .recorder()
                .dedup_event(&source, EventType::Normal, &reason, &text)
                .await;
        }
        set_target_entry_annotation(reconciler, &source, new).await;
    }
}

async fn set_target_entry_annotation<T: StoredObject>(
    reconciler: &SourceReconciler<T>,
    source: &T,
    entry: &DNSEntry,
) {
    if !reconciler.actuator().should_set_target_entry_annotation() || is_deleting(entry) {
        return;
    }
    let value = ObjectKey::of(entry).to_string();
    if source.annotations().get(ANNOTATION_TARGET_ENTRY) == Some(&value) {
        return;
    }
    debug!(
        controller = reconciler.controller_name(),
        object = %ObjectKey::of(source),
        entry = %value,
        "Setting target entry annotation"
    );
    if let Err(e) = reconciler
        .sources()
        .set_annotation(source, ANNOTATION_TARGET_ENTRY, &value)
        .await
    {
        warn!(
            controller = reconciler.controller_name(),
            object = %ObjectKey::of(source),
            error = %e,
            "Failed to set target entry annotation"
        );
    }
}

#[cfg(test)]
#[path = "feedback_tests.rs"]
mod feedback_tests;
