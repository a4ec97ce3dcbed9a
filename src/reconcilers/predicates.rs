// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Event routing for source controllers.
//!
//! Decides which watch events trigger a reconciliation of which source object:
//!
//! - **Source objects** trigger on create and delete if relevant, and on update if the
//!   old or the new version is relevant, so that transitions in and out of relevance
//!   are seen.
//! - **Generated entries** never trigger on create (the source controller created
//!   them). Updates and deletions of relevant entries trigger their owners.
//! - **`DNSAnnotation` objects** trigger the referenced source object if it has the
//!   controller's kind.
//!
//! [`EntryChangeTracker`] derives create/update/delete changes from the entry watch
//! stream, which only reports applied and deleted objects.

use crate::crd::{DNSAnnotation, DNSEntry};
use crate::source::ownership::{api_version, map_entry_to_sources};
use crate::source::EntryOwnerData;
use crate::store::{has_finalizer, is_deleting, ObjectKey};
use kube::core::GroupVersionKind;
use kube::runtime::watcher;
use kube::Resource;
use std::collections::HashMap;

/// A watch event with the previous version on updates.
#[derive(Clone, Debug, PartialEq)]
pub enum WatchEvent<K> {
    Create(K),
    Update { old: K, new: K },
    Delete(K),
}

/// Whether a source object event triggers its reconciliation.
pub fn source_event_triggers<K>(
    event: &WatchEvent<K>,
    is_relevant: impl Fn(&K) -> bool,
) -> bool {
    match event {
        WatchEvent::Create(obj) | WatchEvent::Delete(obj) => is_relevant(obj),
        WatchEvent::Update { old, new } => is_relevant(old) || is_relevant(new),
    }
}

/// Whether the current version of a source object needs a reconciliation.
///
/// The watch stream of the controller only has the current version. An object that
/// was relevant before owns entries and therefore carries the finalizer, so the
/// finalizer stands in for the relevance of the previous version.
pub fn source_object_passes<K: Resource>(obj: &K, finalizer: &str, is_relevant: bool) -> bool {
    if is_deleting(obj) {
        return true;
    }
    let event = if has_finalizer(obj, finalizer) {
        WatchEvent::Update {
            old: true,
            new: is_relevant,
        }
    } else {
        WatchEvent::Create(is_relevant)
    };
    source_event_triggers(&event, |relevant| *relevant)
}

/// Whether a generated entry event triggers the reconciliation of its owners.
pub fn entry_event_triggers(event: &WatchEvent<DNSEntry>, owner_data: &EntryOwnerData) -> bool {
    match event {
        WatchEvent::Create(_) => false,
        WatchEvent::Update { old, .. } => owner_data.is_relevant_entry(old),
        WatchEvent::Delete(entry) => owner_data.is_relevant_entry(entry),
    }
}

/// The entry affected by an event (the new version on updates).
pub fn affected<K>(event: &WatchEvent<K>) -> &K {
    match event {
        WatchEvent::Create(obj) | WatchEvent::Delete(obj) => obj,
        WatchEvent::Update { new, .. } => new,
    }
}

/// Source objects to reconcile for a generated entry event.
pub fn entry_event_requests(
    event: &WatchEvent<DNSEntry>,
    owner_data: &EntryOwnerData,
) -> Vec<ObjectKey> {
    if !entry_event_triggers(event, owner_data) {
        return Vec::new();
    }
    map_entry_to_sources(&affected(event).metadata, &owner_data.gvk)
}

/// Source object referenced by a `DNSAnnotation`, if it has the given kind.
pub fn annotation_request(annotation: &DNSAnnotation, gvk: &GroupVersionKind) -> Option<ObjectKey> {
    let resource_ref = &annotation.spec.resource_ref;
    if resource_ref.kind != gvk.kind || resource_ref.api_version != api_version(gvk) {
        return None;
    }
    Some(ObjectKey::new(&resource_ref.namespace, &resource_ref.name))
}

/// Turns the entry watch stream into create/update/delete events.
///
/// The objects listed by the first (re)list are known without producing events.
/// Objects found in later relists are compared with the known versions.
#[derive(Debug, Default)]
pub struct EntryChangeTracker {
    known: HashMap<ObjectKey, DNSEntry>,
    relist: Option<HashMap<ObjectKey, DNSEntry>>,
    synced: bool,
}

impl EntryChangeTracker {
    /// Consumes a watcher event and returns the resulting changes.
    pub fn observe(&mut self, event: watcher::Event<DNSEntry>) -> Vec<WatchEvent<DNSEntry>> {
        match event {
            watcher::Event::Apply(entry) => self.apply(entry).into_iter().collect(),
            watcher::Event::Delete(entry) => {
                self.known.remove(&ObjectKey::of(&entry));
                vec![WatchEvent::Delete(entry)]
            }
            watcher::Event::Init => {
                self.relist = Some(HashMap::new());
                Vec::new()
            }
            watcher::Event::InitApply(entry) => {
                self.relist
                    .get_or_insert_with(HashMap::new)
                    .insert(ObjectKey::of(&entry), entry);
                Vec::new()
            }
            watcher::Event::InitDone => self.finish_relist(),
        }
    }

    fn apply(&mut self, entry: DNSEntry) -> Option<WatchEvent<DNSEntry>> {
        match self.known.insert(ObjectKey::of(&entry), entry.clone()) {
            None => Some(WatchEvent::Create(entry)),
            Some(old) if old.metadata.resource_version != entry.metadata.resource_version => {
                Some(WatchEvent::Update { old, new: entry })
            }
            Some(_) => None,
        }
    }

    fn finish_relist(&mut self) -> Vec<WatchEvent<DNSEntry>> {
        let listed = self.relist.take().unwrap_or_default();
        if !self.synced {
            self.synced = true;
            self.known = listed;
            return Vec::new();
        }

        let mut events: Vec<WatchEvent<DNSEntry>> = self
            .known
            .iter()
            .filter(|(key, _)| !listed.contains_key(*key))
            .map(|(_, old)| WatchEvent::Delete(old.clone()))
            .collect();
        self.known.retain(|key, _| listed.contains_key(key));
        events.extend(listed.into_values().filter_map(|entry| self.apply(entry)));
        events
    }

    /// Number of known entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.known.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.known.is_empty()
    }
}

#[cfg(test)]
#[path = "predicates_tests.rs"]
mod predicates_tests;
