// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Kubernetes Events on source objects.
//!
//! Source controllers report what they did with the generated entries, and why they
//! could not, as Events on the source object. [`DedupRecorder`] publishes through an
//! [`EventSink`] and suppresses repetitions of the same message for the same object
//! within a time window, so a failing object retried with backoff does not flood the
//! event stream.
//!
//! # Example
//!
//! ```rust
//! use dnsman::recorder::{DedupRecorder, EventType, MemoryEventSink};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let sink = Arc::new(MemoryEventSink::default());
//! let recorder = DedupRecorder::new(sink.clone(), Duration::from_secs(300));
//! # let _ = (recorder, EventType::Normal);
//! ```

use async_trait::async_trait;
use k8s_openapi::api::core::v1::{Event, ObjectReference};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::{ObjectMeta, Time};
use k8s_openapi::jiff::Timestamp;
use kube::api::PostParams;
use kube::{Api, Client, Resource};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Event severity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EventType {
    Normal,
    Warning,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            EventType::Normal => "Normal",
            EventType::Warning => "Warning",
        }
    }
}

/// Destination of recorded events.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Publishes one event. Failures are logged, never returned.
    async fn publish(
        &self,
        object: &ObjectReference,
        event_type: EventType,
        reason: &str,
        message: &str,
    );
}

/// Creates `core/v1` Events in the cluster of the source objects.
pub struct KubeEventSink {
    client: Client,
    reporting_controller: String,
}

impl KubeEventSink {
    pub fn new(client: Client, reporting_controller: impl Into<String>) -> Self {
        Self {
            client,
            reporting_controller: reporting_controller.into(),
        }
    }
}

#[async_trait]
impl EventSink for KubeEventSink {
    async fn publish(
        &self,
        object: &ObjectReference,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let namespace = object.namespace.clone().unwrap_or_default();
        let name = object.name.clone().unwrap_or_default();
        let event_api: Api<Event> = Api::namespaced(self.client.clone(), &namespace);

        let now = Time(Timestamp::now());
        let event = Event {
            metadata: ObjectMeta {
                generate_name: Some(format!("{name}-")),
                namespace: Some(namespace),
                ..Default::default()
            },
            involved_object: object.clone(),
            reason: Some(reason.to_string()),
            message: Some(message.to_string()),
            type_: Some(event_type.as_str().to_string()),
            first_timestamp: Some(now.clone()),
            last_timestamp: Some(now),
            count: Some(1),
            reporting_component: Some(self.reporting_controller.clone()),
            ..Default::default()
        };

        if let Err(e) = event_api.create(&PostParams::default(), &event).await {
            warn!("Failed to create event for {}: {}", name, e);
        }
    }
}

/// An event captured by [`MemoryEventSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedEvent {
    /// `namespace/name` of the involved object
    pub object: String,
    pub event_type: EventType,
    pub reason: String,
    pub message: String,
}

/// Keeps published events in memory.
#[derive(Debug, Default)]
pub struct MemoryEventSink {
    events: Mutex<Vec<RecordedEvent>>,
}

impl MemoryEventSink {
    /// Events published so far, oldest first.
    pub fn events(&self) -> Vec<RecordedEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Reasons of the events published so far, oldest first.
    pub fn reasons(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.reason).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

#[async_trait]
impl EventSink for MemoryEventSink {
    async fn publish(
        &self,
        object: &ObjectReference,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let event = RecordedEvent {
            object: format!(
                "{}/{}",
                object.namespace.as_deref().unwrap_or_default(),
                object.name.as_deref().unwrap_or_default()
            ),
            event_type,
            reason: reason.to_string(),
            message: message.to_string(),
        };
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

/// Event recorder with optional suppression of repeated messages.
pub struct DedupRecorder {
    sink: Arc<dyn EventSink>,
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DedupRecorder {
    /// Suppresses repetitions of a message to the same object for `ttl`.
    pub fn new(sink: Arc<dyn EventSink>, ttl: Duration) -> Self {
        Self {
            sink,
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Records an event.
    pub async fn event<K: Resource<DynamicType = ()>>(
        &self,
        obj: &K,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        crate::metrics::record_event(event_type.as_str(), reason);
        self.sink
            .publish(&obj.object_ref(&()), event_type, reason, message)
            .await;
    }

    /// Records an event unless the same message was recorded for the object within
    /// the suppression window.
    pub async fn dedup_event<K: Resource<DynamicType = ()>>(
        &self,
        obj: &K,
        event_type: EventType,
        reason: &str,
        message: &str,
    ) {
        let object = obj.object_ref(&());
        let key = format!(
            "{}/{}/{}/{}/{}",
            object.kind.as_deref().unwrap_or_default(),
            object.namespace.as_deref().unwrap_or_default(),
            object.name.as_deref().unwrap_or_default(),
            event_type.as_str(),
            message
        );
        if !self.first_within_window(key) {
            debug!(reason, message, "Suppressing duplicate event");
            return;
        }
        crate::metrics::record_event(event_type.as_str(), reason);
        self.sink.publish(&object, event_type, reason, message).await;
    }

    /// Marks the key as seen. Returns false if it was seen within the window.
    fn first_within_window(&self, key: String) -> bool {
        let Ok(mut seen) = self.seen.lock() else {
            return true;
        };
        let now = Instant::now();
        seen.retain(|_, at| now.duration_since(*at) < self.ttl);
        if seen.contains_key(&key) {
            return false;
        }
        seen.insert(key, now);
        true
    }
}

#[cfg(test)]
#[path = "recorder_tests.rs"]
mod recorder_tests;
