// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Configuration of the source controllers.
//!
//! [`SourceControllerConfig`] is shared by all source controllers of a process and can be
//! embedded in a configuration file. [`ControllerManagerArgs`] is the command line of the
//! `dnsman` binary and produces a [`SourceControllerConfig`].
//!
//! # Example
//!
//! ```rust
//! use dnsman::config::SourceControllerConfig;
//!
//! let config: SourceControllerConfig = serde_json::from_str(
//!     r#"{"sourceClass": "internal", "targetNamespace": "dns", "concurrentSyncs": 4}"#,
//! ).unwrap();
//! assert_eq!(config.effective_target_class(), "internal");
//! assert_eq!(config.concurrent_syncs(), 4);
//! ```

use crate::constants::{DEFAULT_CONCURRENT_SYNCS, DEFAULT_EVENT_DEDUP_TTL_SECS, METRICS_SERVER_PORT};
use crate::dns::{equivalent_class, normalize_class};
use crate::dns_errors::ConfigError;
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Settings of the source controllers.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceControllerConfig {
    /// DNS class of the watched source objects (default class if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_class: Option<String>,

    /// DNS class of the generated entries (source class if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_class: Option<String>,

    /// Namespace for all generated entries (namespace of the source object if unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_namespace: Option<String>,

    /// Identity of the source cluster, used in owner annotations
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_cluster_id: Option<String>,

    /// Identity of the control plane cluster holding the generated entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cluster_id: Option<String>,

    /// Prefix of the generated entry names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_name_prefix: Option<String>,

    /// Labels set on all generated entries
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub target_labels: BTreeMap<String, String>,

    /// Maximum number of concurrent reconciliations per controller
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_syncs: Option<u16>,
}

impl SourceControllerConfig {
    /// The configured source class, empty if unset.
    #[must_use]
    pub fn source_class(&self) -> &str {
        self.source_class.as_deref().unwrap_or_default()
    }

    /// The target class, falling back to the source class.
    #[must_use]
    pub fn effective_target_class(&self) -> &str {
        self.target_class
            .as_deref()
            .or(self.source_class.as_deref())
            .unwrap_or_default()
    }

    /// The source cluster ID, empty if unset.
    #[must_use]
    pub fn source_cluster_id(&self) -> &str {
        self.source_cluster_id.as_deref().unwrap_or_default()
    }

    /// The target cluster ID, empty if unset.
    #[must_use]
    pub fn target_cluster_id(&self) -> &str {
        self.target_cluster_id.as_deref().unwrap_or_default()
    }

    /// The target name prefix, empty if unset.
    #[must_use]
    pub fn target_name_prefix(&self) -> &str {
        self.target_name_prefix.as_deref().unwrap_or_default()
    }

    /// A non-empty target namespace, if configured.
    #[must_use]
    pub fn target_namespace(&self) -> Option<&str> {
        self.target_namespace.as_deref().filter(|ns| !ns.is_empty())
    }

    #[must_use]
    pub fn concurrent_syncs(&self) -> u16 {
        self.concurrent_syncs.unwrap_or(DEFAULT_CONCURRENT_SYNCS)
    }
}

/// Source controllers that can be enabled on the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, ValueEnum)]
pub enum ControllerKind {
    /// `Service` objects of type `LoadBalancer`
    Service,
    /// `networking.k8s.io/v1` `Ingress` objects
    Ingress,
    /// `DNSEntry` objects in the source cluster
    Dnsentry,
}

/// Command line of the controller manager.
#[derive(Clone, Debug, Parser)]
#[command(name = "dnsman")]
#[command(about = "Creates DNSEntry objects for annotated Services, Ingresses and DNSEntries")]
pub struct ControllerManagerArgs {
    /// Source controllers to run (`dnsentry` needs a separate target class or cluster)
    #[arg(long, value_enum, value_delimiter = ',', default_value = "service,ingress")]
    pub controllers: Vec<ControllerKind>,

    /// DNS class of the watched source objects
    #[arg(long)]
    pub source_class: Option<String>,

    /// DNS class of the generated entries (defaults to the source class)
    #[arg(long)]
    pub target_class: Option<String>,

    /// Namespace for the generated entries (defaults to the source object namespace)
    #[arg(long)]
    pub target_namespace: Option<String>,

    /// Identity of the source cluster
    #[arg(long)]
    pub source_cluster_id: Option<String>,

    /// Identity of the control plane cluster
    #[arg(long)]
    pub target_cluster_id: Option<String>,

    /// Prefix of the generated entry names
    #[arg(long)]
    pub target_name_prefix: Option<String>,

    /// Label set on generated entries, as `key=value` (repeatable)
    #[arg(long = "target-label", value_parser = parse_key_value)]
    pub target_labels: Vec<(String, String)>,

    /// Maximum number of concurrent reconciliations per controller
    #[arg(long, default_value_t = DEFAULT_CONCURRENT_SYNCS)]
    pub concurrent_syncs: u16,

    /// Kubeconfig of the control plane cluster (defaults to the source cluster)
    #[arg(long)]
    pub control_plane_kubeconfig: Option<PathBuf>,

    /// Port of the Prometheus metrics endpoint
    #[arg(long, default_value_t = METRICS_SERVER_PORT)]
    pub metrics_port: u16,

    /// Window in seconds in which identical events are recorded only once
    #[arg(long, default_value_t = DEFAULT_EVENT_DEDUP_TTL_SECS)]
    pub event_dedup_ttl_secs: u64,
}

impl ControllerManagerArgs {
    /// Builds the source controller configuration from the command line.
    #[must_use]
    pub fn source_controller_config(&self) -> SourceControllerConfig {
        SourceControllerConfig {
            source_class: self.source_class.clone(),
            target_class: self.target_class.clone(),
            target_namespace: self.target_namespace.clone(),
            source_cluster_id: self.source_cluster_id.clone(),
            target_cluster_id: self.target_cluster_id.clone(),
            target_name_prefix: self.target_name_prefix.clone(),
            target_labels: self.target_labels.iter().cloned().collect(),
            concurrent_syncs: Some(self.concurrent_syncs),
        }
    }

    /// Whether the given source controller is enabled.
    #[must_use]
    pub fn is_enabled(&self, kind: ControllerKind) -> bool {
        self.controllers.contains(&kind)
    }

    /// Checks the settings before any controller is started.
    ///
    /// # Errors
    ///
    /// Returns an error if the `DNSEntry` source controller is enabled while it would
    /// watch the class and cluster it writes to.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.is_enabled(ControllerKind::Dnsentry) {
            return Ok(());
        }
        let config = self.source_controller_config();
        let same_cluster = self.control_plane_kubeconfig.is_none()
            && config.source_cluster_id() == config.target_cluster_id();
        if same_cluster
            && equivalent_class(config.source_class(), config.effective_target_class())
        {
            return Err(ConfigError::DnsEntrySourceIsTarget {
                class: normalize_class(config.source_class()),
            });
        }
        Ok(())
    }
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{s}'")),
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod config_tests;
