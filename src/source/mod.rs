// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Source object model.
//!
//! A source object is a Kubernetes object (Service, Ingress, DNSEntry) whose annotations
//! ask for DNS entries. This module holds the kind independent parts:
//!
//! - [`ownership`] - how generated entries record their source object
//! - [`spec_input`] - the desired DNS state computed from a source object
//! - [`unique_strings`] - sorted string sets used for names and targets

pub mod ownership;
pub mod spec_input;
pub mod unique_strings;

pub use ownership::{EntryOwnerData, OwnerData, OwnerMarker, OwnerToken};
pub use spec_input::{DNSSpecInput, IgnoreMode};
pub use unique_strings::UniqueStrings;
