// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin descriptors, validation and the manifest store.
//!
//! A [`ManifestStore`] holds every published [`PluginDescriptor`] and serves
//! immutable [`ManifestSnapshot`]s. The registry endpoint renders nothing on
//! the request path: each snapshot carries its document bytes and ETag.

pub mod descriptor;
pub mod document;
pub mod snapshot;
pub mod store;
pub mod validation;
pub mod version;

pub use descriptor::{split_authors, PluginDescriptor};
pub use document::{parse_document, render_document};
pub use snapshot::{Deprecation, ManifestSnapshot, PluginRecord, SerializedManifest};
pub use store::{ManifestStore, PublishOutcome};
pub use validation::validate_descriptor;
pub use version::PluginVersion;
