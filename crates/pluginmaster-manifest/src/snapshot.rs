// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Immutable manifest snapshots.
//!
//! A snapshot owns the full plugin state plus the document rendered from it.
//! Snapshots are never mutated after construction; the store builds a new one
//! and swaps it in.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use pluginmaster_core::StoreError;
use serde::Serialize;

use crate::descriptor::{name_key, PluginDescriptor};
use crate::document::{document_etag, render_document};

/// Recorded removal of a plugin from the served document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deprecation {
    pub reason: String,
    pub deprecated_at: DateTime<Utc>,
}

/// Everything the store knows about one plugin name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginRecord {
    /// Published versions, oldest first. Never empty.
    pub versions: Vec<PluginDescriptor>,
    /// Set once the plugin has been deprecated.
    pub deprecation: Option<Deprecation>,
}

impl PluginRecord {
    pub(crate) fn new(descriptor: PluginDescriptor) -> Self {
        Self {
            versions: vec![descriptor],
            deprecation: None,
        }
    }

    /// The descriptor currently served for this plugin.
    pub fn current(&self) -> &PluginDescriptor {
        // `versions` is created non-empty and only ever appended to or
        // replaced at its last index.
        &self.versions[self.versions.len() - 1]
    }

    pub fn is_active(&self) -> bool {
        self.deprecation.is_none()
    }
}

/// Serialized form of a snapshot, ready to hand to clients.
#[derive(Debug, Clone)]
pub struct SerializedManifest {
    pub body: Arc<[u8]>,
    pub etag: Arc<str>,
    pub generation: u64,
}

/// One consistent view of the manifest store.
#[derive(Debug)]
pub struct ManifestSnapshot {
    generation: u64,
    records: BTreeMap<String, PluginRecord>,
    body: Arc<[u8]>,
    etag: Arc<str>,
}

impl ManifestSnapshot {
    /// Build a snapshot and render its document.
    pub(crate) fn build(
        generation: u64,
        records: BTreeMap<String, PluginRecord>,
    ) -> Result<Self, serde_json::Error> {
        let active: Vec<PluginDescriptor> = records
            .values()
            .filter(|r| r.is_active())
            .map(|r| r.current().clone())
            .collect();
        let body = render_document(&active)?;
        let etag = document_etag(&body);
        Ok(Self {
            generation,
            records,
            body: body.into(),
            etag: etag.into(),
        })
    }

    pub(crate) fn empty() -> Self {
        let body: &[u8] = b"[]\n";
        Self {
            generation: 0,
            records: BTreeMap::new(),
            etag: document_etag(body).into(),
            body: body.into(),
        }
    }

    /// Monotonic counter, bumped on every swap.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn records(&self) -> &BTreeMap<String, PluginRecord> {
        &self.records
    }

    /// Active descriptors in served (name) order.
    pub fn active(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.records
            .values()
            .filter(|r| r.is_active())
            .map(PluginRecord::current)
    }

    /// Number of plugins in the served document.
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Look up the record for a plugin name (case-insensitive).
    pub fn record(&self, name: &str) -> Result<&PluginRecord, StoreError> {
        self.records
            .get(&name_key(name))
            .ok_or_else(|| StoreError::NotFound {
                name: name.to_string(),
            })
    }

    /// The currently served descriptor for an active plugin.
    pub fn get(&self, name: &str) -> Result<&PluginDescriptor, StoreError> {
        let record = self.record(name)?;
        match &record.deprecation {
            Some(d) => Err(StoreError::Deprecated {
                name: record.current().name.clone(),
                reason: d.reason.clone(),
            }),
            None => Ok(record.current()),
        }
    }

    /// The rendered document and its validators.
    pub fn serialized(&self) -> SerializedManifest {
        SerializedManifest {
            body: Arc::clone(&self.body),
            etag: Arc::clone(&self.etag),
            generation: self.generation,
        }
    }
}
