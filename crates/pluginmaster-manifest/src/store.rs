// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The authoritative manifest store.
//!
//! Readers load the current [`ManifestSnapshot`] from an `ArcSwap` without
//! locking. Writers serialize on a mutex, build a complete replacement
//! snapshot (document already rendered) and swap it in, so a reader sees
//! either the old manifest or the new one, never a mix.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use chrono::Utc;
use pluginmaster_core::{PluginmasterError, StoreError, ValidationError};
use tracing::{debug, info};

use crate::descriptor::{name_key, PluginDescriptor};
use crate::document::parse_document;
use crate::snapshot::{Deprecation, ManifestSnapshot, PluginRecord, SerializedManifest};
use crate::validation::validate_descriptor;
use crate::version::PluginVersion;

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// First publication of this plugin name.
    Created,
    /// A newer version was appended to the plugin's history.
    NewVersion,
    /// Metadata of the current version changed; URLs and version did not.
    Refreshed,
    /// The descriptor is identical to the one already served.
    Unchanged,
}

/// Holds every published plugin and serves consistent snapshots.
pub struct ManifestStore {
    current: ArcSwap<ManifestSnapshot>,
    writer: Mutex<()>,
}

impl ManifestStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(ManifestSnapshot::empty()),
            writer: Mutex::new(()),
        }
    }

    /// Create a store holding `descriptors`, rejecting invalid entries and
    /// duplicate names. The result is a single snapshot.
    pub fn from_descriptors(
        descriptors: impl IntoIterator<Item = PluginDescriptor>,
    ) -> Result<Self, PluginmasterError> {
        let mut records = BTreeMap::new();
        for descriptor in descriptors {
            let descriptor = descriptor.normalized();
            validate_descriptor(&descriptor)?;
            let key = descriptor.key();
            if records.contains_key(&key) {
                return Err(StoreError::DuplicateName {
                    name: descriptor.name,
                }
                .into());
            }
            records.insert(key, PluginRecord::new(descriptor));
        }

        let snapshot = ManifestSnapshot::build(1, records)?;
        Ok(Self {
            current: ArcSwap::from_pointee(snapshot),
            writer: Mutex::new(()),
        })
    }

    /// Load a store from a manifest document on disk.
    pub fn load(path: &Path) -> Result<Self, PluginmasterError> {
        let bytes = std::fs::read(path)
            .map_err(|e| PluginmasterError::io(format!("reading {}", path.display()), e))?;
        let store = Self::from_descriptors(parse_document(&bytes)?)?;
        info!(
            path = %path.display(),
            plugins = store.snapshot().active_count(),
            "manifest loaded"
        );
        Ok(store)
    }

    /// The current snapshot. Holding it pins that view; later publishes do
    /// not affect it.
    pub fn snapshot(&self) -> Arc<ManifestSnapshot> {
        self.current.load_full()
    }

    /// Every active descriptor, ordered by name.
    pub fn get_all(&self) -> Vec<PluginDescriptor> {
        self.current.load().active().cloned().collect()
    }

    /// The currently served descriptor for `name`.
    pub fn get(&self, name: &str) -> Result<PluginDescriptor, StoreError> {
        self.current.load().get(name).cloned()
    }

    /// Every published version of `name`, oldest first, deprecated or not.
    pub fn history(&self, name: &str) -> Result<Vec<PluginDescriptor>, StoreError> {
        Ok(self.current.load().record(name)?.versions.clone())
    }

    /// Check a descriptor without publishing it.
    pub fn validate(&self, descriptor: &PluginDescriptor) -> Result<(), ValidationError> {
        validate_descriptor(descriptor)
    }

    /// The serialized document for the current snapshot. Calls with no
    /// intervening write return the same bytes.
    pub fn serve(&self) -> SerializedManifest {
        self.current.load().serialized()
    }

    /// Add a plugin that must not exist yet.
    pub fn insert(&self, descriptor: PluginDescriptor) -> Result<(), PluginmasterError> {
        let descriptor = descriptor.normalized();
        validate_descriptor(&descriptor)?;

        self.update(|records| {
            let key = descriptor.key();
            if records.contains_key(&key) {
                return Err(StoreError::DuplicateName {
                    name: descriptor.name.clone(),
                }
                .into());
            }
            records.insert(key, PluginRecord::new(descriptor.clone()));
            Ok(())
        })?;
        info!(name = %descriptor.name, "plugin inserted");
        Ok(())
    }

    /// Publish a new plugin or a new version of an existing one.
    pub fn publish(&self, descriptor: PluginDescriptor) -> Result<PublishOutcome, PluginmasterError> {
        let descriptor = descriptor.normalized();
        validate_descriptor(&descriptor)?;

        let name = descriptor.name.clone();
        let outcome = self.update_with(|records| {
            let key = descriptor.key();
            let Some(record) = records.get_mut(&key) else {
                records.insert(key, PluginRecord::new(descriptor.clone()));
                return Ok(Some(PublishOutcome::Created));
            };

            if let Some(d) = &record.deprecation {
                return Err(StoreError::Deprecated {
                    name: record.current().name.clone(),
                    reason: d.reason.clone(),
                }
                .into());
            }

            let outcome = plan_publish(record.current(), &descriptor)?;
            match outcome {
                PublishOutcome::Unchanged => return Ok(None),
                PublishOutcome::NewVersion => record.versions.push(descriptor.clone()),
                PublishOutcome::Refreshed | PublishOutcome::Created => {
                    let last = record.versions.len() - 1;
                    record.versions[last] = descriptor.clone();
                }
            }
            Ok(Some(outcome))
        })?;

        let outcome = outcome.unwrap_or(PublishOutcome::Unchanged);
        info!(%name, version = ?descriptor.version, ?outcome, "plugin published");
        Ok(outcome)
    }

    /// Remove a plugin from the served document, recording why.
    ///
    /// Deprecating an already deprecated plugin keeps the original record.
    pub fn deprecate(&self, name: &str, reason: &str) -> Result<(), PluginmasterError> {
        self.update_with(|records| {
            let record = records
                .get_mut(&name_key(name))
                .ok_or_else(|| StoreError::NotFound {
                    name: name.to_string(),
                })?;
            if record.deprecation.is_some() {
                return Ok(None);
            }
            record.deprecation = Some(Deprecation {
                reason: reason.to_string(),
                deprecated_at: Utc::now(),
            });
            Ok(Some(()))
        })?;
        info!(%name, %reason, "plugin deprecated");
        Ok(())
    }

    /// Write the current document to `path` via a temp file in the same
    /// directory and a rename, so readers of the file never see a partial
    /// manifest.
    ///
    /// Holds the writer lock, so the file never goes back to an older
    /// snapshot when persists race.
    pub fn persist(&self, path: &Path) -> Result<(), PluginmasterError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let manifest = self.serve();
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir)
            .map_err(|e| PluginmasterError::io(format!("creating {}", dir.display()), e))?;

        let mut tmp = tempfile::NamedTempFile::new_in(dir)
            .map_err(|e| PluginmasterError::io(format!("creating temp file in {}", dir.display()), e))?;
        std::io::Write::write_all(&mut tmp, &manifest.body)
            .map_err(|e| PluginmasterError::io("writing manifest", e))?;
        tmp.as_file()
            .sync_all()
            .map_err(|e| PluginmasterError::io("syncing manifest", e))?;
        tmp.persist(path)
            .map_err(|e| PluginmasterError::io(format!("replacing {}", path.display()), e.error))?;

        debug!(path = %path.display(), generation = manifest.generation, "manifest persisted");
        Ok(())
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, PluginRecord>) -> Result<(), PluginmasterError>,
    ) -> Result<(), PluginmasterError> {
        self.update_with(|records| apply(records).map(Some))
            .map(|_| ())
    }

    /// Run `apply` against a copy of the current records and swap in the
    /// result. `Ok(None)` means nothing changed and no swap happens.
    fn update_with<T>(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, PluginRecord>) -> Result<Option<T>, PluginmasterError>,
    ) -> Result<Option<T>, PluginmasterError> {
        let _guard = self.writer.lock().unwrap_or_else(PoisonError::into_inner);
        let current = self.current.load();
        let mut records = current.records().clone();

        let Some(value) = apply(&mut records)? else {
            return Ok(None);
        };

        let next = ManifestSnapshot::build(current.generation() + 1, records)?;
        self.current.store(Arc::new(next));
        Ok(Some(value))
    }
}

impl std::fmt::Debug for ManifestStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let snapshot = self.current.load();
        f.debug_struct("ManifestStore")
            .field("generation", &snapshot.generation())
            .field("plugins", &snapshot.active_count())
            .finish_non_exhaustive()
    }
}

impl Default for ManifestStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Decide how `next` relates to the currently served `current` descriptor.
fn plan_publish(
    current: &PluginDescriptor,
    next: &PluginDescriptor,
) -> Result<PublishOutcome, StoreError> {
    if current == next {
        return Ok(PublishOutcome::Unchanged);
    }

    let regression = |attempted: &str| StoreError::VersionRegression {
        name: next.name.clone(),
        published: current.version.clone().unwrap_or_default(),
        attempted: attempted.to_string(),
    };

    match (&current.version, &next.version) {
        (Some(cur), Some(new)) => {
            // Both parse: validation ran on `next` and on `current` when it
            // was published.
            let cur_v = PluginVersion::parse(cur).map_err(|_| regression(new))?;
            let new_v = PluginVersion::parse(new).map_err(|_| regression(new))?;
            if new_v < cur_v {
                return Err(regression(new));
            }
            if new_v > cur_v {
                return Ok(PublishOutcome::NewVersion);
            }
            check_urls_unchanged(current, next, cur)?;
            Ok(PublishOutcome::Refreshed)
        }
        (Some(_), None) => Err(regression("unversioned")),
        (None, Some(_)) => Ok(PublishOutcome::NewVersion),
        (None, None) => {
            check_urls_unchanged(current, next, "unversioned")?;
            Ok(PublishOutcome::Refreshed)
        }
    }
}

fn check_urls_unchanged(
    current: &PluginDescriptor,
    next: &PluginDescriptor,
    version: &str,
) -> Result<(), StoreError> {
    let immutable = |field| StoreError::ImmutableVersion {
        name: next.name.clone(),
        version: version.to_string(),
        field,
    };
    if current.repository_url != next.repository_url {
        return Err(immutable("repositoryUrl"));
    }
    if current.download_url != next.download_url {
        return Err(immutable("downloadUrl"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(name: &str, version: Option<&str>) -> PluginDescriptor {
        PluginDescriptor {
            name: name.to_string(),
            author: vec!["Liza Carvelli".to_string(), "WigglyMuffin".to_string()],
            description: format!("{name} plugin"),
            repository_url: format!("https://github.com/WigglyMuffin/{name}"),
            dependencies: vec![],
            download_url: format!("https://example.com/plugins/{name}/latest.zip"),
            version: version.map(str::to_string),
            ..Default::default()
        }
    }

    fn questionable() -> PluginDescriptor {
        PluginDescriptor {
            dependencies: vec![
                "vnavmesh".to_string(),
                "Lifestream".to_string(),
                "TextAdvance".to_string(),
            ],
            ..descriptor("Questionable", Some("7.2.0.1"))
        }
    }

    #[test]
    fn get_returns_inserted_descriptor() {
        let store = ManifestStore::new();
        store.insert(questionable()).unwrap();

        let got = store.get("Questionable").unwrap();
        assert_eq!(got.dependencies, vec!["vnavmesh", "Lifestream", "TextAdvance"]);
        assert_eq!(
            store.get("Unknown"),
            Err(StoreError::NotFound {
                name: "Unknown".to_string()
            })
        );
    }

    #[test]
    fn insert_rejects_duplicate_names() {
        let store = ManifestStore::new();
        store.insert(descriptor("vnavmesh", None)).unwrap();
        let err = store.insert(descriptor("VNavmesh", None)).unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Store(StoreError::DuplicateName { .. })
        ));
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn publish_rejects_self_dependency() {
        let store = ManifestStore::new();
        let mut d = descriptor("Questionable", None);
        d.dependencies = vec!["Questionable".to_string()];
        let err = store.publish(d).unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Validation(ValidationError::SelfDependency { .. })
        ));
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn publish_rejects_non_ascii_self_dependency() {
        let store = ManifestStore::new();
        let mut d = descriptor("Ärger", None);
        d.dependencies = vec!["ÄRGER".to_string()];
        let err = store.publish(d).unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Validation(ValidationError::SelfDependency { .. })
        ));
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn debug_reports_generation_and_size() {
        let store = ManifestStore::from_descriptors([questionable()]).unwrap();
        let debug = format!("{store:?}");
        assert!(debug.starts_with("ManifestStore"));
        assert!(debug.contains("generation: 1"));
        assert!(debug.contains("plugins: 1"));
    }

    #[test]
    fn serve_is_byte_identical_without_writes() {
        let store = ManifestStore::from_descriptors([questionable(), descriptor("vnavmesh", None)])
            .unwrap();
        let first = store.serve();
        let second = store.serve();
        assert_eq!(first.body, second.body);
        assert_eq!(first.etag, second.etag);
        assert_eq!(first.generation, second.generation);
    }

    #[test]
    fn get_all_is_ordered_by_name() {
        let store = ManifestStore::from_descriptors([
            descriptor("vnavmesh", None),
            descriptor("Lifestream", None),
            descriptor("TextAdvance", None),
        ])
        .unwrap();
        let names: Vec<String> = store.get_all().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["Lifestream", "TextAdvance", "vnavmesh"]);
    }

    #[test]
    fn from_descriptors_rejects_duplicates() {
        let result = ManifestStore::from_descriptors([
            descriptor("vnavmesh", None),
            descriptor("vnavmesh", None),
        ]);
        assert!(matches!(
            result,
            Err(PluginmasterError::Store(StoreError::DuplicateName { .. }))
        ));
    }

    #[test]
    fn publish_appends_newer_versions() {
        let store = ManifestStore::new();
        assert_eq!(
            store.publish(descriptor("Questionable", Some("7.2.0.1"))).unwrap(),
            PublishOutcome::Created
        );
        let mut next = descriptor("Questionable", Some("7.3.0.0"));
        next.download_url = "https://example.com/plugins/Questionable/7.3.zip".to_string();
        assert_eq!(store.publish(next).unwrap(), PublishOutcome::NewVersion);

        assert_eq!(store.get("Questionable").unwrap().version.as_deref(), Some("7.3.0.0"));
        let history = store.history("Questionable").unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].version.as_deref(), Some("7.2.0.1"));
    }

    #[test]
    fn publish_rejects_version_regression() {
        let store = ManifestStore::new();
        store.publish(descriptor("Questionable", Some("7.2.0.1"))).unwrap();
        let err = store
            .publish(descriptor("Questionable", Some("7.1.9.9")))
            .unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Store(StoreError::VersionRegression { .. })
        ));

        let err = store.publish(descriptor("Questionable", None)).unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Store(StoreError::VersionRegression { .. })
        ));
    }

    #[test]
    fn publish_rejects_url_change_at_same_version() {
        let store = ManifestStore::new();
        store.publish(descriptor("Questionable", Some("7.2.0.1"))).unwrap();
        let mut moved = descriptor("Questionable", Some("7.2.0.1"));
        moved.download_url = "https://mirror.example.com/Questionable.zip".to_string();
        let err = store.publish(moved).unwrap_err();
        assert!(matches!(
            err,
            PluginmasterError::Store(StoreError::ImmutableVersion { field: "downloadUrl", .. })
        ));
    }

    #[test]
    fn publish_refreshes_metadata_at_same_version() {
        let store = ManifestStore::new();
        store.publish(descriptor("Questionable", Some("7.2.0.1"))).unwrap();
        let mut touched = descriptor("Questionable", Some("7.2.0.1"));
        touched.last_update = Some("1760000000".to_string());
        assert_eq!(store.publish(touched).unwrap(), PublishOutcome::Refreshed);
        assert_eq!(store.history("Questionable").unwrap().len(), 1);
        assert_eq!(
            store.get("Questionable").unwrap().last_update.as_deref(),
            Some("1760000000")
        );
    }

    #[test]
    fn identical_publish_does_not_swap() {
        let store = ManifestStore::new();
        store.publish(questionable()).unwrap();
        let generation = store.serve().generation;
        assert_eq!(store.publish(questionable()).unwrap(), PublishOutcome::Unchanged);
        assert_eq!(store.serve().generation, generation);
    }

    #[test]
    fn deprecate_removes_from_document_but_keeps_history() {
        let store = ManifestStore::new();
        store.publish(questionable()).unwrap();
        store.publish(descriptor("vnavmesh", None)).unwrap();
        store.deprecate("Questionable", "moved to another repository").unwrap();

        assert_eq!(store.get_all().len(), 1);
        assert!(matches!(
            store.get("Questionable"),
            Err(StoreError::Deprecated { .. })
        ));
        assert_eq!(store.history("Questionable").unwrap().len(), 1);
        let body = String::from_utf8(store.serve().body.to_vec()).unwrap();
        assert!(!body.contains("Questionable"));

        let err = store.publish(questionable()).unwrap_err();
        assert!(matches!(err, PluginmasterError::Store(StoreError::Deprecated { .. })));
    }

    #[test]
    fn deprecate_unknown_plugin_is_not_found() {
        let store = ManifestStore::new();
        let err = store.deprecate("ghost", "gone").unwrap_err();
        assert!(matches!(err, PluginmasterError::Store(StoreError::NotFound { .. })));
    }

    #[test]
    fn held_snapshot_is_unaffected_by_later_publish() {
        let store = ManifestStore::new();
        store.publish(descriptor("vnavmesh", None)).unwrap();
        let pinned = store.snapshot();
        store.publish(descriptor("Lifestream", None)).unwrap();

        assert_eq!(pinned.active_count(), 1);
        assert_eq!(store.snapshot().active_count(), 2);
        assert!(store.snapshot().generation() > pinned.generation());
    }

    #[test]
    fn persist_then_load_round_trips_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("repo").join("pluginmaster.json");

        let store = ManifestStore::from_descriptors([questionable(), descriptor("vnavmesh", None)])
            .unwrap();
        store.persist(&path).unwrap();

        let loaded = ManifestStore::load(&path).unwrap();
        assert_eq!(loaded.get_all(), store.get_all());
        assert_eq!(loaded.serve().body, store.serve().body);
    }

    #[test]
    fn concurrent_readers_see_whole_snapshots() {
        let store = Arc::new(ManifestStore::new());
        let writer = {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for i in 0..50 {
                    store.publish(descriptor(&format!("plugin{i:02}"), None)).unwrap();
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let served = store.serve();
                        let parsed = crate::document::parse_document(&served.body).unwrap();
                        assert_eq!(
                            crate::document::document_etag(&served.body),
                            *served.etag
                        );
                        assert!(parsed.len() <= 50);
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for r in readers {
            r.join().unwrap();
        }
        assert_eq!(store.get_all().len(), 50);
    }
}
