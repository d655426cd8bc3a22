// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generates the registry document from a directory of plugin releases.
//!
//! The expected layout is one directory per plugin:
//!
//! ```text
//! plugins/
//!   Questionable/
//!     latest.zip           # contains Questionable.json
//!     testing/latest.zip   # optional testing build
//!     global/latest.zip    # optional build for the global client
//! ```
//!
//! Archives of externally hosted plugins can be mirrored into the same
//! layout first with [`ArchiveFetcher`].

pub mod archive;
pub mod fetch;
pub mod host_manifest;
pub mod templates;

use std::path::{Path, PathBuf};

use pluginmaster_config::model::BuilderConfig;
use pluginmaster_core::PluginmasterError;
use pluginmaster_manifest::{ManifestStore, PluginDescriptor};
use tracing::{debug, info};

pub use archive::{is_valid_archive, modified_unix_secs, read_host_manifest};
pub use fetch::{ArchiveFetcher, CacheMeta, ExternalPlugin, FetchOutcome, FetchReport};
pub use host_manifest::{EntryLinks, HostManifest};
pub use templates::{branch_from_ref, render_template};

const ARCHIVE_NAME: &str = "latest.zip";

/// Inputs for one generation run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub plugins_dir: PathBuf,
    pub branch: String,
    pub download_url: String,
    pub testing_download_url: String,
    pub global_download_url: String,
    pub global_name_suffix: String,
}

impl BuildOptions {
    /// Options from the `[builder]` config section. An explicit branch wins
    /// over `git_ref` (normally the `GITHUB_REF` environment variable).
    pub fn from_config(config: &BuilderConfig, git_ref: Option<&str>) -> Self {
        let branch = config
            .branch
            .clone()
            .unwrap_or_else(|| branch_from_ref(git_ref));
        Self {
            plugins_dir: PathBuf::from(&config.plugins_dir),
            branch,
            download_url: config.download_url.clone(),
            testing_download_url: config.testing_download_url.clone(),
            global_download_url: config.global_download_url.clone(),
            global_name_suffix: config.global_name_suffix.clone(),
        }
    }
}

/// External plugins listed under `[builder.external]`, ordered by name.
pub fn external_plugins(config: &BuilderConfig) -> Vec<ExternalPlugin> {
    config
        .external
        .iter()
        .map(|(name, ext)| ExternalPlugin {
            name: name.clone(),
            main: ext.main.clone(),
            testing: ext.testing.clone(),
            global: ext.global.clone(),
        })
        .collect()
}

/// Turns plugin archives into a validated manifest store.
#[derive(Debug, Clone)]
pub struct ManifestBuilder {
    options: BuildOptions,
}

impl ManifestBuilder {
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Read every plugin directory and build a store from the results.
    ///
    /// Any unreadable archive or invalid entry fails the whole build.
    pub fn build(&self) -> Result<ManifestStore, PluginmasterError> {
        let mut descriptors = Vec::new();
        for (dir_name, dir) in self.plugin_dirs()? {
            descriptors.extend(self.entries_for(&dir_name, &dir)?);
        }
        let store = ManifestStore::from_descriptors(descriptors)?;
        info!(
            plugins_dir = %self.options.plugins_dir.display(),
            branch = %self.options.branch,
            plugins = store.snapshot().active_count(),
            "manifest generated"
        );
        Ok(store)
    }

    /// Build and write the document to `output`.
    ///
    /// When `output` already holds a document, every built entry is published
    /// on top of it: a stale archive cannot move a served version backwards or
    /// change the URLs of a published version. Plugins whose archives are gone
    /// are deprecated and drop out of the document. On error nothing is written.
    pub fn build_to(&self, output: &Path) -> Result<ManifestStore, PluginmasterError> {
        let built = self.build()?;
        let store = if output.is_file() {
            let served = ManifestStore::load(output)?;
            publish_over(&served, built.get_all())?;
            served
        } else {
            built
        };
        store.persist(output)?;
        info!(output = %output.display(), "manifest written");
        Ok(store)
    }

    /// Subdirectories holding a release archive, sorted by name.
    fn plugin_dirs(&self) -> Result<Vec<(String, PathBuf)>, PluginmasterError> {
        let root = &self.options.plugins_dir;
        let entries = std::fs::read_dir(root)
            .map_err(|e| PluginmasterError::io(format!("reading {}", root.display()), e))?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry =
                entry.map_err(|e| PluginmasterError::io(format!("reading {}", root.display()), e))?;
            let path = entry.path();
            if !path.join(ARCHIVE_NAME).is_file() {
                continue;
            }
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            dirs.push((name.to_string(), path.clone()));
        }
        dirs.sort();
        Ok(dirs)
    }

    fn entries_for(&self, dir_name: &str, dir: &Path) -> Result<Vec<PluginDescriptor>, PluginmasterError> {
        let opts = &self.options;
        let archive = dir.join(ARCHIVE_NAME);
        let mut manifest = read_host_manifest(&archive, dir_name)?;

        let testing_archive = dir.join("testing").join(ARCHIVE_NAME);
        if testing_archive.is_file() {
            let testing = read_host_manifest(&testing_archive, dir_name)?;
            manifest.apply_testing(&testing);
        }

        let slug = link_name(&manifest, dir_name);
        let download_url_testing = manifest
            .testing_assembly_version
            .is_some()
            .then(|| render_template(&opts.testing_download_url, &opts.branch, &slug));
        let links = EntryLinks {
            download_url: render_template(&opts.download_url, &opts.branch, &slug),
            download_url_testing,
            last_update: Some(modified_unix_secs(&archive)?.to_string()),
        };
        debug!(plugin = %manifest.name, version = ?manifest.assembly_version, "plugin entry");
        let mut entries = vec![manifest.into_descriptor(links)];

        let global_archive = dir.join("global").join(ARCHIVE_NAME);
        if global_archive.is_file() {
            let mut global = read_host_manifest(&global_archive, dir_name)?;
            let slug = link_name(&global, dir_name);
            global.name.push_str(&opts.global_name_suffix);
            global.testing_assembly_version = None;
            global.testing_dalamud_api_level = None;
            let links = EntryLinks {
                download_url: render_template(&opts.global_download_url, &opts.branch, &slug),
                download_url_testing: None,
                last_update: Some(modified_unix_secs(&global_archive)?.to_string()),
            };
            debug!(plugin = %global.name, "global plugin entry");
            entries.push(global.into_descriptor(links));
        }

        Ok(entries)
    }
}

fn publish_over(
    served: &ManifestStore,
    built: Vec<PluginDescriptor>,
) -> Result<(), PluginmasterError> {
    for descriptor in &built {
        let outcome = served.publish(descriptor.clone())?;
        debug!(plugin = %descriptor.name, ?outcome, "entry merged");
    }
    for stale in served.get_all() {
        if !built.iter().any(|d| d.key() == stale.key()) {
            served.deprecate(&stale.name, "release archive removed")?;
        }
    }
    Ok(())
}

/// The name used in download links: the internal name, else the directory.
fn link_name(manifest: &HostManifest, dir_name: &str) -> String {
    manifest
        .internal_name
        .as_deref()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .unwrap_or(dir_name)
        .to_string()
}
