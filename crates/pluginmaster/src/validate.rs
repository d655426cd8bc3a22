// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pluginmaster validate`: check a manifest document before publishing it.

use std::path::Path;

use pluginmaster_core::{PluginmasterError, ResolutionError};
use pluginmaster_manifest::ManifestStore;
use pluginmaster_resolver::RegistryIndex;

/// Load `path` with full validation and check its dependency graph.
///
/// Dependencies missing from the document are reported but allowed, since
/// they may live in another registry. Cycles are errors.
pub fn run_validate(path: &Path) -> Result<(), PluginmasterError> {
    let report = check_document(path)?;
    for (plugin, dependency) in &report.external {
        println!("note: {plugin} depends on `{dependency}`, not defined in this document");
    }
    println!("{}: ok ({} plugins)", path.display(), report.plugins);
    Ok(())
}

#[derive(Debug, Default)]
struct ValidationReport {
    plugins: usize,
    /// `(plugin, dependency)` pairs that point outside the document.
    external: Vec<(String, String)>,
}

fn check_document(path: &Path) -> Result<ValidationReport, PluginmasterError> {
    let store = ManifestStore::load(path)?;
    let descriptors = store.get_all();

    let mut index = RegistryIndex::new();
    index.add_registry(&path.display().to_string(), descriptors.clone());

    let mut report = ValidationReport {
        plugins: descriptors.len(),
        ..Default::default()
    };
    for descriptor in &descriptors {
        for dependency in &descriptor.dependencies {
            if index.lookup(dependency).is_none() {
                report
                    .external
                    .push((descriptor.name.clone(), dependency.clone()));
            }
        }
    }
    if let Some(path) = index.find_cycle() {
        return Err(ResolutionError::Cycle { path }.into());
    }
    Ok(report)
}
