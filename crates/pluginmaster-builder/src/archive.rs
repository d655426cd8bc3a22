// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reading plugin release archives.

use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::UNIX_EPOCH;

use pluginmaster_core::PluginmasterError;

use crate::host_manifest::HostManifest;

/// Read `<plugin_name>.json` from the root of the archive at `path`.
pub fn read_host_manifest(path: &Path, plugin_name: &str) -> Result<HostManifest, PluginmasterError> {
    let archive_error = |message: String| PluginmasterError::Archive {
        path: path.display().to_string(),
        message,
    };

    let file = File::open(path)
        .map_err(|e| PluginmasterError::io(format!("opening {}", path.display()), e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| archive_error(e.to_string()))?;

    let entry_name = format!("{plugin_name}.json");
    let mut entry = archive
        .by_name(&entry_name)
        .map_err(|e| archive_error(format!("{entry_name}: {e}")))?;

    let mut contents = String::new();
    entry
        .read_to_string(&mut contents)
        .map_err(|e| archive_error(format!("reading {entry_name}: {e}")))?;

    // Host manifests are often written with a UTF-8 BOM.
    let contents = contents.trim_start_matches('\u{feff}');
    serde_json::from_str(contents).map_err(|e| archive_error(format!("parsing {entry_name}: {e}")))
}

/// True when `path` opens as a zip archive.
pub fn is_valid_archive(path: &Path) -> bool {
    File::open(path)
        .ok()
        .is_some_and(|file| zip::ZipArchive::new(file).is_ok())
}

/// Modification time of `path` in whole seconds since the Unix epoch.
pub fn modified_unix_secs(path: &Path) -> Result<u64, PluginmasterError> {
    let modified = std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| PluginmasterError::io(format!("reading mtime of {}", path.display()), e))?;
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}
