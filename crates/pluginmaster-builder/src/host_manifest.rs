// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The per-plugin manifest shipped inside a release archive.
//!
//! Host-loader manifests use PascalCase keys and carry many build-time fields
//! the registry has no use for. Only the keys below are read; everything
//! else is dropped on deserialization.

use pluginmaster_manifest::{split_authors, PluginDescriptor};
use serde::Deserialize;

/// The subset of a plugin's own `<InternalName>.json` the registry keeps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct HostManifest {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub punchline: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub internal_name: Option<String>,
    #[serde(default)]
    pub repo_url: Option<String>,
    #[serde(default)]
    pub changelog: Option<String>,
    #[serde(default)]
    pub assembly_version: Option<String>,
    #[serde(default)]
    pub applicable_version: Option<String>,
    #[serde(default)]
    pub dalamud_api_level: Option<u32>,
    #[serde(default)]
    pub testing_assembly_version: Option<String>,
    #[serde(default)]
    pub testing_dalamud_api_level: Option<u32>,
    #[serde(default)]
    pub icon_url: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    /// Names or URLs of plugins that must be installed alongside.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Links and timestamps the builder computes for one manifest entry.
#[derive(Debug, Clone, Default)]
pub struct EntryLinks {
    pub download_url: String,
    pub download_url_testing: Option<String>,
    pub last_update: Option<String>,
}

impl HostManifest {
    /// Copy the testing build's version and API level onto this manifest.
    pub fn apply_testing(&mut self, testing: &HostManifest) {
        self.testing_assembly_version = testing.assembly_version.clone();
        self.testing_dalamud_api_level = testing.dalamud_api_level;
    }

    /// Convert into a registry descriptor.
    ///
    /// The description falls back to the punchline when the manifest has
    /// none. The download count always starts at zero.
    pub fn into_descriptor(self, links: EntryLinks) -> PluginDescriptor {
        let description = self
            .description
            .filter(|d| !d.trim().is_empty())
            .or_else(|| self.punchline.clone())
            .unwrap_or_default();

        PluginDescriptor {
            name: self.name,
            author: self.author.as_deref().map(split_authors).unwrap_or_default(),
            description,
            repository_url: self.repo_url.unwrap_or_default(),
            dependencies: self.dependencies,
            download_url: links.download_url,
            version: self.assembly_version,
            internal_name: self.internal_name,
            punchline: self.punchline,
            tags: self.tags,
            changelog: self.changelog,
            applicable_version: self.applicable_version,
            api_level: self.dalamud_api_level,
            testing_version: self.testing_assembly_version,
            testing_api_level: self.testing_dalamud_api_level,
            download_url_testing: links.download_url_testing,
            icon_url: self.icon_url,
            image_urls: self.image_urls,
            download_count: Some(0),
            last_update: links.last_update,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUESTIONABLE_JSON: &str = r#"{
        "Author": "Liza Carvelli, WigglyMuffin",
        "Name": "Questionable",
        "Punchline": "Automates quests",
        "Description": "",
        "InternalName": "Questionable",
        "AssemblyVersion": "7.2.0.1",
        "RepoUrl": "https://github.com/WigglyMuffin/Questionable",
        "ApplicableVersion": "any",
        "DalamudApiLevel": 13,
        "Tags": ["quest"],
        "Dependencies": ["vnavmesh", "Lifestream", "TextAdvance"],
        "LoadPriority": 0,
        "AcceptsFeedback": true
    }"#;

    #[test]
    fn unknown_host_keys_are_dropped() {
        let manifest: HostManifest = serde_json::from_str(QUESTIONABLE_JSON).unwrap();
        assert_eq!(manifest.name, "Questionable");
        assert_eq!(manifest.dalamud_api_level, Some(13));
        assert_eq!(manifest.dependencies.len(), 3);
    }

    #[test]
    fn converts_to_descriptor() {
        let manifest: HostManifest = serde_json::from_str(QUESTIONABLE_JSON).unwrap();
        let d = manifest.into_descriptor(EntryLinks {
            download_url: "https://example.com/Questionable/latest.zip".to_string(),
            download_url_testing: None,
            last_update: Some("1760000000".to_string()),
        });
        assert_eq!(d.author, vec!["Liza Carvelli", "WigglyMuffin"]);
        assert_eq!(d.description, "Automates quests");
        assert_eq!(d.repository_url, "https://github.com/WigglyMuffin/Questionable");
        assert_eq!(d.version.as_deref(), Some("7.2.0.1"));
        assert_eq!(d.api_level, Some(13));
        assert_eq!(d.download_count, Some(0));
        assert_eq!(d.last_update.as_deref(), Some("1760000000"));
    }

    #[test]
    fn apply_testing_copies_version_fields() {
        let mut base: HostManifest = serde_json::from_str(QUESTIONABLE_JSON).unwrap();
        let testing = HostManifest {
            assembly_version: Some("7.3.0.0".to_string()),
            dalamud_api_level: Some(14),
            ..Default::default()
        };
        base.apply_testing(&testing);
        assert_eq!(base.testing_assembly_version.as_deref(), Some("7.3.0.0"));
        assert_eq!(base.testing_dalamud_api_level, Some(14));
    }
}
