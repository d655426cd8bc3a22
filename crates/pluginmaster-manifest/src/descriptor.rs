// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The plugin descriptor record served in the manifest document.
//!
//! Field order in this struct is the field order of the served JSON, so
//! reordering fields changes the bytes clients diff against.

use serde::{Deserialize, Serialize};

/// Metadata for one installable plugin.
///
/// Required fields default to empty on deserialization so that a missing key
/// surfaces as a `ValidationError::MissingField` from validation rather than
/// an opaque parse failure. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PluginDescriptor {
    /// Unique plugin name (compared case-insensitively within a store).
    #[serde(default)]
    pub name: String,
    /// Ordered author list, serialized as a `", "`-joined string.
    #[serde(default, with = "authors")]
    pub author: Vec<String>,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Source repository of the plugin.
    #[serde(default)]
    pub repository_url: String,
    /// Names or URLs of plugins this one requires.
    #[serde(default)]
    pub dependencies: Vec<String>,
    /// Where the installable artifact is fetched from.
    #[serde(default)]
    pub download_url: String,
    /// Published version, dotted numeric (`1.2.3` or `1.2.3.4`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Host-loader internal name, used for download paths.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub internal_name: Option<String>,
    /// One-line summary.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punchline: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub changelog: Option<String>,
    /// Host game version the plugin targets (`"any"` for all).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applicable_version: Option<String>,
    /// Host loader API level.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_level: Option<u32>,
    /// Version of the testing build, when one is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testing_api_level: Option<u32>,
    /// Download location of the testing build.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url_testing: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_count: Option<u64>,
    /// Unix timestamp (seconds) of the last archive update.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_update: Option<String>,
}

impl PluginDescriptor {
    /// Returns the descriptor with surrounding whitespace trimmed from its
    /// identifying fields and duplicate dependency references removed
    /// (first occurrence wins).
    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.repository_url = self.repository_url.trim().to_string();
        self.download_url = self.download_url.trim().to_string();
        self.author = self
            .author
            .into_iter()
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty())
            .collect();

        let mut deps: Vec<String> = Vec::with_capacity(self.dependencies.len());
        for dep in self.dependencies {
            let dep = dep.trim().to_string();
            if !deps.iter().any(|seen| same_reference(seen, &dep)) {
                deps.push(dep);
            }
        }
        self.dependencies = deps;
        self
    }

    /// Key under which this descriptor is stored.
    pub fn key(&self) -> String {
        name_key(&self.name)
    }

    /// Returns true if `reference` (a dependency entry) points at this plugin,
    /// either by name or by its repository or download URL.
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        let reference = reference.trim();
        if is_url_reference(reference) {
            let wanted = trim_url(reference);
            return (!self.repository_url.is_empty() && trim_url(&self.repository_url) == wanted)
                || (!self.download_url.is_empty() && trim_url(&self.download_url) == wanted);
        }
        name_key(reference) == self.key()
    }
}

/// Store key for a plugin name.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Dependency entries containing a scheme separator are URL references.
pub fn is_url_reference(reference: &str) -> bool {
    reference.contains("://")
}

fn same_reference(a: &str, b: &str) -> bool {
    if is_url_reference(a) || is_url_reference(b) {
        trim_url(a) == trim_url(b)
    } else {
        name_key(a) == name_key(b)
    }
}

fn trim_url(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Split a comma-separated author string into individual names.
pub fn split_authors(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(str::to_string)
        .collect()
}

mod authors {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(authors: &[String], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&authors.join(", "))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Joined(String),
            List(Vec<String>),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Joined(s) => super::split_authors(&s),
            Raw::List(list) => list
                .into_iter()
                .map(|a| a.trim().to_string())
                .filter(|a| !a.is_empty())
                .collect(),
        })
    }
}
