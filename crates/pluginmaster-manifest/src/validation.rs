// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Descriptor validation run before anything is published or trusted.
//!
//! Checks required fields, URL shape and self-dependency. Validation fails
//! fast on the first problem, in field order, so the reported error is
//! deterministic for a given descriptor.

use pluginmaster_core::ValidationError;
use url::Url;

use crate::descriptor::{is_url_reference, PluginDescriptor};
use crate::version::PluginVersion;

/// Validate a descriptor for publication.
pub fn validate_descriptor(descriptor: &PluginDescriptor) -> Result<(), ValidationError> {
    require("name", &descriptor.name)?;
    if descriptor.author.iter().all(|a| a.trim().is_empty()) {
        return Err(ValidationError::MissingField { field: "author" });
    }
    require("description", &descriptor.description)?;
    require("repositoryUrl", &descriptor.repository_url)?;
    require("downloadUrl", &descriptor.download_url)?;

    check_url("repositoryUrl", &descriptor.repository_url)?;
    check_url("downloadUrl", &descriptor.download_url)?;
    if let Some(url) = &descriptor.download_url_testing {
        check_url("downloadUrlTesting", url)?;
    }
    if let Some(url) = &descriptor.icon_url {
        check_url("iconUrl", url)?;
    }
    for url in &descriptor.image_urls {
        check_url("imageUrls", url)?;
    }

    for dep in &descriptor.dependencies {
        if dep.trim().is_empty() {
            return Err(ValidationError::MissingField {
                field: "dependencies",
            });
        }
        if is_url_reference(dep) {
            check_url("dependencies", dep)?;
        }
        if descriptor.is_referenced_by(dep) {
            return Err(ValidationError::SelfDependency {
                name: descriptor.name.trim().to_string(),
            });
        }
    }

    if let Some(version) = &descriptor.version {
        PluginVersion::parse(version)?;
    }
    if let Some(version) = &descriptor.testing_version {
        PluginVersion::parse(version)?;
    }

    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::MissingField { field })
    } else {
        Ok(())
    }
}

/// Accept only absolute http(s) URLs with a host.
fn check_url(field: &'static str, raw: &str) -> Result<(), ValidationError> {
    let malformed = |reason: String| ValidationError::MalformedUrl {
        field,
        url: raw.to_string(),
        reason,
    };

    let url = Url::parse(raw.trim()).map_err(|e| malformed(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(malformed(format!("unsupported scheme `{other}`"))),
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(malformed("missing host".to_string()));
    }
    Ok(())
}
