// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for pluginmaster.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Top-level pluginmaster configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PluginmasterConfig {
    /// Manifest store settings.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// HTTP registry endpoint settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Manifest generation from plugin archives.
    #[serde(default)]
    pub builder: BuilderConfig,

    /// Client resolver settings.
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Manifest store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Path of the manifest document the store loads and persists.
    #[serde(default = "default_manifest_path")]
    pub manifest_path: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            log_level: default_log_level(),
        }
    }
}

fn default_manifest_path() -> String {
    "pluginmaster.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Registry endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Route the manifest document is served on.
    #[serde(default = "default_manifest_route")]
    pub manifest_route: String,

    /// Bearer token for publish/deprecate routes. `None` rejects all writes.
    #[serde(default)]
    pub bearer_token: Option<String>,

    /// Write the manifest back to `registry.manifest_path` after each change.
    #[serde(default = "default_persist_on_publish")]
    pub persist_on_publish: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            manifest_route: default_manifest_route(),
            bearer_token: None,
            persist_on_publish: default_persist_on_publish(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_manifest_route() -> String {
    "/pluginmaster.json".to_string()
}

fn default_persist_on_publish() -> bool {
    true
}

/// Manifest builder configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BuilderConfig {
    /// Directory holding `<Name>/latest.zip` release archives.
    #[serde(default = "default_plugins_dir")]
    pub plugins_dir: String,

    /// Output path. Defaults to `registry.manifest_path`.
    #[serde(default)]
    pub output_path: Option<String>,

    /// Branch substituted into download templates. Falls back to
    /// `GITHUB_REF`, then `main`.
    #[serde(default)]
    pub branch: Option<String>,

    /// Template for the main download link.
    #[serde(default = "default_download_url")]
    pub download_url: String,

    /// Template for the testing download link.
    #[serde(default = "default_testing_download_url")]
    pub testing_download_url: String,

    /// Template for the global build download link.
    #[serde(default = "default_global_download_url")]
    pub global_download_url: String,

    /// Suffix appended to the name of global build entries.
    #[serde(default = "default_global_name_suffix")]
    pub global_name_suffix: String,

    /// Externally hosted plugins downloaded before the build, keyed by
    /// plugin directory name.
    #[serde(default)]
    pub external: BTreeMap<String, ExternalPluginConfig>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            plugins_dir: default_plugins_dir(),
            output_path: None,
            branch: None,
            download_url: default_download_url(),
            testing_download_url: default_testing_download_url(),
            global_download_url: default_global_download_url(),
            global_name_suffix: default_global_name_suffix(),
            external: BTreeMap::new(),
        }
    }
}

fn default_plugins_dir() -> String {
    "plugins".to_string()
}

fn default_download_url() -> String {
    "https://github.com/WigglyMuffin/DalamudPlugins/raw/{branch}/plugins/{plugin_name}/latest.zip"
        .to_string()
}

fn default_testing_download_url() -> String {
    "https://github.com/WigglyMuffin/DalamudPlugins/raw/{branch}/plugins/{plugin_name}/testing/latest.zip"
        .to_string()
}

fn default_global_download_url() -> String {
    "https://github.com/WigglyMuffin/DalamudPlugins/raw/{branch}/plugins/{plugin_name}/global/latest.zip"
        .to_string()
}

fn default_global_name_suffix() -> String {
    " (API12)".to_string()
}

/// Download locations for one externally hosted plugin.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ExternalPluginConfig {
    /// Main release archive.
    pub main: String,

    /// Testing release archive.
    #[serde(default)]
    pub testing: Option<String>,

    /// Global build archive.
    #[serde(default)]
    pub global: Option<String>,
}

/// Client resolver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverConfig {
    /// Registry document URLs, consulted in order.
    #[serde(default)]
    pub registries: Vec<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            registries: Vec::new(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}
