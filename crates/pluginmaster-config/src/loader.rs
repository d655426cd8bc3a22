// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./pluginmaster.toml` > `~/.config/pluginmaster/pluginmaster.toml`
//! > `/etc/pluginmaster/pluginmaster.toml` with environment variable overrides via the
//! `PLUGINMASTER_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};

use crate::model::PluginmasterConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/pluginmaster/pluginmaster.toml";

/// Local config file, relative to the working directory.
pub const LOCAL_CONFIG_PATH: &str = "pluginmaster.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/pluginmaster/pluginmaster.toml` (system-wide)
/// 3. `~/.config/pluginmaster/pluginmaster.toml` (user XDG config)
/// 4. `./pluginmaster.toml` (local directory)
/// 5. `PLUGINMASTER_*` environment variables
pub fn load_config() -> Result<PluginmasterConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
///
/// Used for testing and explicit configuration.
pub fn load_config_from_str(toml_content: &str) -> Result<PluginmasterConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluginmasterConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PluginmasterConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PluginmasterConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used internally for config loading (exposed for diagnostic use).
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PluginmasterConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_PATH))
        .merge(env_provider())
}

/// `~/.config/pluginmaster/pluginmaster.toml`, when a config dir exists.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("pluginmaster/pluginmaster.toml"))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PLUGINMASTER_GATEWAY_BEARER_TOKEN` must map to
/// `gateway.bearer_token`, not `gateway.bearer.token`.
fn env_provider() -> Env {
    Env::prefixed("PLUGINMASTER_").map(|key| map_env_key(key.as_str()).into())
}

/// Map a lowercased, prefix-stripped env key to its dotted config path.
pub(crate) fn map_env_key(key: &str) -> String {
    for section in ["registry", "gateway", "builder", "resolver"] {
        if let Some(rest) = key.strip_prefix(section).and_then(|r| r.strip_prefix('_')) {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}
