// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pluginmaster resolve`: print a plugin's install order.

use std::time::Duration;

use pluginmaster_config::PluginmasterConfig;
use pluginmaster_core::PluginmasterError;
use pluginmaster_resolver::{ResolvedPlugin, Resolver};

/// Registries from the command line win over `resolver.registries`.
pub async fn run_resolve(
    config: PluginmasterConfig,
    name: &str,
    registries: Vec<String>,
) -> Result<(), PluginmasterError> {
    let registries = if registries.is_empty() {
        config.resolver.registries
    } else {
        registries
    };
    if registries.is_empty() {
        return Err(PluginmasterError::Config(
            "no registries: pass --registry or set resolver.registries".to_string(),
        ));
    }

    let resolver = Resolver::from_urls(&registries, Duration::from_secs(config.resolver.timeout_secs))?;
    let order = resolver.resolve(name).await?;
    for (position, plugin) in order.iter().enumerate() {
        println!("{:>3}. {}", position + 1, format_plugin(plugin));
    }
    Ok(())
}

fn format_plugin(plugin: &ResolvedPlugin) -> String {
    let d = &plugin.descriptor;
    match &d.version {
        Some(version) => format!("{} {} ({})", d.name, version, plugin.registry),
        None => format!("{} ({})", d.name, plugin.registry),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pluginmaster_manifest::PluginDescriptor;

    #[test]
    fn formats_with_and_without_version() {
        let mut plugin = ResolvedPlugin {
            registry: "https://example.com/pluginmaster.json".to_string(),
            descriptor: PluginDescriptor {
                name: "vnavmesh".to_string(),
                ..Default::default()
            },
        };
        assert_eq!(
            format_plugin(&plugin),
            "vnavmesh (https://example.com/pluginmaster.json)"
        );
        plugin.descriptor.version = Some("0.3.0".to_string());
        assert_eq!(
            format_plugin(&plugin),
            "vnavmesh 0.3.0 (https://example.com/pluginmaster.json)"
        );
    }

    #[tokio::test]
    async fn no_registries_is_config_error() {
        let err = run_resolve(PluginmasterConfig::default(), "Questionable", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, PluginmasterError::Config(_)));
    }
}
