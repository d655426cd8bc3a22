// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pluginmaster serve`: load the manifest and run the registry endpoint.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use pluginmaster_config::PluginmasterConfig;
use pluginmaster_core::PluginmasterError;
use pluginmaster_gateway::{start_server, AuthConfig, GatewayState, ServerConfig};
use pluginmaster_manifest::ManifestStore;
use tracing::{info, warn};

/// Run the registry until SIGINT or SIGTERM.
pub async fn run_serve(
    config: PluginmasterConfig,
    manifest: Option<PathBuf>,
) -> Result<(), PluginmasterError> {
    let manifest_path =
        manifest.unwrap_or_else(|| PathBuf::from(&config.registry.manifest_path));
    let store = Arc::new(open_store(&manifest_path)?);

    if config.gateway.bearer_token.is_none() {
        warn!("no gateway.bearer_token configured; publish and deprecate are disabled");
    }

    let mut state = GatewayState::new(
        store,
        AuthConfig {
            bearer_token: config.gateway.bearer_token.clone(),
        },
    );
    if config.gateway.persist_on_publish {
        state = state.with_manifest_path(&manifest_path);
    }

    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        manifest_route: config.gateway.manifest_route.clone(),
    };

    start_server(&server_config, state, shutdown_signal()).await?;
    info!("pluginmaster serve shutdown complete");
    Ok(())
}

/// Load the store from `path`, or start empty when the file does not exist yet.
fn open_store(path: &Path) -> Result<ManifestStore, PluginmasterError> {
    if path.exists() {
        ManifestStore::load(path)
    } else {
        warn!(path = %path.display(), "manifest not found, starting with an empty registry");
        Ok(ManifestStore::new())
    }
}

/// Resolves on SIGINT (Ctrl+C) or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT (Ctrl+C), initiating shutdown"),
        _ = terminate => info!("received SIGTERM, initiating shutdown"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_manifest_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = open_store(&dir.path().join("pluginmaster.json")).unwrap();
        assert!(store.get_all().is_empty());
    }

    #[test]
    fn existing_manifest_is_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pluginmaster.json");
        std::fs::write(
            &path,
            r#"[{
                "name": "Questionable",
                "author": "Liza Carvelli, WigglyMuffin",
                "description": "Automates quests.",
                "repositoryUrl": "https://github.com/WigglyMuffin/Questionable",
                "dependencies": ["vnavmesh"],
                "downloadUrl": "https://example.com/Questionable/latest.zip"
            }]"#,
        )
        .unwrap();

        let store = open_store(&path).unwrap();
        assert_eq!(store.get_all().len(), 1);
    }

    #[test]
    fn corrupt_manifest_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pluginmaster.json");
        std::fs::write(&path, "{").unwrap();
        assert!(open_store(&path).is_err());
    }
}
