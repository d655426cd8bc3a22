// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `pluginmaster generate`: mirror external archives and build the document.

use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use pluginmaster_builder::{external_plugins, ArchiveFetcher, BuildOptions, ManifestBuilder};
use pluginmaster_config::PluginmasterConfig;
use pluginmaster_core::PluginmasterError;
use tracing::{info, warn};

/// Archive downloads can be large; this bounds a single request.
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Directory of plugin release archives (overrides builder.plugins_dir).
    #[arg(long)]
    pub plugins_dir: Option<PathBuf>,
    /// Where to write the document (overrides builder.output_path).
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Branch used in download links (overrides builder.branch and GITHUB_REF).
    #[arg(long)]
    pub branch: Option<String>,
    /// Skip downloading external plugin archives.
    #[arg(long)]
    pub offline: bool,
}

pub async fn run_generate(config: PluginmasterConfig, args: GenerateArgs) -> Result<(), PluginmasterError> {
    let github_ref = std::env::var("GITHUB_REF").ok();
    let mut options = BuildOptions::from_config(&config.builder, github_ref.as_deref());
    if let Some(dir) = args.plugins_dir {
        options.plugins_dir = dir;
    }
    if let Some(branch) = args.branch {
        options.branch = branch;
    }

    let externals = external_plugins(&config.builder);
    if !externals.is_empty() {
        if args.offline {
            info!(count = externals.len(), "offline, skipping external archives");
        } else {
            let fetcher = ArchiveFetcher::new(DOWNLOAD_TIMEOUT)?;
            let report = fetcher.fetch_all(&options.plugins_dir, &externals).await;
            for (url, error) in &report.failed {
                warn!(%url, %error, "external archive not updated");
            }
        }
    }

    let output = args
        .output
        .or_else(|| config.builder.output_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(&config.registry.manifest_path));

    let store = ManifestBuilder::new(options).build_to(&output)?;
    println!(
        "wrote {} plugins to {}",
        store.snapshot().active_count(),
        output.display()
    );
    Ok(())
}
