// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! pluginmaster - a plugin manifest registry.
//!
//! This is the binary entry point: it serves the registry, generates the
//! document from release archives, validates documents and resolves
//! dependency install orders.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

mod generate;
mod resolve;
mod serve;
mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// pluginmaster - a plugin manifest registry.
#[derive(Parser, Debug)]
#[command(name = "pluginmaster", version, about, long_about = None)]
struct Cli {
    /// Config file to load instead of the standard search path.
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Serve the manifest document and the publish API.
    Serve {
        /// Manifest document to load and persist (overrides registry.manifest_path).
        #[arg(long)]
        manifest: Option<PathBuf>,
    },
    /// Generate the manifest document from plugin release archives.
    Generate(generate::GenerateArgs),
    /// Validate a manifest document.
    Validate {
        /// Path of the document to check.
        path: PathBuf,
    },
    /// Print the install order for a plugin.
    Resolve {
        /// Plugin name.
        name: String,
        /// Registry document URL; repeat for more registries, highest priority first.
        #[arg(long = "registry", value_name = "URL")]
        registries: Vec<String>,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => pluginmaster_config::load_and_validate_path(path),
        None => pluginmaster_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            pluginmaster_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.registry.log_level);

    let result = match cli.command {
        Some(Commands::Serve { manifest }) => serve::run_serve(config, manifest).await,
        Some(Commands::Generate(args)) => generate::run_generate(config, args).await,
        Some(Commands::Validate { path }) => validate::run_validate(&path),
        Some(Commands::Resolve { name, registries }) => {
            resolve::run_resolve(config, &name, registries).await
        }
        None => {
            println!("pluginmaster: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("pluginmaster: {e}");
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    // `pluginmaster` also matches the `pluginmaster_*` library targets.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pluginmaster={log_level},tower_http={log_level},warn"))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
