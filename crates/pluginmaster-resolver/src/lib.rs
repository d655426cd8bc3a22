// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client-side dependency resolution across one or more plugin registries.
//!
//! Registries are consulted in the order given. Every document is fetched
//! and validated before resolution starts, so a plugin always resolves
//! against the same view regardless of which registry answered first.

pub mod graph;
pub mod source;

use std::time::Duration;

use futures::future::join_all;
use pluginmaster_core::{FetchError, PluginmasterError};
use tracing::{info, warn};

pub use graph::{RegistryIndex, ResolvedPlugin};
pub use source::{HttpManifestSource, ManifestSource, StaticManifestSource};

/// Resolves install orders against an ordered list of registries.
pub struct Resolver {
    sources: Vec<Box<dyn ManifestSource>>,
}

impl Resolver {
    /// Create a resolver over `sources`, highest priority first.
    pub fn new(sources: Vec<Box<dyn ManifestSource>>) -> Self {
        Self { sources }
    }

    /// Create a resolver over HTTP registries.
    pub fn from_urls(urls: &[String], timeout: Duration) -> Result<Self, PluginmasterError> {
        let mut sources: Vec<Box<dyn ManifestSource>> = Vec::with_capacity(urls.len());
        for url in urls {
            sources.push(Box::new(HttpManifestSource::new(url.clone(), timeout)?));
        }
        Ok(Self::new(sources))
    }

    /// Fetch every registry and merge them into one index.
    ///
    /// Fetches run concurrently. If any registry fails the whole index is
    /// rejected: a missing higher-priority registry would change which
    /// plugin a name resolves to.
    pub async fn fetch_index(&self) -> Result<RegistryIndex, FetchError> {
        let results = join_all(self.sources.iter().map(|s| s.fetch())).await;

        let mut index = RegistryIndex::new();
        for (source, result) in self.sources.iter().zip(results) {
            match result {
                Ok(descriptors) => index.add_registry(source.location(), descriptors),
                Err(e) => {
                    warn!(
                        registry = %source.location(),
                        transient = e.is_transient(),
                        error = %e,
                        "registry fetch failed"
                    );
                    return Err(e);
                }
            }
        }
        Ok(index)
    }

    /// Install order for `name`, dependencies first.
    pub async fn resolve(&self, name: &str) -> Result<Vec<ResolvedPlugin>, PluginmasterError> {
        let index = self.fetch_index().await?;
        let order = index.install_order(name)?;
        info!(plugin = %name, count = order.len(), "resolved install order");
        Ok(order)
    }
}
