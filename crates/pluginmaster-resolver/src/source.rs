// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Where registry documents come from.

use std::time::Duration;

use async_trait::async_trait;
use pluginmaster_core::{FetchError, PluginmasterError};
use pluginmaster_manifest::{parse_document, validate_descriptor, PluginDescriptor};
use tracing::debug;

/// A registry the resolver can read descriptors from.
///
/// Implementations return only validated descriptors; anything the
/// registry serves that fails validation is a [`FetchError::Permanent`].
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// A human-readable location (usually the document URL).
    fn location(&self) -> &str;

    /// Fetch and validate the registry's current document.
    async fn fetch(&self) -> Result<Vec<PluginDescriptor>, FetchError>;
}

/// A registry document served over HTTP(S).
#[derive(Debug, Clone)]
pub struct HttpManifestSource {
    url: String,
    client: reqwest::Client,
}

impl HttpManifestSource {
    /// Create a source for `url` with a per-request timeout.
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, PluginmasterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pluginmaster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PluginmasterError::Internal(format!("building HTTP client: {e}")))?;
        Ok(Self::with_client(url, client))
    }

    /// Create a source sharing an existing client.
    pub fn with_client(url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            client,
        }
    }
}

#[async_trait]
impl ManifestSource for HttpManifestSource {
    fn location(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<PluginDescriptor>, FetchError> {
        let transient = |message: String| FetchError::Transient {
            url: self.url.clone(),
            message,
        };

        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::from_status(&self.url, status.as_u16()));
        }

        let body = response.bytes().await.map_err(|e| transient(e.to_string()))?;
        let descriptors = parse_document(&body).map_err(|e| FetchError::Permanent {
            url: self.url.clone(),
            message: e.to_string(),
        })?;

        debug!(url = %self.url, plugins = descriptors.len(), "registry fetched");
        Ok(descriptors)
    }
}

/// A fixed set of descriptors, for local documents and tests.
#[derive(Debug, Clone)]
pub struct StaticManifestSource {
    location: String,
    descriptors: Vec<PluginDescriptor>,
}

impl StaticManifestSource {
    pub fn new(location: impl Into<String>, descriptors: Vec<PluginDescriptor>) -> Self {
        Self {
            location: location.into(),
            descriptors,
        }
    }
}

#[async_trait]
impl ManifestSource for StaticManifestSource {
    fn location(&self) -> &str {
        &self.location
    }

    async fn fetch(&self) -> Result<Vec<PluginDescriptor>, FetchError> {
        for descriptor in &self.descriptors {
            validate_descriptor(descriptor).map_err(|e| FetchError::Permanent {
                url: self.location.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(self.descriptors.clone())
    }
}
