// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the pluginmaster registry.

use thiserror::Error;

/// A descriptor failed schema validation and must not be published.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is absent or blank.
    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    /// A URL field does not parse as an absolute http(s) URL.
    #[error("malformed URL in `{field}`: `{url}` ({reason})")]
    MalformedUrl {
        field: &'static str,
        url: String,
        reason: String,
    },

    /// The descriptor names itself among its dependencies.
    #[error("plugin `{name}` lists itself as a dependency")]
    SelfDependency { name: String },

    /// The version string is not a dotted numeric version.
    #[error("invalid version `{version}`")]
    InvalidVersion { version: String },
}

/// Manifest store lookups and writes that violate store invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// No plugin with this name was ever published.
    #[error("plugin not found: {name}")]
    NotFound { name: String },

    /// The plugin exists but has been deprecated.
    #[error("plugin `{name}` is deprecated: {reason}")]
    Deprecated { name: String, reason: String },

    /// `insert` was called for a name that is already present.
    #[error("plugin `{name}` is already registered")]
    DuplicateName { name: String },

    /// A publish would move the served version backwards.
    #[error("plugin `{name}` version regression: published {published}, attempted {attempted}")]
    VersionRegression {
        name: String,
        published: String,
        attempted: String,
    },

    /// A publish would rewrite a URL of an already published version.
    #[error("plugin `{name}` version {version} is already published with a different `{field}`")]
    ImmutableVersion {
        name: String,
        version: String,
        field: &'static str,
    },
}

/// A registry document could not be fetched or parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Worth retrying later (network failure, timeout, 5xx, 429).
    #[error("transient fetch failure for {url}: {message}")]
    Transient { url: String, message: String },

    /// Retrying will not help (4xx, malformed JSON, schema violation).
    #[error("permanent fetch failure for {url}: {message}")]
    Permanent { url: String, message: String },
}

impl FetchError {
    /// Classify a non-success HTTP status: 429 and 5xx are transient,
    /// everything else is permanent.
    pub fn from_status(url: impl Into<String>, status: u16) -> Self {
        let url = url.into();
        let message = format!("HTTP {status}");
        if status == 429 || status >= 500 {
            FetchError::Transient { url, message }
        } else {
            FetchError::Permanent { url, message }
        }
    }

    /// Returns true for failures a client may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, FetchError::Transient { .. })
    }
}

/// Dependency resolution failures raised by the client resolver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// The requested plugin is not defined by any registry.
    #[error("plugin `{name}` is not defined by any registry")]
    UnknownPlugin { name: String },

    /// A dependency reference matches nothing in any registry.
    #[error("plugin `{plugin}` depends on unknown `{dependency}`")]
    UnknownDependency { plugin: String, dependency: String },

    /// The dependency graph contains a cycle; `path` starts and ends on the same plugin.
    #[error("dependency cycle: {}", path.join(" -> "))]
    Cycle { path: Vec<String> },
}

/// The primary error type used across all pluginmaster crates.
#[derive(Debug, Error)]
pub enum PluginmasterError {
    /// Configuration errors (invalid TOML, bad values, missing settings).
    #[error("configuration error: {0}")]
    Config(String),

    /// Descriptor validation failures.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Manifest store invariant violations.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Registry fetch failures.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// Dependency resolution failures.
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Filesystem errors with the path or operation that failed.
    #[error("{context}: {source}")]
    Io {
        context: String,
        source: std::io::Error,
    },

    /// A plugin release archive is unreadable or lacks its manifest.
    #[error("archive error in {path}: {message}")]
    Archive { path: String, message: String },

    /// JSON encoding or decoding failures.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP server failures (bind, serve).
    #[error("server error: {message}")]
    Server {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PluginmasterError {
    /// Wrap an I/O error with a human-readable context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        PluginmasterError::Io {
            context: context.into(),
            source,
        }
    }
}
