// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mirroring archives of externally hosted plugins.
//!
//! Each downloaded archive gets a `latest.meta` sidecar holding the `ETag` and
//! `Last-Modified` headers it was served with. A later run sends a HEAD
//! request first and skips the download when either still matches.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::{Stream, StreamExt};
use pluginmaster_core::{FetchError, PluginmasterError};
use reqwest::header::{HeaderMap, HeaderName, ETAG, LAST_MODIFIED};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::archive::is_valid_archive;

/// Cache validators recorded next to a downloaded archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    #[serde(rename = "ETag", default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(rename = "Last-Modified", default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
}

impl CacheMeta {
    fn from_headers(headers: &HeaderMap) -> Self {
        let value = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        Self {
            etag: value(ETAG),
            last_modified: value(LAST_MODIFIED),
        }
    }

    fn is_empty(&self) -> bool {
        self.etag.is_none() && self.last_modified.is_none()
    }

    /// True when either validator is present on both sides and equal.
    pub fn matches(&self, other: &CacheMeta) -> bool {
        let same = |a: &Option<String>, b: &Option<String>| a.is_some() && a == b;
        same(&self.etag, &other.etag) || same(&self.last_modified, &other.last_modified)
    }
}

/// Where one external plugin's archives come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalPlugin {
    /// Directory name under the plugins directory.
    pub name: String,
    pub main: String,
    pub testing: Option<String>,
    pub global: Option<String>,
}

impl ExternalPlugin {
    /// `(url, destination)` pairs for every configured archive.
    pub fn targets(&self, plugins_dir: &Path) -> Vec<(String, PathBuf)> {
        let base = plugins_dir.join(&self.name);
        let mut targets = vec![(self.main.clone(), base.join("latest.zip"))];
        if let Some(url) = &self.testing {
            targets.push((url.clone(), base.join("testing").join("latest.zip")));
        }
        if let Some(url) = &self.global {
            targets.push((url.clone(), base.join("global").join("latest.zip")));
        }
        targets
    }
}

/// What happened to one archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The local copy matches the server's validators.
    UpToDate,
    /// A fresh copy was written.
    Downloaded,
}

/// Totals for a mirroring run.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub downloaded: usize,
    pub up_to_date: usize,
    pub failed: Vec<(String, PluginmasterError)>,
}

/// Downloads plugin archives with conditional re-fetching.
#[derive(Debug, Clone)]
pub struct ArchiveFetcher {
    client: reqwest::Client,
}

impl ArchiveFetcher {
    /// Create a fetcher whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, PluginmasterError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("pluginmaster/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PluginmasterError::Internal(format!("building HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Mirror every archive of every plugin in `plugins`.
    ///
    /// A failure on one archive is recorded and the run continues.
    pub async fn fetch_all(&self, plugins_dir: &Path, plugins: &[ExternalPlugin]) -> FetchReport {
        let mut report = FetchReport::default();
        for plugin in plugins {
            for (url, dest) in plugin.targets(plugins_dir) {
                match self.fetch(&url, &dest).await {
                    Ok(FetchOutcome::Downloaded) => report.downloaded += 1,
                    Ok(FetchOutcome::UpToDate) => report.up_to_date += 1,
                    Err(e) => {
                        warn!(plugin = %plugin.name, %url, error = %e, "external archive fetch failed");
                        report.failed.push((url, e));
                    }
                }
            }
        }
        info!(
            downloaded = report.downloaded,
            up_to_date = report.up_to_date,
            failed = report.failed.len(),
            "external archives mirrored"
        );
        report
    }

    /// Download `url` to `dest` unless the local copy is current.
    ///
    /// The body is written to a temporary file and only renamed over `dest`
    /// once it opens as a zip archive, so a bad response never replaces a
    /// good copy.
    pub async fn fetch(&self, url: &str, dest: &Path) -> Result<FetchOutcome, PluginmasterError> {
        let meta_path = meta_path(dest);

        if dest.exists() {
            let stored = read_meta(&meta_path).await;
            if !stored.is_empty() {
                let response = self
                    .client
                    .head(url)
                    .send()
                    .await
                    .map_err(|e| request_error(url, &e))?;
                check_status(url, &response)?;
                if CacheMeta::from_headers(response.headers()).matches(&stored) {
                    debug!(%url, "archive up to date");
                    return Ok(FetchOutcome::UpToDate);
                }
            }
        }

        let parent = dest.parent().unwrap_or_else(|| Path::new("."));
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| PluginmasterError::io(format!("creating {}", parent.display()), e))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| request_error(url, &e))?;
        check_status(url, &response)?;
        let meta = CacheMeta::from_headers(response.headers());

        let tmp_path = dest.with_extension("zip.part");
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| request_error(url, &e)));
        let size = write_part(body, &tmp_path).await?;

        if !is_valid_archive(&tmp_path) {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PluginmasterError::Archive {
                path: dest.display().to_string(),
                message: format!("{url} did not return a zip archive"),
            });
        }

        if let Err(e) = tokio::fs::rename(&tmp_path, dest).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(PluginmasterError::io(format!("replacing {}", dest.display()), e));
        }

        if meta.is_empty() {
            let _ = tokio::fs::remove_file(&meta_path).await;
        } else {
            let json = serde_json::to_vec_pretty(&meta)?;
            tokio::fs::write(&meta_path, json)
                .await
                .map_err(|e| PluginmasterError::io(format!("writing {}", meta_path.display()), e))?;
        }

        info!(%url, dest = %dest.display(), size, "archive downloaded");
        Ok(FetchOutcome::Downloaded)
    }
}

/// The sidecar path for an archive: `latest.zip` -> `latest.meta`.
pub fn meta_path(dest: &Path) -> PathBuf {
    dest.with_extension("meta")
}

/// Stream `body` into a new file at `path` and return the number of bytes
/// written. The file is removed when any chunk or write fails.
async fn write_part<S, B>(body: S, path: &Path) -> Result<u64, PluginmasterError>
where
    S: Stream<Item = Result<B, PluginmasterError>>,
    B: AsRef<[u8]>,
{
    let result = copy_body(body, path).await;
    if result.is_err() {
        let _ = tokio::fs::remove_file(path).await;
    }
    result
}

async fn copy_body<S, B>(body: S, path: &Path) -> Result<u64, PluginmasterError>
where
    S: Stream<Item = Result<B, PluginmasterError>>,
    B: AsRef<[u8]>,
{
    let mut file = tokio::fs::File::create(path)
        .await
        .map_err(|e| PluginmasterError::io(format!("creating {}", path.display()), e))?;
    let mut body = std::pin::pin!(body);
    let mut size: u64 = 0;
    while let Some(chunk) = body.next().await {
        let chunk = chunk?;
        let bytes = chunk.as_ref();
        size += bytes.len() as u64;
        file.write_all(bytes)
            .await
            .map_err(|e| PluginmasterError::io(format!("writing {}", path.display()), e))?;
    }
    file.flush()
        .await
        .map_err(|e| PluginmasterError::io(format!("flushing {}", path.display()), e))?;
    Ok(size)
}

async fn read_meta(path: &Path) -> CacheMeta {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_default(),
        Err(_) => CacheMeta::default(),
    }
}

fn check_status(url: &str, response: &reqwest::Response) -> Result<(), FetchError> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(FetchError::from_status(url, status.as_u16()))
    }
}

fn request_error(url: &str, err: &reqwest::Error) -> PluginmasterError {
    match err.status() {
        Some(status) => FetchError::from_status(url, status.as_u16()).into(),
        None => FetchError::Transient {
            url: url.to_string(),
            message: err.to_string(),
        }
        .into(),
    }
}
