// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as bind addresses, route shapes, URL templates and registry URLs.

use crate::diagnostic::ConfigError;
use crate::model::PluginmasterConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &PluginmasterConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if config.registry.manifest_path.trim().is_empty() {
        fail("registry.manifest_path must not be empty".to_string());
    }

    if !LOG_LEVELS.contains(&config.registry.log_level.as_str()) {
        fail(format!(
            "registry.log_level `{}` is not one of: {}",
            config.registry.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    let route = &config.gateway.manifest_route;
    if !route.starts_with('/') || route.len() < 2 || route.contains(char::is_whitespace) {
        fail(format!(
            "gateway.manifest_route `{route}` must be an absolute path like `/pluginmaster.json`"
        ));
    } else if route.contains(['{', '}', '*', ':']) {
        fail(format!(
            "gateway.manifest_route `{route}` must be a literal path without `{{`, `}}`, `*` or `:`"
        ));
    } else if is_reserved_route(route) {
        fail(format!(
            "gateway.manifest_route `{route}` collides with a built-in gateway route"
        ));
    }

    if let Some(token) = &config.gateway.bearer_token
        && token.trim().is_empty()
    {
        fail("gateway.bearer_token must not be blank when set".to_string());
    }

    if config.builder.plugins_dir.trim().is_empty() {
        fail("builder.plugins_dir must not be empty".to_string());
    }

    for (key, template) in [
        ("builder.download_url", &config.builder.download_url),
        ("builder.testing_download_url", &config.builder.testing_download_url),
        ("builder.global_download_url", &config.builder.global_download_url),
    ] {
        if !template.contains("{plugin_name}") {
            fail(format!("{key} must contain the `{{plugin_name}}` placeholder"));
        }
        let sample = template
            .replace("{branch}", "main")
            .replace("{plugin_name}", "Sample");
        if !is_http_url(&sample) {
            fail(format!("{key} `{template}` is not an http(s) URL template"));
        }
    }

    for (name, external) in &config.builder.external {
        let urls = std::iter::once(("main", Some(&external.main)))
            .chain([("testing", external.testing.as_ref()), ("global", external.global.as_ref())]);
        for (kind, url) in urls {
            if let Some(url) = url
                && !is_http_url(url)
            {
                fail(format!(
                    "builder.external.{name}.{kind} `{url}` is not an http(s) URL"
                ));
            }
        }
    }

    for (i, url) in config.resolver.registries.iter().enumerate() {
        if !is_http_url(url) {
            fail(format!("resolver.registries[{i}] `{url}` is not an http(s) URL"));
        }
    }

    if config.resolver.timeout_secs == 0 {
        fail("resolver.timeout_secs must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Paths the gateway serves itself: `/health` and everything under `/v1/plugins`.
fn is_reserved_route(route: &str) -> bool {
    route == "/health" || route == "/v1/plugins" || route.starts_with("/v1/plugins/")
}

fn is_http_url(raw: &str) -> bool {
    url::Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host_str().is_some())
        .unwrap_or(false)
}
