// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Plugin version ordering.
//!
//! Plugin loaders publish assembly-style four-part versions (`1.2.3.4`) that
//! semver cannot parse, so versions here are one to four numeric components
//! with an optional semver pre-release suffix. Missing components compare as
//! zero, so `1.2` == `1.2.0.0`.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pluginmaster_core::ValidationError;
use semver::Prerelease;

const MAX_COMPONENTS: usize = 4;

/// A parsed, comparable plugin version.
#[derive(Debug, Clone)]
pub struct PluginVersion {
    components: [u64; MAX_COMPONENTS],
    len: usize,
    pre: Prerelease,
}

impl PluginVersion {
    /// Parse a version string; build metadata after `+` is ignored.
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidVersion {
            version: raw.to_string(),
        };

        let trimmed = raw.trim();
        let without_build = trimmed.split('+').next().unwrap_or_default();
        let (numbers, pre) = match without_build.split_once('-') {
            Some((_, "")) => return Err(invalid()),
            Some((numbers, pre)) => (numbers, Prerelease::new(pre).map_err(|_| invalid())?),
            None => (without_build, Prerelease::EMPTY),
        };

        let mut components = [0u64; MAX_COMPONENTS];
        let mut len = 0;
        for part in numbers.split('.') {
            if len == MAX_COMPONENTS || part.is_empty() {
                return Err(invalid());
            }
            components[len] = part.parse().map_err(|_| invalid())?;
            len += 1;
        }

        Ok(Self {
            components,
            len,
            pre,
        })
    }

    /// Returns true for pre-release versions (`1.0.0-beta.1`).
    pub fn is_prerelease(&self) -> bool {
        !self.pre.is_empty()
    }
}

impl FromStr for PluginVersion {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PluginVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.components[..self.len]
            .iter()
            .map(u64::to_string)
            .collect();
        write!(f, "{}", parts.join("."))?;
        if self.is_prerelease() {
            write!(f, "-{}", self.pre)?;
        }
        Ok(())
    }
}

impl Ord for PluginVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.components
            .cmp(&other.components)
            .then_with(|| match (self.pre.is_empty(), other.pre.is_empty()) {
                (true, true) => Ordering::Equal,
                // A release sorts after any of its pre-releases.
                (true, false) => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => self.pre.cmp(&other.pre),
            })
    }
}

impl PartialOrd for PluginVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for PluginVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PluginVersion {}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(s: &str) -> PluginVersion {
        PluginVersion::parse(s).unwrap()
    }

    #[test]
    fn parses_assembly_and_semver_styles() {
        assert_eq!(v("7.2.0.1").to_string(), "7.2.0.1");
        assert_eq!(v("1.0.0-beta.2").to_string(), "1.0.0-beta.2");
        assert_eq!(v(" 3 ").to_string(), "3");
        assert_eq!(v("1.2.3+build.5").to_string(), "1.2.3");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "1..2", "1.2.3.4.5", "v1.2", "1.x", "1.0-"] {
            assert!(
                matches!(PluginVersion::parse(bad), Err(ValidationError::InvalidVersion { .. })),
                "expected `{bad}` to be rejected"
            );
        }
    }

    #[test]
    fn missing_components_compare_as_zero() {
        assert_eq!(v("1.2"), v("1.2.0.0"));
        assert!(v("1.2.0.1") > v("1.2"));
    }

    #[test]
    fn numeric_not_lexicographic() {
        assert!(v("1.10.0") > v("1.9.9"));
        assert!(v("10.0.0.0") > v("9.99.99.99"));
    }

    #[test]
    fn prerelease_sorts_before_release() {
        assert!(v("1.0.0-alpha") < v("1.0.0"));
        assert!(v("1.0.0-alpha") < v("1.0.0-beta"));
        assert!(v("1.0.0-rc.1") > v("0.9.9"));
    }
}
