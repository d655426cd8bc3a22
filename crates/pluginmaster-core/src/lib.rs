// SPDX-FileCopyrightText: 2026 Pluginmaster Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the pluginmaster registry.
//!
//! Holds the error vocabulary shared by the manifest store, the registry
//! endpoint, the manifest builder and the client resolver.

pub mod error;

pub use error::{FetchError, PluginmasterError, ResolutionError, StoreError, ValidationError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pluginmaster_error_has_all_variants() {
        let _config = PluginmasterError::Config("test".into());
        let _validation = PluginmasterError::from(ValidationError::MissingField {
            field: "name",
        });
        let _store = PluginmasterError::from(StoreError::NotFound {
            name: "test".into(),
        });
        let _fetch = PluginmasterError::from(FetchError::Permanent {
            url: "https://example.com".into(),
            message: "404".into(),
        });
        let _resolution = PluginmasterError::from(ResolutionError::Cycle {
            path: vec!["a".into(), "a".into()],
        });
        let _io = PluginmasterError::io("reading", std::io::Error::other("test"));
        let _archive = PluginmasterError::Archive {
            path: "plugins/x/latest.zip".into(),
            message: "test".into(),
        };
        let _server = PluginmasterError::Server {
            message: "test".into(),
            source: None,
        };
        let _internal = PluginmasterError::Internal("test".into());
    }

    #[test]
    fn fetch_error_classification() {
        let transient = FetchError::Transient {
            url: "https://example.com".into(),
            message: "503".into(),
        };
        let permanent = FetchError::Permanent {
            url: "https://example.com".into(),
            message: "404".into(),
        };
        assert!(transient.is_transient());
        assert!(!permanent.is_transient());
    }

    #[test]
    fn fetch_error_from_status() {
        assert!(FetchError::from_status("u", 503).is_transient());
        assert!(FetchError::from_status("u", 429).is_transient());
        assert!(!FetchError::from_status("u", 404).is_transient());
        assert!(!FetchError::from_status("u", 401).is_transient());
    }

    #[test]
    fn cycle_error_renders_path() {
        let err = ResolutionError::Cycle {
            path: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn validation_error_wraps_with_context() {
        let err = PluginmasterError::from(ValidationError::SelfDependency {
            name: "Questionable".into(),
        });
        assert_eq!(
            err.to_string(),
            "validation error: plugin `Questionable` lists itself as a dependency"
        );
    }
}
