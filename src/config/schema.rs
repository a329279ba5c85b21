//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::preprocessor::PreprocessorKind;
use crate::routing::join_paths;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Active theme layout.
    pub theme: ThemeConfig,

    /// Preprocessors to register, in match-priority order.
    pub preprocessors: Vec<PreprocessorKind>,

    /// Host rewrite rules and recognized parameters.
    pub host: HostConfig,

    /// Build step settings.
    pub build: BuildConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Initial preference values (see `preferences` for known keys).
    pub preferences: BTreeMap<String, serde_json::Value>,
}

impl AppConfig {
    /// Preprocessors to register, falling back to every built-in kind.
    pub fn preprocessor_kinds(&self) -> Vec<PreprocessorKind> {
        if self.preprocessors.is_empty() {
            vec![PreprocessorKind::Script, PreprocessorKind::Stylesheet]
        } else {
            self.preprocessors.clone()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

/// Theme layout on disk and on the web.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ThemeConfig {
    /// Site base URL (e.g., "http://localhost:8080").
    pub site_url: String,

    /// Theme base URL (e.g., "http://localhost:8080/wp-content/themes/demo").
    pub theme_url: String,

    /// Absolute root of the active theme.
    pub template_directory: PathBuf,

    /// Assets root. Defaults to `<template>/theme/assets`.
    pub assets_directory: Option<PathBuf>,

    /// Compiled-output cache. Defaults to `<template>/tmp`.
    pub cache_directory: Option<PathBuf>,

    /// Reject intercepted URLs that lie outside the theme URL.
    pub require_theme_prefix: bool,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:8080".to_string(),
            theme_url: "http://localhost:8080/theme".to_string(),
            template_directory: PathBuf::from("."),
            assets_directory: None,
            cache_directory: None,
            require_theme_prefix: true,
        }
    }
}

impl ThemeConfig {
    /// Theme URL with the site URL removed.
    ///
    /// Falls back to the path of the theme URL when it is not under the site URL.
    pub fn theme_url_prefix(&self) -> String {
        let site = self.site_url.trim_end_matches('/');
        if let Some(rest) = self.theme_url.strip_prefix(site) {
            if rest.is_empty() || rest.starts_with('/') {
                return rest.trim_end_matches('/').to_string();
            }
        }
        match url::Url::parse(&self.theme_url) {
            Ok(url) => url.path().trim_end_matches('/').to_string(),
            Err(_) => self.theme_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn assets_path(&self) -> PathBuf {
        self.assets_directory
            .clone()
            .unwrap_or_else(|| self.template_path("theme/assets"))
    }

    pub fn temp_path(&self) -> PathBuf {
        self.cache_directory
            .clone()
            .unwrap_or_else(|| self.template_path("tmp"))
    }

    pub fn stylesheets_path(&self) -> PathBuf {
        join(&self.assets_path(), "stylesheets")
    }

    pub fn javascripts_path(&self) -> PathBuf {
        join(&self.assets_path(), "javascripts")
    }

    fn template_path(&self, relative: &str) -> PathBuf {
        join(&self.template_directory, relative)
    }
}

fn join(base: &Path, relative: &str) -> PathBuf {
    PathBuf::from(join_paths(&[&*base.to_string_lossy(), relative]))
}

/// Host rewrite rules and recognized parameters.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Parameters the host keeps after parsing a request.
    pub query_vars: Vec<String>,

    /// Host rewrite rules, evaluated after the asset rules.
    pub rewrite: Vec<RewriteRuleConfig>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            query_vars: ["p", "page_id", "name", "pagename", "s", "paged"]
                .into_iter()
                .map(String::from)
                .collect(),
            rewrite: Vec::new(),
        }
    }
}

/// A host rewrite rule (`pattern` is a regex, `target` like `index?name=$1`).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct RewriteRuleConfig {
    pub pattern: String,
    pub target: String,
}

/// Build step settings.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
    /// Maximum time a single compile may take, in seconds.
    pub timeout_secs: u64,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
