//! Startup orchestration.
//!
//! # Responsibilities
//! - Seed preferences from configuration
//! - Instantiate and register the configured preprocessors
//! - Build the HTTP server (routing table, router, static files)
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::host::RoutingTableError;
use crate::http::HttpServer;
use crate::preferences::Preferences;
use crate::preprocessor::{Registry, RegistryError};

/// Configuration problems that prevent the server from starting.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("preprocessor registration failed: {0}")]
    Registry(#[from] RegistryError),

    #[error("routing table build failed: {0}")]
    RoutingTable(#[from] RoutingTableError),
}

/// Instantiate and register every configured preprocessor kind, in order.
pub fn build_registry(
    config: &AppConfig,
    preferences: &Arc<Preferences>,
) -> Result<Registry, RegistryError> {
    Registry::builder()
        .register_all(
            config
                .preprocessor_kinds()
                .into_iter()
                .map(|kind| kind.instantiate(preferences.clone())),
        )
        .build()
}

/// Build a ready-to-run server from `config`.
pub fn initialize(config: AppConfig) -> Result<HttpServer, StartupError> {
    let preferences = Arc::new(Preferences::from_entries(config.preferences.clone()));
    let registry = Arc::new(build_registry(&config, &preferences)?);

    tracing::info!(
        preprocessors = ?registry.extensions(),
        template_directory = %config.theme.template_directory.display(),
        assets_directory = %config.theme.assets_path().display(),
        stylesheets = %config.theme.stylesheets_path().display(),
        javascripts = %config.theme.javascripts_path().display(),
        cache_directory = %config.theme.temp_path().display(),
        theme_url_prefix = %config.theme.theme_url_prefix(),
        "Theme layout"
    );

    Ok(HttpServer::new(config, registry, preferences)?)
}
