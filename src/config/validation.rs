//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect duplicate preprocessors and broken rewrite patterns
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use regex::Regex;
use thiserror::Error;

use crate::config::schema::AppConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    InvalidBindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    InvalidMetricsAddress(String),

    #[error("theme.template_directory must not be empty")]
    EmptyTemplateDirectory,

    #[error("theme.theme_url must not be empty")]
    EmptyThemeUrl,

    #[error("preprocessor `{0}` is listed more than once")]
    DuplicatePreprocessor(String),

    #[error("host.rewrite pattern `{0}` is not a valid regex")]
    InvalidRewritePattern(String),

    #[error("{0} must be greater than zero")]
    ZeroTimeout(&'static str),
}

/// Check `config` and report every problem found.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.theme.template_directory.as_os_str().is_empty() {
        errors.push(ValidationError::EmptyTemplateDirectory);
    }
    if config.theme.theme_url.trim().is_empty() {
        errors.push(ValidationError::EmptyThemeUrl);
    }

    let mut seen = HashSet::new();
    for kind in &config.preprocessors {
        if !seen.insert(kind) {
            errors.push(ValidationError::DuplicatePreprocessor(kind.to_string()));
        }
    }

    for rule in &config.host.rewrite {
        if Regex::new(&rule.pattern).is_err() {
            errors.push(ValidationError::InvalidRewritePattern(rule.pattern.clone()));
        }
    }

    if config.build.timeout_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("build.timeout_secs"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("timeouts.request_secs"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
