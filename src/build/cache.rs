//! Build entry point: compile on cache miss, serve the cached result otherwise.

use std::io;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
};

use super::freshness::{cache_file, cache_key, locate_source, output_id, prune_stale, write_atomic};
use super::locks::PathLocks;
use super::BuildError;
use crate::config::BuildConfig;
use crate::observability::metrics;
use crate::preprocessor::{CompileOptions, Preprocessor};
use crate::routing::resolver::ResolvedPaths;

/// Response header reporting whether the compiler ran.
pub const CACHE_STATUS_HEADER: HeaderName = HeaderName::from_static("x-preprocessor-cache");

/// Whether a response was served from the cache directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// Shared build state: per-output locks and build limits.
#[derive(Debug, Clone)]
pub struct Builder {
    locks: PathLocks,
    timeout: Duration,
}

impl Builder {
    pub fn new(config: &BuildConfig) -> Self {
        Self {
            locks: PathLocks::new(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Override the build timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Produce the full response for `paths`, compiling only when the cache is stale.
    ///
    /// At most one build runs per compiled output path; a request arriving
    /// while another builds the same path waits and then hits the fresh cache.
    pub async fn process_file_with_caching(
        &self,
        preprocessor: &dyn Preprocessor,
        paths: &ResolvedPaths,
    ) -> Result<Response, BuildError> {
        let source = locate_source(&paths.source_file_path, preprocessor.supported_extensions()).await?;

        let _guard = self.locks.acquire(&paths.compiled_output_path).await;

        let options = preprocessor.options();
        let contents = tokio::fs::read(&source).await?;
        let key = cache_key(preprocessor.name(), &options, &source, &contents);
        let output_id = output_id(&paths.compiled_output_path);
        let cached = cache_file(&paths.cache_directory, &output_id, &key, preprocessor.to_extension());

        let (body, status) = match tokio::fs::read(&cached).await {
            Ok(bytes) => (bytes, CacheStatus::Hit),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let bytes = self.compile(preprocessor, &options, &source, paths).await?;
                write_atomic(&cached, &bytes).await?;
                match prune_stale(&paths.cache_directory, &output_id, &cached).await {
                    Ok(0) => {}
                    Ok(removed) => tracing::debug!(
                        output = %paths.compiled_output_path.display(),
                        removed,
                        "Pruned stale cache entries"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Failed to prune stale cache entries"),
                }
                (bytes, CacheStatus::Miss)
            }
            Err(e) => return Err(e.into()),
        };

        metrics::record_cache(preprocessor.name(), status);
        tracing::debug!(
            preprocessor = preprocessor.name(),
            source = %source.display(),
            cache = status.as_str(),
            bytes = body.len(),
            "Serving compiled asset"
        );

        Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, preprocessor.content_type()),
                (header::CACHE_CONTROL, "no-cache"),
                (CACHE_STATUS_HEADER, status.as_str()),
            ],
            Body::from(body),
        )
            .into_response())
    }

    async fn compile(
        &self,
        preprocessor: &dyn Preprocessor,
        options: &CompileOptions,
        source: &std::path::Path,
        paths: &ResolvedPaths,
    ) -> Result<Vec<u8>, BuildError> {
        let start = Instant::now();
        let result = match tokio::time::timeout(self.timeout, preprocessor.compile(source, options)).await {
            Ok(result) => result,
            Err(_) => Err(BuildError::Timeout {
                output: paths.compiled_output_path.clone(),
                after: self.timeout,
            }),
        };
        metrics::record_build(preprocessor.name(), result.is_ok(), start);

        if result.is_ok() {
            tracing::info!(
                preprocessor = preprocessor.name(),
                source = %source.display(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Compiled asset"
            );
        }
        result
    }
}
