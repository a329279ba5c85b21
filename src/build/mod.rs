//! Caching build step.
//!
//! # Data Flow
//! ```text
//! ResolvedPaths (source stem, compiled output, cache dir)
//!     → freshness.rs (locate source, content-hash cache key)
//!     → locks.rs (one build per compiled output path)
//!     → cache hit: read <cache_dir>/<key>.<ext>
//!     → cache miss: Preprocessor::compile under timeout, write cache atomically
//!     → HTTP response with the preprocessor's content type
//! ```
//!
//! # Design Decisions
//! - Cache keys hash source content, not mtime
//! - Locks are keyed by compiled output path, matching where writes land
//! - Timeouts drop the compile future, which kills the compiler process

pub mod cache;
pub mod freshness;
pub mod locks;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use axum::http::StatusCode;
use thiserror::Error;

pub use cache::{Builder, CacheStatus, CACHE_STATUS_HEADER};
pub use locks::PathLocks;

/// Failures of the build delegate.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no source for {} (tried: {})", .stem.display(), .tried.join(", "))]
    SourceNotFound { stem: PathBuf, tried: Vec<String> },

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` exited with status {}: {stderr}", .status.map_or_else(|| "signal".to_string(), |c| c.to_string()))]
    Compiler {
        program: String,
        status: Option<i32>,
        stderr: String,
    },

    #[error("build of {} timed out after {:?}", .output.display(), .after)]
    Timeout { output: PathBuf, after: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl BuildError {
    /// HTTP status reported to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            BuildError::SourceNotFound { .. } => StatusCode::NOT_FOUND,
            BuildError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            BuildError::Spawn { .. } | BuildError::Compiler { .. } | BuildError::Io(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Short label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BuildError::SourceNotFound { .. } => "source_not_found",
            BuildError::Spawn { .. } => "spawn",
            BuildError::Compiler { .. } => "compiler",
            BuildError::Timeout { .. } => "timeout",
            BuildError::Io(_) => "io",
        }
    }
}
