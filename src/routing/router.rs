//! Request dispatch to preprocessors.
//!
//! # States
//! ```text
//! UNMATCHED ──(flag param truthy for preprocessor P)──▶ MATCHED(P) ──▶ response
//!     │
//!     └──(no flag present)──▶ PassThrough (request untouched)
//! ```
//!
//! # Design Decisions
//! - Registration order is match order; the first truthy flag wins
//! - Pass-through does no logging, metrics or path work
//! - Once matched the router always produces the response (no fallthrough)

use std::sync::Arc;
use std::time::Instant;

use axum::response::{IntoResponse, Response};

use super::resolver::{resolve, ThemeLayout};
use crate::build::Builder;
use crate::host::ParsedRequest;
use crate::observability::metrics;
use crate::preprocessor::{Preprocessor, Registry};

/// Outcome of dispatching one parsed request.
#[derive(Debug)]
pub enum Dispatch {
    /// No preprocessor claimed the request; the host continues normally.
    PassThrough,
    /// A preprocessor handled the request; this is the complete response.
    Handled(Response),
}

impl Dispatch {
    pub fn is_handled(&self) -> bool {
        matches!(self, Dispatch::Handled(_))
    }
}

/// Routes parsed requests to the registered preprocessors.
#[derive(Debug)]
pub struct RequestRouter {
    registry: Arc<Registry>,
    layout: ThemeLayout,
    builder: Builder,
}

impl RequestRouter {
    pub fn new(registry: Arc<Registry>, layout: ThemeLayout, builder: Builder) -> Self {
        Self {
            registry,
            layout,
            builder,
        }
    }

    pub fn layout(&self) -> &ThemeLayout {
        &self.layout
    }

    /// First preprocessor, in registration order, whose flag parameter is set.
    pub fn match_request(&self, request: &ParsedRequest) -> Option<&Arc<dyn Preprocessor>> {
        self.registry
            .iter()
            .find(|p| request.is_truthy(&p.query_var_name(None)))
    }

    /// Handle `request` if a preprocessor claims it.
    pub async fn dispatch(&self, request: &ParsedRequest) -> Dispatch {
        let Some(preprocessor) = self.match_request(request) else {
            return Dispatch::PassThrough;
        };

        let start = Instant::now();
        let original_url = request.get(&preprocessor.params().url).unwrap_or_default();

        let response = match resolve(original_url, &self.layout, preprocessor.to_extension()) {
            Ok(paths) => {
                tracing::debug!(
                    preprocessor = preprocessor.name(),
                    url = original_url,
                    source = %paths.source_file_path.display(),
                    output = %paths.compiled_output_path.display(),
                    "Asset request matched"
                );
                match self
                    .builder
                    .process_file_with_caching(preprocessor.as_ref(), &paths)
                    .await
                {
                    Ok(response) => response,
                    Err(e) => {
                        tracing::error!(
                            preprocessor = preprocessor.name(),
                            url = original_url,
                            kind = e.kind(),
                            error = %e,
                            "Asset build failed"
                        );
                        e.into_response()
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    preprocessor = preprocessor.name(),
                    url = original_url,
                    error = %e,
                    "Rejected asset request"
                );
                e.into_response()
            }
        };

        metrics::record_asset_request(preprocessor.name(), response.status().as_u16(), start);
        Dispatch::Handled(response)
    }
}
