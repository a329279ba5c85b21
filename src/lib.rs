//! Asset preprocessor service.
//!
//! Serves a theme directory over HTTP and compiles stylesheet and script
//! sources on demand: a request for `app.css` is answered by compiling
//! `app.scss` (or `app.sass`), a request for `app.js` by compiling `app.coffee`.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http::server ──▶ host::RoutingTable ──▶ routing::RequestRouter
//!                     (request id,     (rewrite rules,          │ no flag: PassThrough
//!                      tracing,         query vars)             │        → static files
//!                      timeout)                                 ▼
//!                                                     routing::resolver (URL → paths)
//!                                                               │
//!                                                               ▼
//!     Client Response                                 build::Builder
//!     ◀───────────────────────────────────────────── (cache, locks, timeout)
//!                                                               │
//!                                                               ▼
//!                                                     preprocessor::{stylesheet, script}
//!                                                     (external compilers)
//!
//!     Cross-cutting: config (TOML + hot reload), preferences,
//!                    observability (tracing, metrics), lifecycle
//! ```

// Core subsystems
pub mod build;
pub mod host;
pub mod preferences;
pub mod preprocessor;
pub mod routing;

// Serving
pub mod http;

// Cross-cutting concerns
pub mod config;
pub mod lifecycle;
pub mod observability;

pub use config::AppConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use preferences::Preferences;
pub use preprocessor::{Preprocessor, PreprocessorKind, Registry};
