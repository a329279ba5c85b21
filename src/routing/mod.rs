//! Asset routing subsystem.
//!
//! # Data Flow
//! ```text
//! Routing table build (startup / reload):
//!     Registry
//!     → rules.rs (one top-priority rewrite per preprocessor)
//!     → query_vars.rs (flag + url params added to the allow-list)
//!
//! Incoming request:
//!     host::RoutingTable::parse_request → ParsedRequest
//!     → router.rs (find preprocessor by flag param)
//!     → resolver.rs (URL → source / output / cache paths)
//!     → build::Builder (compile or serve cached)
//! ```
//!
//! # Design Decisions
//! - Registry and rules are immutable after construction (no locks on the hot path)
//! - Deterministic: same request always matches the same preprocessor
//! - First match wins (registration order)

pub mod query_vars;
pub mod resolver;
pub mod router;
pub mod rules;

pub use resolver::{join_paths, resolve, PathResolutionError, ResolvedPaths, ThemeLayout};
pub use router::{Dispatch, RequestRouter};
