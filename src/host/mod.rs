//! Host request pipeline.
//!
//! The generic machinery the preprocessor router plugs into.
//!
//! # Data Flow
//! ```text
//! Routing table (re)build, at startup and on config reload:
//!     [host] rewrite rules        → Priority::Bottom
//!     routing::rules (per preprocessor) → Priority::Top
//!     [host] query_vars + routing::query_vars → allow-list
//!     → RoutingTable (immutable, swapped atomically)
//!
//! Per request:
//!     path names an existing file under the theme → files.rs, served unchanged
//!     otherwise path + query string
//!     → table.rs parse_request (decode, rewrite, merge, filter)
//!     → ParsedRequest handed to routing::router
//! ```

pub mod files;
pub mod rewrite;
pub mod table;

pub use files::StaticFiles;
pub use rewrite::{Priority, RewriteRule, RewriteTable};
pub use table::{ParsedRequest, RoutingTable, RoutingTableError};
