//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, layers)
//!     → request.rs (request ID, trace span)
//!     → preprocess middleware (host::RoutingTable → routing::RequestRouter)
//!         Handled     → response.rs (errors to status codes) → client
//!         PassThrough → static files from the theme directory
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{request_id, MakeRequestUuid, X_REQUEST_ID};
pub use server::{AppState, HttpServer};
