//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the axum Router: existing files first, then the preprocess middleware, then static files
//! - Wire up middleware (timeout, request ID, tracing)
//! - Serve with graceful shutdown
//! - Apply configuration updates to the live routing table and preferences

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::{Request, State},
    http,
    middleware::{self, Next},
    response::Response,
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::build::Builder;
use crate::config::AppConfig;
use crate::host::{RoutingTable, RoutingTableError, StaticFiles};
use crate::http::request::{request_id, MakeRequestUuid};
use crate::preferences::Preferences;
use crate::preprocessor::Registry;
use crate::routing::{Dispatch, RequestRouter, ThemeLayout};

/// Application state injected into the preprocess middleware.
#[derive(Clone)]
pub struct AppState {
    /// Live routing table, replaced on config reload.
    pub routing_table: Arc<ArcSwap<RoutingTable>>,
    /// Existing files under the theme, served before any rewriting.
    pub static_files: Arc<StaticFiles>,
    pub router: Arc<RequestRouter>,
    pub registry: Arc<Registry>,
    pub preferences: Arc<Preferences>,
}

/// HTTP server for the theme directory.
pub struct HttpServer {
    router: Router,
    config: AppConfig,
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and preprocessors.
    pub fn new(
        config: AppConfig,
        registry: Arc<Registry>,
        preferences: Arc<Preferences>,
    ) -> Result<Self, RoutingTableError> {
        let table = RoutingTable::build(&config.host, &registry)?;
        let layout = ThemeLayout::from_config(&config.theme);
        let router = RequestRouter::new(registry.clone(), layout, Builder::new(&config.build));

        let state = AppState {
            routing_table: Arc::new(ArcSwap::from_pointee(table)),
            static_files: Arc::new(StaticFiles::from_config(&config.theme)),
            router: Arc::new(router),
            registry,
            preferences,
        };

        let router = Self::build_router(&config, state.clone());
        Ok(Self {
            router,
            config,
            state,
        })
    }

    /// Build the axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AppConfig, state: AppState) -> Router {
        let prefix = state.router.layout().theme_url_prefix.clone();
        let files = ServeDir::new(&config.theme.template_directory);
        let app = if prefix.is_empty() {
            Router::new().fallback_service(files)
        } else {
            Router::new().nest_service(&prefix, files)
        };

        app.layer(middleware::from_fn_with_state(state, preprocess))
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(TraceLayer::new_for_http().make_span_with(|request: &http::Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = request_id(request.headers()).unwrap_or("unknown"),
                )
            }))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The configured router, for serving or driving in tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// Configuration updates received on `config_updates` are applied until
    /// `shutdown` fires; in-flight requests are then drained.
    pub async fn run(
        self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<AppConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            preprocessors = ?self.state.registry.extensions(),
            "HTTP server starting"
        );

        let state = self.state.clone();
        let mut current = self.config.clone();
        let reloader = tokio::spawn(async move {
            while let Some(update) = config_updates.recv().await {
                if apply_config_update(&state, &current, &update).is_ok() {
                    current = update;
                }
            }
        });

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        reloader.abort();
        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }
}

/// Serve existing files directly; hand every other request to the preprocessor router.
async fn preprocess(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.static_files.exists(request.uri().path()).await {
        tracing::trace!(path = request.uri().path(), "Existing file; skipping rewrite rules");
        return next.run(request).await;
    }

    let parsed = state
        .routing_table
        .load()
        .parse_request(request.uri().path(), request.uri().query());

    match state.router.dispatch(&parsed).await {
        Dispatch::Handled(response) => response,
        Dispatch::PassThrough => next.run(request).await,
    }
}

/// Swap in a routing table and preferences built from `update`.
///
/// On error the current table stays live. Settings that are only read at
/// startup are reported, not applied.
pub fn apply_config_update(
    state: &AppState,
    current: &AppConfig,
    update: &AppConfig,
) -> Result<(), RoutingTableError> {
    let table = RoutingTable::build(&update.host, &state.registry).map_err(|e| {
        tracing::error!(error = %e, "Rejected config update; keeping current routing table");
        e
    })?;
    state.routing_table.store(Arc::new(table));
    state.preferences.extend(update.preferences.clone());

    let restart_needed = [
        ("listener", current.listener != update.listener),
        ("theme", current.theme != update.theme),
        ("preprocessors", current.preprocessors != update.preprocessors),
        ("build", current.build != update.build),
        ("timeouts", current.timeouts != update.timeouts),
        ("observability", current.observability != update.observability),
    ];
    for (section, changed) in restart_needed {
        if changed {
            tracing::warn!(section, "Config section changed; restart to apply");
        }
    }

    tracing::info!(
        rules = update.host.rewrite.len(),
        preferences = update.preferences.len(),
        "Config update applied"
    );
    Ok(())
}
