//! # beacon-server
//!
//! axum REST API behind the Beacon admin dashboard.
//!
//! Every `/api/admin/*` route authenticates a bearer token, resolves the
//! caller's admin row, and works on a [`BeaconService`] scoped to that
//! admin's company. Survey respondents use the unauthenticated
//! `/api/surveys/respond/{token}` routes.

pub mod error;
pub mod extract;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::routing::get;
use tower::ServiceBuilder;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use beacon_analysis::Analyzer;
use beacon_auth::TokenVerifier;
use beacon_config::ServerConfig;
use beacon_db::BeaconService;

pub use error::{ApiError, ApiResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Unscoped service; handlers get scoped views through the extractors.
    pub service: BeaconService,
    pub verifier: Arc<TokenVerifier>,
    pub analyzer: Option<Arc<dyn Analyzer>>,
}

impl AppState {
    #[must_use]
    pub fn new(service: BeaconService, verifier: TokenVerifier) -> Self {
        Self {
            service: service.unscoped(),
            verifier: Arc::new(verifier),
            analyzer: None,
        }
    }

    #[must_use]
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub(crate) fn analyzer(&self) -> ApiResult<&dyn Analyzer> {
        self.analyzer
            .as_deref()
            .ok_or_else(|| ApiError::Unavailable("analysis service is not configured".into()))
    }
}

fn build_cors_layer(config: &ServerConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    if config.is_permissive_cors() {
        cors.allow_origin(AllowOrigin::any())
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Build the full application router.
pub fn create_app(state: AppState, config: &ServerConfig) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api/admin", routes::admin_router())
        .nest("/api/surveys", routes::public_router())
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(config.request_timeout_secs),
                ))
                .layer(build_cors_layer(config)),
        )
}

async fn health_check() -> &'static str {
    "OK"
}

/// Serve `app` on `addr` until Ctrl-C.
///
/// # Errors
///
/// Returns the I/O error if the listener cannot bind or the server fails.
pub async fn serve(app: Router, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "beacon listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
