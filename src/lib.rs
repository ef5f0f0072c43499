pub mod api;
pub mod cli;
pub mod db;
pub mod jwt;
pub mod rate_limit;
pub mod session;

use api::create_api_router;
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
};
use db::Database;
use rate_limit::RateLimitConfig;
use session::SessionConfig;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub struct ServerConfig {
    /// Database connection (cloneable, uses connection pool internally)
    pub db: Database,
    /// Token signing and refresh cookie settings
    pub session: SessionConfig,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<HeaderValue>,
    /// Login attempt limiter
    pub rate_limit: RateLimitConfig,
}

fn cors_layer(allowed_origins: &[HeaderValue]) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(allowed_origins.to_vec())
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
        ])
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let session = Arc::new(config.session.clone());

    create_api_router(
        config.db.clone(),
        session,
        Arc::new(config.rate_limit.clone()),
    )
    .layer(cors_layer(&config.allowed_origins))
    .layer(TraceLayer::new_for_http())
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    let make_service = app.into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, make_service).await
}
