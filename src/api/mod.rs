mod auth;
mod error;
mod graph;
mod movies;

use axum::{Json, Router, routing::get};
use serde::Serialize;
use std::sync::Arc;

use crate::db::Database;
use crate::rate_limit::RateLimitConfig;
use crate::session::SessionConfig;

pub use auth::AuthState;
pub use error::{ApiError, JsonMessage, ResultExt};
pub use graph::GraphState;
pub use movies::CatalogState;

#[derive(Serialize)]
struct Status {
    status: &'static str,
    message: &'static str,
    version: &'static str,
}

async fn home() -> Json<Status> {
    Json(Status {
        status: "active",
        message: "Marquee up and running",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Create the API router.
pub fn create_api_router(
    db: Database,
    session: Arc<SessionConfig>,
    rate_limit_config: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = AuthState {
        db: db.clone(),
        session: session.clone(),
        rate_limit_config,
    };

    let graph_state = GraphState {
        schema: graph::schema(db.clone()),
    };

    let catalog_state = CatalogState { db, session };

    Router::new()
        .route("/", get(home))
        .merge(auth::router(auth_state))
        .merge(movies::router(catalog_state.clone()))
        .merge(graph::router(graph_state))
        .nest("/admin", movies::admin_router(catalog_state))
}
