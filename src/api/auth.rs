//! Session endpoints.
//!
//! - POST `/authenticate` - Check credentials, return a token pair and set the refresh cookie
//! - GET `/refresh` - Rotate the pair from the refresh cookie
//! - GET `/logout` - Clear the refresh cookie

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use std::sync::Arc;
use time::OffsetDateTime;

use crate::db::Database;
use crate::impl_has_session_config;
use crate::rate_limit::{RateLimitConfig, rate_limit_login};
use crate::session::{self, AuthError, SessionConfig, SessionCoordinator, TokenPair};

#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub session: Arc<SessionConfig>,
    pub rate_limit_config: Arc<RateLimitConfig>,
}

impl_has_session_config!(AuthState);

pub fn router(state: AuthState) -> Router {
    let login_router = Router::new()
        .route("/authenticate", post(authenticate))
        .with_state(state.clone())
        .layer(middleware::from_fn_with_state(
            state.rate_limit_config.clone(),
            rate_limit_login,
        ));

    Router::new()
        .route("/refresh", get(refresh))
        .route("/logout", get(logout))
        .with_state(state)
        .merge(login_router)
}

#[derive(Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

async fn authenticate(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(StatusCode, CookieJar, Json<TokenPair>), AuthError> {
    let users = state.db.users();
    let session = SessionCoordinator::new(&state.session, &users)
        .login(&payload.email, &payload.password, OffsetDateTime::now_utc())
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        jar.add(session.cookie.into_cookie()),
        Json(session.pair),
    ))
}

async fn refresh(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<TokenPair>), AuthError> {
    let users = state.db.users();
    let refresh_cookie = jar
        .get(state.session.cookie_name())
        .map(|c| c.value().to_string());

    let session = SessionCoordinator::new(&state.session, &users)
        .refresh(refresh_cookie.as_deref(), OffsetDateTime::now_utc())
        .await?;

    Ok((jar.add(session.cookie.into_cookie()), Json(session.pair)))
}

async fn logout(State(state): State<AuthState>, jar: CookieJar) -> impl IntoResponse {
    let cookie = session::expired(&state.session);
    (StatusCode::ACCEPTED, jar.add(cookie.into_cookie()))
}
