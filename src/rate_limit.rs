//! Rate limiting for the login endpoint.
//!
//! Token bucket per client IP, taken from the connection's peer address.

use axum::{
    Json,
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{Quota, RateLimiter, clock::DefaultClock, state::keyed::DefaultKeyedStateStore};
use std::{net::IpAddr, net::SocketAddr, num::NonZeroU32, sync::Arc};

use crate::api::JsonMessage;

pub type IpLimiter = RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>;

const LOGIN_PER_SEC: NonZeroU32 = NonZeroU32::new(1).unwrap();
const LOGIN_BURST: NonZeroU32 = NonZeroU32::new(5).unwrap();

#[derive(Clone)]
pub struct RateLimitConfig {
    /// 5 attempts, then one per second
    pub login: Arc<IpLimiter>,
}

impl RateLimitConfig {
    pub fn new() -> Self {
        Self::with_quota(Quota::per_second(LOGIN_PER_SEC).allow_burst(LOGIN_BURST))
    }

    pub fn with_quota(quota: Quota) -> Self {
        Self {
            login: Arc::new(RateLimiter::keyed(quota)),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn client_ip(request: &Request) -> Option<IpAddr> {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip())
}

/// Middleware for rate limiting login attempts.
pub async fn rate_limit_login(
    State(config): State<Arc<RateLimitConfig>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ip) = client_ip(&request) else {
        return (
            StatusCode::FORBIDDEN,
            Json(JsonMessage::error("unable to determine client ip")),
        )
            .into_response();
    };

    match config.login.check_key(&ip) {
        Ok(_) => next.run(request).await,
        Err(_) => {
            tracing::warn!(ip = %ip, "Login rate limit exceeded");
            (
                StatusCode::TOO_MANY_REQUESTS,
                Json(JsonMessage::error(
                    "too many authentication attempts, please wait before trying again",
                )),
            )
                .into_response()
        }
    }
}
