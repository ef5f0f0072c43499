#![allow(dead_code)]

use axum::{
    Extension, Router,
    body::Body,
    extract::ConnectInfo,
    http::{HeaderValue, Request, Response, header},
};
use marquee::{
    ServerConfig, create_app, db::Database, rate_limit::RateLimitConfig, session::SessionConfig,
};
use std::net::SocketAddr;
use tower::ServiceExt;

pub const SECRET: &[u8] = b"test-jwt-secret-test-jwt-secret!";
pub const ISSUER: &str = "example.com";
pub const AUDIENCE: &str = "example.com";
pub const EMAIL: &str = "a@b.com";
pub const PASSWORD: &str = "correct";
pub const USER_ID: i64 = 7;

pub fn session_config() -> SessionConfig {
    SessionConfig::new(SECRET, ISSUER, AUDIENCE)
}

pub struct TestApp {
    pub app: Router,
    pub db: Database,
    pub session: SessionConfig,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig::new()).await
    }

    pub async fn with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let db = Database::open(":memory:")
            .await
            .expect("Failed to open test database");

        let hash = bcrypt::hash(PASSWORD, 4).expect("Failed to hash password");
        sqlx::query(
            "INSERT INTO users (id, email, first_name, last_name, password) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(USER_ID)
        .bind(EMAIL)
        .bind("Ada")
        .bind("Lovelace")
        .bind(&hash)
        .execute(db.pool())
        .await
        .expect("Failed to insert test user");

        let session = session_config();
        let config = ServerConfig {
            db: db.clone(),
            session: session.clone(),
            allowed_origins: vec![HeaderValue::from_static("http://localhost:3000")],
            rate_limit,
        };
        let app = create_app(&config).layer(Extension(ConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000)))));

        Self { app, db, session }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    pub async fn login(&self, email: &str, password: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/authenticate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "email": email, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
    }

    /// Log in as the seeded user and return the body's access token and the refresh cookie value.
    pub async fn login_ok(&self) -> (String, String) {
        let response = self.login(EMAIL, PASSWORD).await;
        let cookie = refresh_cookie_value(&response, self.session.cookie_name())
            .expect("Login should set the refresh cookie");
        let json = body_json(response).await;
        let access = json["access_token"].as_str().unwrap().to_string();
        (access, cookie)
    }
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

/// All Set-Cookie header values of a response.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// The Set-Cookie header for the given cookie name.
pub fn set_cookie_for(response: &Response<Body>, name: &str) -> Option<String> {
    let prefix = format!("{}=", name);
    set_cookies(response)
        .into_iter()
        .find(|c| c.starts_with(&prefix))
}

/// The value carried by the Set-Cookie header for the given cookie name.
pub fn refresh_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    let header = set_cookie_for(response, name)?;
    let pair = header.split(';').next()?;
    pair.split_once('=').map(|(_, value)| value.to_string())
}
