//! CLI argument parsing, validation, and startup helpers.

use crate::ServerConfig;
use crate::db::Database;
use crate::rate_limit::RateLimitConfig;
use crate::session::SessionConfig;
use axum::http::HeaderValue;
use clap::Parser;
use time::Duration;
use tracing::{error, info};

const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(clap::ValueEnum, Clone, Debug, Default)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
    Compact,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "Marquee", about = "Movie catalog backend with JWT sessions")]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, default_value = "8080")]
    pub port: u16,

    /// Path to SQLite database file
    #[arg(short, long, default_value = "marquee.db")]
    pub database: String,

    /// Path to file containing JWT secret. Prefer using JWT_SECRET env var instead
    #[arg(long)]
    pub jwt_secret_file: Option<String>,

    /// Value of the `iss` claim
    #[arg(long, default_value = "example.com")]
    pub jwt_issuer: String,

    /// Value of the `aud` claim
    #[arg(long, default_value = "example.com")]
    pub jwt_audience: String,

    /// Name of the refresh token cookie
    #[arg(long, default_value = crate::session::DEFAULT_COOKIE_NAME)]
    pub cookie_name: String,

    /// Path attribute of the refresh token cookie
    #[arg(long, default_value = "/")]
    pub cookie_path: String,

    /// Domain attribute of the refresh token cookie (not allowed with a __Host- name)
    #[arg(long)]
    pub cookie_domain: Option<String>,

    /// Access token lifetime in seconds
    #[arg(long, default_value = "900")]
    pub access_ttl: i64,

    /// Refresh token lifetime in seconds
    #[arg(long, default_value = "86400")]
    pub refresh_ttl: i64,

    /// Origin allowed to make credentialed requests (repeatable)
    #[arg(long = "allowed-origin", default_value = "http://localhost:3000", value_parser = parse_origin)]
    pub allowed_origins: Vec<HeaderValue>,

    /// Create a user with this email and exit. Password is read from MARQUEE_USER_PASSWORD
    #[arg(long, value_name = "EMAIL")]
    pub create_user: Option<String>,

    #[arg(long, default_value = "")]
    pub first_name: String,

    #[arg(long, default_value = "")]
    pub last_name: String,

    /// Log output format
    #[arg(short, long, default_value = "pretty")]
    pub log_format: LogFormat,
}

fn parse_origin(s: &str) -> Result<HeaderValue, String> {
    if !(s.starts_with("http://") || s.starts_with("https://")) {
        return Err(format!("Origin must start with http:// or https://: {}", s));
    }
    if s.ends_with('/') {
        return Err(format!("Origin must not end with '/': {}", s));
    }
    HeaderValue::from_str(s).map_err(|e| format!("Invalid origin {}: {}", s, e))
}

/// Initialize logging based on the specified format.
pub fn init_logging(format: &LogFormat) {
    match format {
        LogFormat::Pretty => tracing_subscriber::fmt::init(),
        LogFormat::Json => tracing_subscriber::fmt().json().init(),
        LogFormat::Compact => tracing_subscriber::fmt().compact().init(),
    }
}

/// Load JWT secret from environment variable or file.
/// Returns None and logs an error if the secret cannot be loaded.
/// Must be called before any thread is spawned.
pub fn load_jwt_secret(jwt_secret_file: Option<&str>) -> Option<String> {
    let secret = if let Ok(secret) = std::env::var("JWT_SECRET") {
        // SAFETY: `main` calls this before building the tokio runtime, while
        // the process is still single-threaded.
        unsafe { std::env::remove_var("JWT_SECRET") };
        secret
    } else if let Some(path) = jwt_secret_file {
        match std::fs::read_to_string(path) {
            Ok(content) => content.trim().to_string(),
            Err(e) => {
                error!(path = %path, error = %e, "Failed to read JWT secret file");
                return None;
            }
        }
    } else {
        error!(
            "JWT secret is required. Set JWT_SECRET environment variable (recommended) or use --jwt-secret-file"
        );
        return None;
    };

    if secret.len() < MIN_JWT_SECRET_LENGTH {
        error!(
            "JWT secret is shorter than {} characters. Use a longer secret",
            MIN_JWT_SECRET_LENGTH
        );
        return None;
    }

    Some(secret)
}

/// Build and validate the session configuration.
/// Returns None and logs an error if validation fails.
pub fn build_session_config(args: &Args, jwt_secret: &str) -> Option<SessionConfig> {
    let config = SessionConfig::new(
        jwt_secret.as_bytes(),
        args.jwt_issuer.clone(),
        args.jwt_audience.clone(),
    )
    .with_ttls(
        Duration::seconds(args.access_ttl),
        Duration::seconds(args.refresh_ttl),
    )
    .with_cookie(
        args.cookie_name.clone(),
        args.cookie_path.clone(),
        args.cookie_domain.clone(),
    );

    match config.validate() {
        Ok(()) => Some(config),
        Err(e) => {
            error!(error = %e, "Invalid session configuration");
            None
        }
    }
}

/// Build ServerConfig from validated arguments.
pub fn build_config(
    db: Database,
    session: SessionConfig,
    allowed_origins: Vec<HeaderValue>,
) -> ServerConfig {
    ServerConfig {
        db,
        session,
        allowed_origins,
        rate_limit: RateLimitConfig::new(),
    }
}

/// Open the database, logging errors if it fails.
pub async fn open_database(path: &str) -> Option<Database> {
    match Database::open(path).await {
        Ok(db) => {
            info!(path = %path, "Database opened");
            Some(db)
        }
        Err(e) => {
            error!(path = %path, error = %e, "Failed to open database");
            None
        }
    }
}

/// Read and remove MARQUEE_USER_PASSWORD for --create-user.
/// Returns None and logs an error if it is unset or empty.
/// Must be called before any thread is spawned.
pub fn load_user_password() -> Option<String> {
    let password = std::env::var("MARQUEE_USER_PASSWORD").ok();
    if password.is_some() {
        // SAFETY: `main` calls this before building the tokio runtime, while
        // the process is still single-threaded.
        unsafe { std::env::remove_var("MARQUEE_USER_PASSWORD") };
    }
    check_user_password(password)
}

fn check_user_password(password: Option<String>) -> Option<String> {
    match password {
        None => {
            error!("Set MARQUEE_USER_PASSWORD to the new user's password");
            None
        }
        Some(p) if p.is_empty() => {
            error!("MARQUEE_USER_PASSWORD must not be empty");
            None
        }
        Some(p) => Some(p),
    }
}

/// Handle the --create-user flag: hash the password and insert the user.
pub async fn handle_create_user(
    db: &Database,
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) {
    let password = password.to_string();
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, bcrypt::DEFAULT_COST)).await;
    let hash = match hashed {
        Ok(Ok(hash)) => hash,
        Ok(Err(e)) => {
            error!(error = %e, "Failed to hash password");
            std::process::exit(1);
        }
        Err(e) => {
            error!(error = %e, "Password hashing task failed");
            std::process::exit(1);
        }
    };

    match db.users().create(email, first_name, last_name, &hash).await {
        Ok(id) => {
            println!();
            println!("User created: {} (id {})", email, id);
            println!();
        }
        Err(e) => {
            error!(email = %email, error = %e, "Failed to create user");
            std::process::exit(1);
        }
    }
}
