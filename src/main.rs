use clap::Parser;
use marquee::cli::{
    Args, build_config, build_session_config, handle_create_user, init_logging, load_jwt_secret,
    load_user_password, open_database,
};
use marquee::run_server;
use marquee::session::SessionConfig;
use tracing::{error, info};

enum Startup {
    CreateUser { email: String, password: String },
    Serve { session: SessionConfig },
}

// Secrets are read (and removed from the environment) before the runtime
// exists, so no other thread can observe the environment while it changes.
fn main() {
    let args = Args::parse();

    init_logging(&args.log_format);

    let startup = match &args.create_user {
        Some(email) => {
            let Some(password) = load_user_password() else {
                std::process::exit(1);
            };
            Startup::CreateUser {
                email: email.clone(),
                password,
            }
        }
        None => {
            let Some(jwt_secret) = load_jwt_secret(args.jwt_secret_file.as_deref()) else {
                std::process::exit(1);
            };
            let Some(session) = build_session_config(&args, &jwt_secret) else {
                std::process::exit(1);
            };
            Startup::Serve { session }
        }
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap_or_else(|e| {
            error!(error = %e, "Failed to start runtime");
            std::process::exit(1);
        });

    runtime.block_on(serve(args, startup));
}

async fn serve(args: Args, startup: Startup) {
    let Some(db) = open_database(&args.database).await else {
        std::process::exit(1);
    };

    let session = match startup {
        Startup::CreateUser { email, password } => {
            handle_create_user(&db, &email, &args.first_name, &args.last_name, &password).await;
            return;
        }
        Startup::Serve { session } => session,
    };

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| {
            error!(address = %addr, error = %e, "Failed to bind");
            std::process::exit(1);
        });

    match listener.local_addr() {
        Ok(local_addr) => info!(address = %local_addr, "Listening"),
        Err(e) => error!(error = %e, "Failed to read local address"),
    }

    let config = build_config(db, session, args.allowed_origins);
    if let Err(e) = run_server(config, listener).await {
        error!(error = %e, "Server error");
        std::process::exit(1);
    }
}
