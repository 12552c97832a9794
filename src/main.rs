//! Blogpad application entry point.
//!
//! Bootstraps the server:
//! 1. Load configuration from environment
//! 2. Open the configured store backend (Redis or in-memory)
//! 3. Build router with API routes, security headers and tracing
//! 4. Start Axum server with graceful shutdown
//!
//! Also supports a `hash-password` subcommand for seeding credential records.

use blogpad::{
    auth::{AppState, PasswordHasher},
    cleanup,
    config::{argon2_params_from_env, Config, StoreBackend},
    routes,
    storage::{
        BlogStore, CredentialStore, MemoryBlogStore, MemoryCredentialStore, MemorySessionStore,
        RedisStore, SessionStore,
    },
};
use std::sync::Arc;
use std::time::Duration;

fn print_hash_password_usage() {
    eprintln!("Usage: blogpad hash-password <password>");
    eprintln!();
    eprintln!("Print an Argon2id hash (PHC string) suitable for a stored password_hash.");
    eprintln!("Cost parameters come from ARGON2_MEMORY_KIB, ARGON2_ITERATIONS and ARGON2_PARALLELISM.");
    eprintln!();
    eprintln!("Example:");
    eprintln!("  blogpad hash-password secret123");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() {
    // Check for hash-password subcommand
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 2 && args[1] == "hash-password" {
        if args.len() != 3 {
            print_hash_password_usage();
            std::process::exit(1);
        }

        // Same cost parameters the server would use
        let hasher = argon2_params_from_env()
            .map_err(|e| e.to_string())
            .and_then(|(memory_kib, iterations, parallelism)| {
                PasswordHasher::new(memory_kib, iterations, parallelism)
            });
        let hasher = match hasher {
            Ok(hasher) => hasher,
            Err(e) => {
                eprintln!("Invalid Argon2 configuration: {}", e);
                std::process::exit(1);
            }
        };

        match hasher.hash(&args[2]) {
            Ok(hash) => println!("{}", hash),
            Err(e) => {
                eprintln!("Error hashing password: {}", e);
                std::process::exit(1);
            }
        }
        return;
    }

    // Initialize tracing with env filter support (RUST_LOG)
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config from environment
    let config = Config::from_env().expect("Failed to load config");
    tracing::info!("Starting blogpad on {}", config.bind_addr);

    // Open stores
    let (users, sessions, blog): (
        Arc<dyn CredentialStore>,
        Arc<dyn SessionStore>,
        Arc<dyn BlogStore>,
    ) = match config.store_backend {
        StoreBackend::Redis => {
            let redis_url = config
                .redis_url
                .as_deref()
                .expect("REDIS_URL is validated by Config::from_env");
            let store = Arc::new(
                RedisStore::connect(redis_url, config.session_ttl_secs)
                    .await
                    .expect("Failed to connect to Redis"),
            );
            tracing::info!("Using Redis store");
            let users: Arc<dyn CredentialStore> = store.clone();
            let sessions: Arc<dyn SessionStore> = store.clone();
            let blog: Arc<dyn BlogStore> = store;
            (users, sessions, blog)
        }
        StoreBackend::Memory => {
            let sessions = Arc::new(MemorySessionStore::new(Duration::from_secs(
                config.session_ttl_secs,
            )));
            tokio::spawn(cleanup::run_session_sweep(
                sessions.clone(),
                Duration::from_secs(config.session_sweep_secs),
            ));
            tracing::warn!("Using in-memory store; all data is lost on restart");
            let users: Arc<dyn CredentialStore> = Arc::new(MemoryCredentialStore::new());
            let blog: Arc<dyn BlogStore> = Arc::new(MemoryBlogStore::new());
            (users, sessions as Arc<dyn SessionStore>, blog)
        }
    };

    let bind_addr = config.bind_addr;
    let state =
        AppState::new(config, users, sessions, blog).expect("Failed to build application state");

    let app = routes::app(state);

    // Bind to configured address
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("Failed to bind");
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}
