//! Fintrack API Server
//!
//! Serves the finance API over the encrypted single-file store.
//!
//! # Configuration
//!
//! Environment variables:
//! - `FINTRACK_CONFIG`: Path to config file (default: ~/.config/fintrack/config.yaml)
//! - `FINTRACK_DATA_PATH`: Data file (default: ~/.local/share/fintrack/db.json)
//! - `FINTRACK_PORT`: Port to listen on (default: 8080)
//! - `FINTRACK_SESSION_TTL_MINUTES`: Session lifetime (default: 60)
//! - `DATA_ENCRYPTION_KEY`: Encryption key. Without it the file is stored as
//!   plaintext JSON.
//!
//! # Endpoints
//!
//! - `GET /health`: Health check endpoint (no auth required)
//! - `POST /api/auth/register`, `POST /api/auth/login`
//! - `/api/transactions`, `/api/debtors`, `/api/investments`,
//!   `/api/debt-history`, `/api/settings` (auth required)

use fintrack::config::Config;
use fintrack::server::{self, AppState, SessionStore};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fintrack_server=info,fintrack=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("FINTRACK_CONFIG").ok().map(PathBuf::from);
    let config = match Config::load(config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Data file: {}", config.data_path.value.display());
    if let Some(path) = &config.config_file {
        tracing::info!("Config file: {}", path.display());
    }

    // Open (and create if needed) the data file
    let store = match config.open_store() {
        Ok(store) => Arc::new(store),
        Err(e) => {
            tracing::error!("Failed to open data file: {}", e);
            std::process::exit(1);
        }
    };

    let sessions = Arc::new(SessionStore::new(config.session_ttl_minutes.value));

    // Drop expired sessions periodically
    let sweeper = sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let removed = sweeper.cleanup_expired();
            if removed > 0 {
                tracing::debug!("Removed {} expired session(s)", removed);
            }
        }
    });

    let app = server::router(AppState::new(store, sessions));

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port.value));
    tracing::info!("Starting server on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
