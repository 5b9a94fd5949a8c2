//! HTTP API over the document store.
//!
//! Store calls are blocking file I/O and run on the blocking thread pool.
//! Everything except `/health`, register and login requires a session
//! token in the `Authorization: Bearer` header.

pub mod auth;
mod error;
mod finance;
pub mod password;
pub mod sessions;

pub use error::ApiError;
pub use sessions::{Session, SessionStore};

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use fintrack_core::{
    DebtHistoryRepository, DebtorRepository, InvestmentRepository, JsonStore,
    TransactionRepository, UserRepository,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonStore>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(store: Arc<JsonStore>, sessions: Arc<SessionStore>) -> Self {
        Self { store, sessions }
    }

    fn users(&self) -> UserRepository {
        UserRepository::new(self.store.clone())
    }

    fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.store.clone())
    }

    fn debtors(&self) -> DebtorRepository {
        DebtorRepository::new(self.store.clone())
    }

    fn investments(&self) -> InvestmentRepository {
        InvestmentRepository::new(self.store.clone())
    }

    fn debt_history(&self) -> DebtHistoryRepository {
        DebtHistoryRepository::new(self.store.clone())
    }
}

/// Runs a blocking store call off the async runtime.
async fn blocking<T, E, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}

/// Health check response
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Health check endpoint (no auth required)
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Builds the full router.
pub fn router(state: AppState) -> Router {
    // Public routes (no auth)
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/auth/verify", get(auth::verify))
        .route("/api/auth/logout", post(auth::logout))
        .route(
            "/api/transactions",
            get(finance::list_transactions).post(finance::create_transaction),
        )
        .route("/api/transactions/balance", get(finance::transaction_balance))
        .route(
            "/api/transactions/{id}",
            get(finance::get_transaction)
                .put(finance::update_transaction)
                .delete(finance::delete_transaction),
        )
        .route(
            "/api/debtors",
            get(finance::list_debtors).post(finance::create_debtor),
        )
        .route(
            "/api/debtors/{id}",
            get(finance::get_debtor)
                .put(finance::update_debtor)
                .delete(finance::delete_debtor),
        )
        .route(
            "/api/investments",
            get(finance::list_investments).post(finance::create_investment),
        )
        .route("/api/investments/total", get(finance::investment_total))
        .route(
            "/api/investments/{id}",
            get(finance::get_investment)
                .put(finance::update_investment)
                .delete(finance::delete_investment),
        )
        .route("/api/debt-history", get(finance::list_history))
        .route("/api/debt-history/debtor/{debtor_id}", get(finance::debtor_history))
        .route(
            "/api/settings",
            get(finance::get_settings).put(finance::update_settings),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
