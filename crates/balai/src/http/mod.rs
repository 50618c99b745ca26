//! HTTP surface of the site.
//!
//! [`build_router`] wires the public pages, the admin panel behind the Basic
//! Auth gate, and the 404 fallback onto a shared [`AppState`]. [`serve`] binds
//! the configured address and runs until Ctrl-C or SIGTERM.

mod admin;
pub mod auth;
pub mod form;
mod public;
pub mod trace;

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::http::{header, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

use crate::config::{AdminCredentials, Config};
use crate::error::{Error, Result};
use crate::store::Store;

/// Path of the admin dashboard; mutating admin routes redirect here.
pub const DASHBOARD_PATH: &str = "/admin";

/// State shared by every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The flat-file store.
    pub store: Arc<Store>,
    /// Credentials accepted by the admin gate.
    pub credentials: Arc<AdminCredentials>,
    request_id_seed: Arc<AtomicU64>,
}

impl AppState {
    /// Build handler state around an opened store.
    #[must_use]
    pub fn new(store: Store, credentials: AdminCredentials) -> Self {
        Self {
            store: Arc::new(store),
            credentials: Arc::new(credentials),
            request_id_seed: Arc::new(AtomicU64::new(1)),
        }
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(public::home))
        .route("/berita", get(public::news_list))
        .route("/berita/:slug", get(public::news_detail))
        .route(
            "/pengaduan",
            get(public::complaint_form).post(public::submit_complaint),
        )
        .route(DASHBOARD_PATH, get(admin::dashboard))
        .route("/admin/berita", post(admin::create_news))
        .route(
            "/admin/pengaduan/:id/status",
            post(admin::update_complaint_status),
        )
        .fallback(public::not_found)
        .layer(from_fn_with_state(state.clone(), auth::admin_gate))
        .layer(from_fn_with_state(state.clone(), trace::request_tracing))
        .with_state(state)
}

/// Open the store, bind the configured address and serve until shutdown.
///
/// # Errors
///
/// Returns an error if the store cannot be initialized, the address cannot be
/// bound, or the server fails.
pub async fn serve(config: &Config) -> Result<()> {
    let store = Store::open(&config.storage.data_dir)?;
    if config.has_partial_credentials() {
        warn!("Only one of admin username/password is configured; ignoring it");
    }
    if config.uses_default_credentials() {
        warn!(
            "No admin credentials configured, falling back to the default '{}' account",
            crate::config::DEFAULT_ADMIN_USERNAME
        );
    }
    let state = AppState::new(store, config.admin_credentials());

    let addr = config.listen_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| Error::Bind {
            addr: addr.clone(),
            source,
        })?;
    let local = listener.local_addr()?;
    info!("Server running on http://{local}");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("Failed to listen for SIGTERM: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

/// Storage failure surfaced to the client as a 500.
#[derive(Debug)]
pub(crate) struct ServerError(Error);

impl From<Error> for ServerError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        error!("Request failed: {}", self.0);
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Terjadi kesalahan pada server.",
        )
            .into_response()
    }
}

/// Run blocking store work off the async executor.
pub(crate) async fn with_store<R, F>(state: &AppState, f: F) -> std::result::Result<R, ServerError>
where
    F: FnOnce(&Store) -> Result<R> + Send + 'static,
    R: Send + 'static,
{
    let store = Arc::clone(&state.store);
    tokio::task::spawn_blocking(move || f(&store))
        .await
        .map_err(|err| Error::internal(format!("store task failed: {err}")))?
        .map_err(ServerError::from)
}

/// `302 Found` back to the dashboard.
pub(crate) fn redirect_to_dashboard() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, DASHBOARD_PATH)]).into_response()
}
