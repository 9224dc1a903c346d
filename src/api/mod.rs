//! JSON HTTP surface.
//!
//! Diesel is synchronous, so every storage call runs on a blocking worker
//! through [`blocking`].

mod admin;
mod auth;
mod error;
mod routes;
mod state;

use axum::Router;
use axum::body::Body;
use axum::http::Request;
use axum::routing::{delete, get, post};
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tracing::{debug, info, instrument};

pub use admin::{CreateGameRequest, CreateTeamRequest, RecordResultRequest};
pub use auth::{AdminUser, CurrentUser, USER_ID_HEADER};
pub use error::ApiError;
pub use routes::{GameView, PickQuery, ScopeQuery, SubmitPickRequest};
pub use state::AppState;

/// Runs `f` on the blocking pool and flattens its result into [`ApiError`].
pub(crate) async fn blocking<F, T, E>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(f).await?.map_err(Into::into)
}

/// Builds the application router over `state`.
#[instrument(skip(state))]
pub fn router(state: AppState) -> Router {
    debug!("Building router");
    Router::new()
        .route("/health", get(routes::health))
        .route("/api/me", get(routes::me))
        .route("/api/teams", get(routes::list_teams))
        .route("/api/games", get(routes::list_games))
        .route("/api/games/{game_id}", get(routes::get_game))
        .route("/api/picks", get(routes::list_picks).post(routes::submit_pick))
        .route("/api/picks/{game_id}", delete(routes::retract_pick))
        .route("/api/leaderboard", get(routes::leaderboard))
        .route("/api/admin/users", get(admin::list_users))
        .route("/api/admin/teams", post(admin::create_team))
        .route("/api/admin/games", post(admin::create_game))
        .route("/api/admin/games/{game_id}/result", post(admin::record_result))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            debug!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

/// Binds `host:port` and serves `state` until Ctrl+C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
#[instrument(skip(state))]
pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(state);

    let listener = TcpListener::bind((host, port)).await?;
    info!(address = %listener.local_addr()?, "Pick'em server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
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
}
