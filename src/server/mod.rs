//! HTTP server.
//!
//! Wraps the services in an axum router. Bearer-token checks run as route
//! middleware on the protected routes; everything else is public.

pub mod api;
pub mod auth;

use crate::config::ServerConfig;
use crate::db::pool::DbPool;
use crate::services::auth::AuthConfig;
use anyhow::Context;
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Shared state for all routes.
#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    pub fn new(db: DbPool, auth: AuthConfig) -> Self {
        Self {
            db,
            auth: Arc::new(auth),
        }
    }
}

/// Build the full router.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/team/add", post(api::add_team))
        .route("/users", get(api::list_users))
        .route("/auth/admin", post(auth::admin_login_handler));

    // route_layer so unknown paths still 404 instead of 401.
    let protected = Router::new()
        .route("/team/get", get(api::get_team))
        .route("/users/setIsActive", post(api::set_is_active))
        .route("/users/getReview", get(api::get_review))
        .route("/pullRequest/create", post(api::create_pull_request))
        .route("/pullRequest/merge", post(api::merge_pull_request))
        .route("/pullRequest/reassign", post(api::reassign_reviewer))
        .route("/auth/refresh", post(auth::refresh_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .merge(public)
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// Serve on `listener` until `cancel` fires, then drain open connections.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    cancel: CancellationToken,
) -> std::io::Result<()> {
    let app = router(state);

    log::info!("[server] Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            cancel.cancelled().await;
        })
        .await?;

    log::info!("[server] Server stopped");
    Ok(())
}

/// Bind the configured port and serve until Ctrl-C or SIGTERM.
///
/// After the signal, in-flight requests get `shutdown_timeout` to finish.
pub async fn start(config: &ServerConfig, db: DbPool) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to port {}", config.port))?;

    let state = AppState::new(db, config.auth.clone());
    let cancel = CancellationToken::new();
    let mut server = tokio::spawn(serve(listener, state, cancel.clone()));

    tokio::select! {
        result = &mut server => {
            // Server exited on its own; nothing left to drain.
            return result
                .context("Server task panicked")?
                .context("Server error");
        }
        _ = shutdown_signal() => {
            log::info!("[server] Shutdown signal received");
        }
    }

    cancel.cancel();

    match tokio::time::timeout(config.shutdown_timeout, server).await {
        Ok(joined) => joined
            .context("Server task panicked")?
            .context("Server error")?,
        Err(_) => log::warn!(
            "[server] Graceful shutdown timed out after {:?}",
            config.shutdown_timeout
        ),
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[server] Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                log::error!("[server] Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
