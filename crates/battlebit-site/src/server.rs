//! HTTP server for the community site
//!
//! Provides /health, /api/contributors, /avatar/{id}, and static files.

use crate::access_log::record_access;
use crate::constants::AVATAR_CACHE_CONTROL;
use crate::state::SharedState;
use crate::static_files::{apply_asset_headers, with_static_fallback};
use crate::types::HealthResponse;
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    middleware,
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use std::net::SocketAddr;
use tracing::{debug, info, warn};

const X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route("/api/contributors", get(contributors))
        .route("/avatar/{id}", get(avatar));

    with_static_fallback(router, state.mode, &state.static_roots)
        .layer(middleware::from_fn_with_state(state.mode, apply_asset_headers))
        .layer(middleware::from_fn_with_state(state.clone(), record_access))
        .with_state(state)
}

/// Start the HTTP server and run until SIGINT or SIGTERM
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
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
    info!("Shutdown signal received");
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let uptime_secs = (Utc::now() - state.started_at).num_seconds().max(0) as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        mode: state.mode,
        uptime_secs,
        contributors: state.contributors.get().await.len(),
        last_refresh: state.contributors.last_refreshed().await,
        avatars: state.avatars.stats(),
    })
}

/// Current contributor snapshot, `[]` until the first refresh succeeds
async fn contributors(State(state): State<SharedState>) -> Response {
    let snapshot = state.contributors.get().await;
    Json(snapshot.as_slice()).into_response()
}

/// Proxy a GitHub avatar by numeric user id
async fn avatar(State(state): State<SharedState>, Path(id): Path<String>) -> Response {
    let Some(url) = state.avatars.avatar_url_for_id(&id) else {
        debug!(id = %id, "Rejected non-numeric avatar id");
        return avatar_not_found();
    };

    let cached = state.avatars.contains(&url).await;
    match state.avatars.get_or_fetch(&url).await {
        Some(data) => (
            [
                (header::CONTENT_TYPE, "image/png"),
                (header::CACHE_CONTROL, AVATAR_CACHE_CONTROL),
                (X_CACHE, if cached { "HIT" } else { "MISS" }),
            ],
            data,
        )
            .into_response(),
        None => avatar_not_found(),
    }
}

fn avatar_not_found() -> Response {
    (StatusCode::NOT_FOUND, "Avatar not found").into_response()
}
