pub mod embed;
pub mod error;
pub mod routes;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use std::future::Future;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the axum Router with all API routes and middleware.
pub fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Onboarding
        .route("/api/v1/onboard", post(routes::onboard::onboard))
        // Status
        .route("/api/v1/status/systemd", get(routes::status::systemd))
        .route("/api/v1/status/link", get(routes::status::link))
        .route("/api/v1/status/dns", get(routes::status::dns))
        // Logs (SSE)
        .route(
            "/api/v1/log/systemd-networkd",
            get(routes::logs::systemd_networkd),
        )
        .route(
            "/api/v1/log/wpa_supplicant",
            get(routes::logs::wpa_supplicant),
        )
        .fallback(embed::static_handler)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

/// Serve on a pre-bound listener until `shutdown` resolves, then let
/// in-flight requests finish.
pub async fn serve_on<F>(
    listener: tokio::net::TcpListener,
    app_state: AppState,
    shutdown: F,
) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    let app = build_router(app_state);

    tracing::info!(%addr, "listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
