use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderName, StatusCode};
use axum::Router;
use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use storereg_api::config::ExporterConfig;
use storereg_api::{background, routes, state};
use storereg_core::registry::RegistryEngine;
use storereg_prom::PromClient;
use storereg_state::RegistryStore;

use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storereg_api=info,storereg_state=info,storereg_prom=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ExporterConfig::from_env();
    tracing::info!(
        prometheus_url = %config.prometheus_url,
        registry_file = %config.registry_file.display(),
        retention_days = config.retention_days,
        staleness_sec = config.staleness_secs,
        "Loaded exporter configuration"
    );

    // --- Registry ---
    let store = Arc::new(RegistryStore::new(config.registry_file.clone()));
    let initial = store.load_or_migrate(Utc::now()).await;
    tracing::info!(count = initial.len(), "Loaded persisted registry");

    let engine = Arc::new(RegistryEngine::new(initial));

    // Startup sweep so a long-stopped exporter does not briefly expose
    // entries that expired while it was down.
    let removed = engine.expire(Utc::now(), config.retention_window());
    if !removed.is_empty() {
        tracing::info!(count = removed.len(), "Expired stores past retention at startup");
    }

    // --- Backend client ---
    let prom = Arc::new(PromClient::new(
        config.prometheus_url.clone(),
        config.job_selector.clone(),
        config.staleness_secs,
    ));

    // --- App state ---
    let state = AppState {
        engine: Arc::clone(&engine),
        store: Arc::clone(&store),
        freshness: prom,
        config: Arc::new(config.clone()),
    };

    // --- Shutdown signal ---
    let shutdown = CancellationToken::new();
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            shutdown_signal().await;
            shutdown.cancel();
        });
    }

    // --- Reconciliation task ---
    let reconcile_handle = tokio::spawn(background::reconcile::run(
        state.clone(),
        shutdown.clone(),
    ));

    // --- Routers ---
    let web_app = build_web_app(state.clone());

    let metrics_app = Router::new()
        .merge(routes::metrics::router())
        .with_state(state.clone());

    // --- Listeners ---
    let host: std::net::IpAddr = config.host.parse().expect("Invalid HOST address");
    let web_addr = SocketAddr::new(host, config.web_port);
    let metrics_addr = SocketAddr::new(host, config.metrics_port);

    let web_listener = tokio::net::TcpListener::bind(web_addr)
        .await
        .expect("Failed to bind web address");
    let metrics_listener = tokio::net::TcpListener::bind(metrics_addr)
        .await
        .expect("Failed to bind metrics address");

    tracing::info!(%web_addr, %metrics_addr, "Starting servers");

    let web_server = axum::serve(web_listener, web_app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());
    let metrics_server = axum::serve(metrics_listener, metrics_app)
        .with_graceful_shutdown(shutdown.clone().cancelled_owned());

    let (web_result, metrics_result) =
        tokio::join!(async { web_server.await }, async { metrics_server.await });
    web_result.expect("Web server error");
    metrics_result.expect("Metrics server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Servers stopped accepting connections, cleaning up");

    let _ = tokio::time::timeout(Duration::from_secs(5), reconcile_handle).await;

    // Final persist so shutdown never loses the last cycle's state.
    if let Err(e) = store.save(&engine.snapshot()).await {
        tracing::error!(error = %e, "Failed to persist registry during shutdown");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Build the web listener's router with the full middleware stack.
fn build_web_app(state: AppState) -> Router {
    let request_id_header = HeaderName::from_static("x-request-id");
    let request_timeout_secs = state.config.request_timeout_secs;

    Router::new()
        // Health check at root level (not under /api).
        .merge(routes::health::router())
        // Introspection API.
        .nest("/api", routes::api_routes())
        // -- Middleware stack (applied bottom-up) --
        // Panic recovery: catch panics and return 500.
        .layer(CatchPanicLayer::new())
        // Request timeout.
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_secs),
        ))
        // Propagate request ID to response.
        .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
        // Structured request/response tracing.
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Set request ID on incoming requests.
        .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
        // Shared state.
        .with_state(state)
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix) so the exporter
/// shuts down cleanly whether stopped interactively or by a process
/// manager (e.g. systemd, Docker, Kubernetes).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
