use std::net::SocketAddr;
use std::sync::Arc;

use analytics::MetricsEngine;
use axum::{Router, routing::get};
use configuration::Settings;
use core_types::{NavSeries, PositionSeries, RegimeSeries};
use dataset::MasterFrame;
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub mod error;
pub mod handlers;

/// The shared application state that all handlers can access.
///
/// Loaded once at startup and shared immutably; there is no ambient cache
/// to invalidate.
pub struct AppState {
    pub nav: NavSeries,
    pub regimes: Option<RegimeSeries>,
    pub positions: Option<PositionSeries>,
    pub engine: MetricsEngine,
}

impl AppState {
    /// Loads the master frame from disk and resolves the configured
    /// columns into series.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let frame = MasterFrame::from_path(&settings.data.master_path)?;
        let nav = frame.nav_series(&settings.data.nav_column)?;
        let regimes = frame.regime_series(&settings.data.regime_column)?;
        let positions = frame.position_series(&settings.data.position_column)?;

        tracing::info!(
            rows = nav.len(),
            has_regimes = regimes.is_some(),
            has_positions = positions.is_some(),
            "dashboard state loaded"
        );

        Ok(Self {
            nav,
            regimes,
            positions,
            engine: MetricsEngine::new(),
        })
    }
}

/// Builds the application router with CORS and request tracing applied.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods(Any)
        .allow_headers(AllowHeaders::any());

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/nav", get(handlers::get_nav))
        .route("/api/summary", get(handlers::get_summary))
        .route("/api/regimes", get(handlers::get_regimes))
        .route(
            "/api/regimes/diagnostics",
            get(handlers::get_regime_diagnostics),
        )
        .route("/api/positions/recent", get(handlers::get_recent_positions))
        .with_state(state)
        .layer(cors)
        // This middleware will automatically log information about every incoming request.
        .layer(TraceLayer::new_for_http())
}

/// The main function to configure and run the dashboard API server.
pub async fn run_server(addr: SocketAddr, state: AppState) -> anyhow::Result<()> {
    let app = router(Arc::new(state));

    tracing::info!("Dashboard API listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
