use std::collections::HashMap;
use std::sync::Arc;

use analytics::{PerformanceSummary, RegimeDiagnostics};
use axum::{
    Json,
    extract::{Query, State},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::AppError};

/// One point of the NAV curve.
#[derive(Debug, Serialize)]
pub struct NavPoint {
    pub date: NaiveDate,
    pub value: f64,
}

/// One row of the regime timeline.
#[derive(Debug, Serialize)]
pub struct RegimePoint {
    pub date: NaiveDate,
    pub label: u32,
}

/// One row of the recent-positions table.
#[derive(Debug, Serialize)]
pub struct RecentPosition {
    pub date: NaiveDate,
    pub position: f64,
    pub label: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct RecentQuery {
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    50
}

/// # GET /api/nav
pub async fn get_nav(State(state): State<Arc<AppState>>) -> Json<Vec<NavPoint>> {
    let points = state
        .nav
        .points()
        .iter()
        .map(|(date, value)| NavPoint {
            date: *date,
            value: *value,
        })
        .collect();
    Json(points)
}

/// # GET /api/summary
/// Computes the summary metrics of the loaded NAV curve. Degenerate
/// metrics come back as `null`; the frontend decides how to render them.
pub async fn get_summary(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PerformanceSummary>, AppError> {
    let summary = state.engine.summary(&state.nav)?;
    Ok(Json(summary))
}

/// # GET /api/regimes
/// The regime timeline; empty when the dataset has no regime column.
pub async fn get_regimes(State(state): State<Arc<AppState>>) -> Json<Vec<RegimePoint>> {
    let points = state
        .regimes
        .as_ref()
        .map(|regimes| {
            regimes
                .points()
                .iter()
                .map(|(date, label)| RegimePoint {
                    date: *date,
                    label: *label,
                })
                .collect()
        })
        .unwrap_or_default();
    Json(points)
}

/// # GET /api/regimes/diagnostics
pub async fn get_regime_diagnostics(
    State(state): State<Arc<AppState>>,
) -> Result<Json<RegimeDiagnostics>, AppError> {
    let regimes = state
        .regimes
        .as_ref()
        .ok_or_else(|| AppError::NotFound("regime column not found in dataset".to_string()))?;

    let diagnostics =
        state
            .engine
            .regime_diagnostics(&state.nav, regimes, state.positions.as_ref());
    Ok(Json(diagnostics))
}

/// # GET /api/positions/recent?limit=N
/// The last N position rows (default 50) with their regime labels.
pub async fn get_recent_positions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<RecentQuery>,
) -> Result<Json<Vec<RecentPosition>>, AppError> {
    let positions = state
        .positions
        .as_ref()
        .ok_or_else(|| AppError::NotFound("position column not found in dataset".to_string()))?;

    let labels: HashMap<NaiveDate, u32> = state
        .regimes
        .as_ref()
        .map(|r| r.points().iter().copied().collect())
        .unwrap_or_default();

    let points = positions.points();
    let start = points.len().saturating_sub(query.limit);
    let rows = points[start..]
        .iter()
        .map(|(date, position)| RecentPosition {
            date: *date,
            position: *position,
            label: labels.get(date).copied(),
        })
        .collect();
    Ok(Json(rows))
}
