use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The summary performance statistics of a NAV curve.
///
/// This struct is the output of `MetricsEngine::summary` and is handed to
/// the presentation layer as-is; rounding and percent formatting happen
/// there. Degenerate metrics are NaN (serde_json renders non-finite floats
/// as `null`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub total_return: f64,
    pub cagr: f64,
    pub annualized_volatility: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

/// Per-regime diagnostics, keyed by regime label. The BTreeMap keeps both
/// iteration and JSON output in ascending label order.
pub type RegimeDiagnostics = BTreeMap<u32, RegimeStats>;

/// Diagnostics for the rows spent in a single regime.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeStats {
    /// Sum of the regime subset's period returns. This matches the research
    /// notebook's definition; it is an approximation, not the compounded
    /// return of holding only during this regime.
    pub total_return: f64,
    pub annualized_volatility: f64,
    /// Share of all NAV rows carrying this label.
    pub fraction_of_days: f64,
    /// Position sizes summed over this regime's rows, truncated to an
    /// integer. Zero when no position series is supplied.
    pub days_invested: i64,
}
