use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use core_types::{NavSeries, PositionSeries, RegimeSeries};

use crate::error::AnalyticsError;
use crate::report::{PerformanceSummary, RegimeDiagnostics, RegimeStats};

/// Trading days per year, used to annualize daily return statistics.
const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// Calendar days per year for elapsed-time calculations.
const DAYS_PER_YEAR: f64 = 365.25;

/// A stateless calculator for deriving performance metrics from a NAV curve.
#[derive(Debug, Default)]
pub struct MetricsEngine {}

impl MetricsEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes the summary performance metrics of a NAV curve.
    ///
    /// # Arguments
    ///
    /// * `nav` - The strategy's cumulative value over time. The series type
    ///   guarantees positive values and strictly increasing dates.
    ///
    /// # Returns
    ///
    /// A `Result` containing the `PerformanceSummary` or an
    /// `AnalyticsError` when the series is too short for return-based
    /// metrics. Metrics with a degenerate denominator come back as NaN.
    pub fn summary(&self, nav: &NavSeries) -> Result<PerformanceSummary, AnalyticsError> {
        if nav.len() < 2 {
            return Err(AnalyticsError::NotEnoughData(format!(
                "summary metrics need at least 2 NAV points, got {}",
                nav.len()
            )));
        }
        tracing::debug!(points = nav.len(), "computing summary metrics");

        let (first_date, first_value) = nav.first();
        let (last_date, last_value) = nav.last();

        let total_return = last_value / first_value - 1.0;

        let years_elapsed = (last_date - first_date).num_days() as f64 / DAYS_PER_YEAR;
        let cagr = if years_elapsed > 0.0 {
            (1.0 + total_return).powf(1.0 / years_elapsed) - 1.0
        } else {
            f64::NAN
        };

        // Simple (not log) period returns; the first row has no prior value
        // and contributes none.
        let returns: Vec<f64> = nav
            .points()
            .windows(2)
            .map(|w| w[1].1 / w[0].1 - 1.0)
            .collect();

        let daily_stdev = sample_stdev(&returns);
        let annualized_volatility = daily_stdev * TRADING_DAYS_PER_YEAR.sqrt();
        // NaN stdev (a single return) also falls through to NaN here.
        let sharpe_ratio = if daily_stdev > 0.0 {
            mean(&returns) * TRADING_DAYS_PER_YEAR / annualized_volatility
        } else {
            f64::NAN
        };

        Ok(PerformanceSummary {
            total_return,
            cagr,
            annualized_volatility,
            sharpe_ratio,
            max_drawdown: max_drawdown(nav.points()),
        })
    }

    /// Computes per-regime diagnostics over a NAV curve.
    ///
    /// For every label present in `regimes` the NAV rows carrying that label
    /// are collected into a subset; labelled dates without a NAV row are
    /// excluded. The subset's period returns are taken over consecutive
    /// subset rows (even when those are non-adjacent in the full series),
    /// with the missing leading return treated as 0.
    ///
    /// An empty `regimes` series yields an empty map.
    pub fn regime_diagnostics(
        &self,
        nav: &NavSeries,
        regimes: &RegimeSeries,
        positions: Option<&PositionSeries>,
    ) -> RegimeDiagnostics {
        let nav_by_date: HashMap<NaiveDate, f64> = nav.points().iter().copied().collect();
        let position_by_date: HashMap<NaiveDate, f64> = positions
            .map(|p| p.points().iter().copied().collect())
            .unwrap_or_default();

        // Group the labelled dates, keeping ascending date order per label.
        let mut dates_by_label: BTreeMap<u32, Vec<NaiveDate>> = BTreeMap::new();
        for (date, label) in regimes.points() {
            dates_by_label.entry(*label).or_default().push(*date);
        }

        let total_rows = nav.len() as f64;
        let mut diagnostics = RegimeDiagnostics::new();
        for (label, dates) in dates_by_label {
            let subset: Vec<f64> = dates
                .iter()
                .filter_map(|d| nav_by_date.get(d).copied())
                .collect();

            let returns = subset_returns(&subset);
            let total_return: f64 = returns.iter().sum();
            let annualized_volatility = sample_stdev(&returns) * TRADING_DAYS_PER_YEAR.sqrt();
            let fraction_of_days = subset.len() as f64 / total_rows;

            let days_invested = dates
                .iter()
                .filter(|d| nav_by_date.contains_key(d))
                .map(|d| position_by_date.get(d).copied().unwrap_or(0.0))
                .sum::<f64>() as i64;

            diagnostics.insert(
                label,
                RegimeStats {
                    total_return,
                    annualized_volatility,
                    fraction_of_days,
                    days_invested,
                },
            );
        }

        diagnostics
    }
}

/// Period returns of a regime subset, with the missing leading return kept
/// as 0 rather than dropped.
fn subset_returns(values: &[f64]) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }
    let mut returns = Vec::with_capacity(values.len());
    returns.push(0.0);
    for w in values.windows(2) {
        returns.push(w[1] / w[0] - 1.0);
    }
    returns
}

/// Largest peak-to-trough decline, as a fraction of the running maximum.
/// Always <= 0; exactly 0 for a non-decreasing series.
fn max_drawdown(points: &[(NaiveDate, f64)]) -> f64 {
    let mut peak = points[0].1;
    let mut worst = 0.0_f64;
    for &(_, value) in points {
        if value > peak {
            peak = value;
        }
        let drawdown = value / peak - 1.0;
        if drawdown < worst {
            worst = drawdown;
        }
    }
    worst
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n-1 denominator). NaN for fewer than two
/// values, matching the behavior the dashboard expects for degenerate
/// subsets.
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let sum_sq: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::{NavSeries, PositionSeries, RegimeSeries};

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    /// Builds a NAV series with one point per day starting 2020-01-01.
    fn daily_nav(values: &[f64]) -> NavSeries {
        let start = d(2020, 1, 1);
        let points = values
            .iter()
            .enumerate()
            .map(|(i, v)| (start + chrono::Duration::days(i as i64), *v))
            .collect();
        NavSeries::new(points).unwrap()
    }

    fn assert_close(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn single_point_is_not_enough() {
        let nav = NavSeries::new(vec![(d(2020, 1, 1), 100.0)]).unwrap();
        let err = MetricsEngine::new().summary(&nav).unwrap_err();
        assert!(matches!(err, AnalyticsError::NotEnoughData(_)));
    }

    #[test]
    fn constant_nav_has_flat_metrics() {
        let nav = daily_nav(&[100.0, 100.0, 100.0, 100.0]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();

        assert_eq!(summary.total_return, 0.0);
        assert_eq!(summary.cagr, 0.0);
        assert_eq!(summary.max_drawdown, 0.0);
        // Zero variance: volatility is exactly 0 and Sharpe degenerates.
        assert_eq!(summary.annualized_volatility, 0.0);
        assert!(summary.sharpe_ratio.is_nan());
    }

    #[test]
    fn two_equal_up_periods() {
        let nav = daily_nav(&[100.0, 110.0, 121.0]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();

        assert_close(summary.total_return, 0.21, 1e-12);
        // Both period returns are +10%, so the dispersion is zero up to
        // floating-point rounding.
        assert_close(summary.annualized_volatility, 0.0, 1e-8);
        assert_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn sharpe_is_nan_for_exactly_constant_returns() {
        // +25% per day is exact in binary arithmetic, so the stdev is a
        // true zero rather than rounding noise.
        let nav = daily_nav(&[100.0, 125.0, 156.25]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();

        assert_eq!(summary.annualized_volatility, 0.0);
        assert!(summary.sharpe_ratio.is_nan());
    }

    #[test]
    fn monotone_series_has_zero_drawdown() {
        let nav = daily_nav(&[100.0, 101.0, 105.0, 110.0, 130.0]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();
        assert_eq!(summary.max_drawdown, 0.0);
    }

    #[test]
    fn drawdown_from_running_peak() {
        let nav = daily_nav(&[100.0, 50.0, 100.0]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();
        assert_eq!(summary.max_drawdown, -0.5);
    }

    #[test]
    fn cagr_matches_closed_form() {
        // Two points exactly one Julian year apart, +21% total.
        let points = vec![(d(2020, 1, 1), 100.0), (d(2021, 1, 1), 121.0)];
        let nav = NavSeries::new(points).unwrap();
        let summary = MetricsEngine::new().summary(&nav).unwrap();

        let years = 366.0 / 365.25;
        assert_close(summary.cagr, 1.21_f64.powf(1.0 / years) - 1.0, 1e-12);
        // A single period return: stdev (and so volatility/Sharpe) is NaN.
        assert!(summary.annualized_volatility.is_nan());
        assert!(summary.sharpe_ratio.is_nan());
    }

    #[test]
    fn summary_is_deterministic() {
        let nav = daily_nav(&[100.0, 104.0, 99.0, 107.5, 103.2, 111.9]);
        let engine = MetricsEngine::new();
        let a = engine.summary(&nav).unwrap();
        let b = engine.summary(&nav).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn volatility_annualizes_daily_stdev() {
        let nav = daily_nav(&[100.0, 110.0, 99.0]);
        let summary = MetricsEngine::new().summary(&nav).unwrap();

        let r1: f64 = 110.0 / 100.0 - 1.0;
        let r2: f64 = 99.0 / 110.0 - 1.0;
        let m = (r1 + r2) / 2.0;
        let stdev = (((r1 - m).powi(2) + (r2 - m).powi(2)) / 1.0).sqrt();
        assert_close(summary.annualized_volatility, stdev * 252.0_f64.sqrt(), 1e-12);
        assert_close(
            summary.sharpe_ratio,
            m * 252.0 / (stdev * 252.0_f64.sqrt()),
            1e-12,
        );
    }

    #[test]
    fn single_label_covers_full_domain() {
        let values = [100.0, 104.0, 99.0, 107.5];
        let nav = daily_nav(&values);
        let labels = nav.points().iter().map(|(d, _)| (*d, 1_u32)).collect();
        let regimes = RegimeSeries::new(labels).unwrap();

        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, None);
        assert_eq!(diag.len(), 1);
        let stats = &diag[&1];

        assert_eq!(stats.fraction_of_days, 1.0);
        assert_eq!(stats.days_invested, 0);
        // The regime total is the plain sum of the full series' period
        // returns (leading return counted as 0).
        let expected: f64 = values.windows(2).map(|w| w[1] / w[0] - 1.0).sum();
        assert_close(stats.total_return, expected, 1e-12);
    }

    #[test]
    fn empty_regimes_yield_empty_diagnostics() {
        let nav = daily_nav(&[100.0, 101.0]);
        let regimes = RegimeSeries::new(vec![]).unwrap();
        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, None);
        assert!(diag.is_empty());
    }

    #[test]
    fn diagnostics_are_keyed_ascending_and_split_the_domain() {
        let nav = daily_nav(&[100.0, 110.0, 121.0, 60.5]);
        let dates: Vec<NaiveDate> = nav.points().iter().map(|(d, _)| *d).collect();
        let regimes = RegimeSeries::new(vec![
            (dates[0], 2),
            (dates[1], 0),
            (dates[2], 2),
            (dates[3], 0),
        ])
        .unwrap();

        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, None);
        let labels: Vec<u32> = diag.keys().copied().collect();
        assert_eq!(labels, vec![0, 2]);

        assert_eq!(diag[&0].fraction_of_days, 0.5);
        assert_eq!(diag[&2].fraction_of_days, 0.5);

        // Regime 2 holds rows 0 and 2: returns [0, 121/100 - 1].
        assert_close(diag[&2].total_return, 0.21, 1e-12);
        // Regime 0 holds rows 1 and 3: returns [0, 60.5/110 - 1].
        assert_close(diag[&0].total_return, 60.5 / 110.0 - 1.0, 1e-12);
    }

    #[test]
    fn single_row_regime_has_nan_volatility() {
        let nav = daily_nav(&[100.0, 110.0]);
        let dates: Vec<NaiveDate> = nav.points().iter().map(|(d, _)| *d).collect();
        let regimes = RegimeSeries::new(vec![(dates[0], 0), (dates[1], 1)]).unwrap();

        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, None);
        assert!(diag[&0].annualized_volatility.is_nan());
        assert_eq!(diag[&0].total_return, 0.0);
    }

    #[test]
    fn labelled_dates_missing_from_nav_are_excluded() {
        let nav = daily_nav(&[100.0, 110.0]);
        let dates: Vec<NaiveDate> = nav.points().iter().map(|(d, _)| *d).collect();
        // The third labelled date has no NAV row.
        let regimes = RegimeSeries::new(vec![
            (dates[0], 0),
            (dates[1], 0),
            (dates[1] + chrono::Duration::days(1), 0),
        ])
        .unwrap();

        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, None);
        assert_eq!(diag[&0].fraction_of_days, 1.0);
        assert_close(diag[&0].total_return, 0.1, 1e-12);
    }

    #[test]
    fn days_invested_sums_and_truncates_positions() {
        let nav = daily_nav(&[100.0, 110.0, 121.0]);
        let dates: Vec<NaiveDate> = nav.points().iter().map(|(d, _)| *d).collect();
        let regimes =
            RegimeSeries::new(vec![(dates[0], 0), (dates[1], 0), (dates[2], 1)]).unwrap();
        let positions = PositionSeries::new(vec![
            (dates[0], 1.0),
            (dates[1], 0.9),
            (dates[2], 1.0),
        ])
        .unwrap();

        let diag = MetricsEngine::new().regime_diagnostics(&nav, &regimes, Some(&positions));
        // 1.0 + 0.9 truncates to 1.
        assert_eq!(diag[&0].days_invested, 1);
        assert_eq!(diag[&1].days_invested, 1);
    }
}
