use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// A single day of index price data as fetched from the market-data API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// The cumulative value of a strategy's capital over time.
///
/// Invariants enforced at construction:
/// - at least one point,
/// - strictly increasing dates,
/// - every value positive and finite.
///
/// The series is immutable once built; the analytics engine consumes it
/// read-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl NavSeries {
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self, CoreError> {
        if points.is_empty() {
            return Err(CoreError::invalid("nav", "series contains no points"));
        }
        check_ascending("nav", points.iter().map(|(d, _)| *d))?;
        for (date, value) in &points {
            if !value.is_finite() || *value <= 0.0 {
                return Err(CoreError::invalid(
                    "nav",
                    format!("value {value} at {date} is not a positive number"),
                ));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        // `new` rejects empty input, so this is always false.
        self.points.is_empty()
    }

    /// The oldest point in the series.
    pub fn first(&self) -> (NaiveDate, f64) {
        self.points[0]
    }

    /// The most recent point in the series.
    pub fn last(&self) -> (NaiveDate, f64) {
        self.points[self.points.len() - 1]
    }
}

/// Discrete market-regime labels aligned to (a subset of) a NAV series'
/// date domain. Labels are small non-negative integers assigned upstream
/// by the regime model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeSeries {
    points: Vec<(NaiveDate, u32)>,
}

impl RegimeSeries {
    /// An empty series is valid; it simply labels no rows.
    pub fn new(points: Vec<(NaiveDate, u32)>) -> Result<Self, CoreError> {
        check_ascending("regime", points.iter().map(|(d, _)| *d))?;
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(NaiveDate, u32)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Daily position sizes held by the strategy (typically the lagged,
/// executable position).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSeries {
    points: Vec<(NaiveDate, f64)>,
}

impl PositionSeries {
    pub fn new(points: Vec<(NaiveDate, f64)>) -> Result<Self, CoreError> {
        check_ascending("position", points.iter().map(|(d, _)| *d))?;
        for (date, value) in &points {
            if !value.is_finite() {
                return Err(CoreError::invalid(
                    "position",
                    format!("value at {date} is not finite"),
                ));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

fn check_ascending(
    series: &'static str,
    dates: impl Iterator<Item = NaiveDate>,
) -> Result<(), CoreError> {
    let mut prev: Option<NaiveDate> = None;
    for date in dates {
        if let Some(p) = prev {
            if date <= p {
                return Err(CoreError::invalid(
                    series,
                    format!("dates must be strictly increasing ({p} followed by {date})"),
                ));
            }
        }
        prev = Some(date);
    }
    Ok(())
}
