use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use core_types::{NavSeries, PositionSeries, RegimeSeries};

use crate::error::DatasetError;

/// A timestamp-indexed table loaded from the notebook's master CSV export.
///
/// The first CSV column is the date index (its header name does not
/// matter; pandas often leaves it blank). Every other column is parsed as
/// a float where possible; blanks and non-numeric cells become missing
/// values. Rows are kept sorted by date.
#[derive(Debug, Clone)]
pub struct MasterFrame {
    columns: Vec<String>,
    rows: Vec<(NaiveDate, Vec<Option<f64>>)>,
}

impl MasterFrame {
    pub fn from_path(path: &Path) -> Result<Self, DatasetError> {
        tracing::info!(path = %path.display(), "loading master frame");
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::Reader::from_reader(reader);

        let headers = csv_reader.headers()?.clone();
        let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            let raw_date = record.get(0).unwrap_or_default();
            let date = parse_index_date(raw_date)
                .ok_or_else(|| DatasetError::InvalidTimestamp(raw_date.to_string()))?;

            let values = record
                .iter()
                .skip(1)
                .map(|cell| cell.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
                .collect();
            rows.push((date, values));
        }
        rows.sort_by_key(|(date, _)| *date);

        Ok(Self { columns, rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Resolves the NAV column (exact name first, then the notebook-export
    /// convenience: the first column whose name contains "nav") and builds
    /// the series, dropping rows where the value is missing.
    pub fn nav_series(&self, preferred: &str) -> Result<NavSeries, DatasetError> {
        let idx = self
            .column_index(preferred)
            .or_else(|| {
                self.columns
                    .iter()
                    .position(|c| c.to_lowercase().contains("nav"))
            })
            .ok_or_else(|| DatasetError::MissingColumn(preferred.to_string()))?;

        let points: Vec<(NaiveDate, f64)> = self
            .rows
            .iter()
            .filter_map(|(date, values)| values[idx].map(|v| (*date, v)))
            .collect();
        Ok(NavSeries::new(points)?)
    }

    /// Extracts the regime-label column. A missing column is not an error:
    /// the dashboard degrades to NAV-only display.
    pub fn regime_series(&self, column: &str) -> Result<Option<RegimeSeries>, DatasetError> {
        let Some(idx) = self.column_index(column) else {
            return Ok(None);
        };

        let mut points = Vec::new();
        for (date, values) in &self.rows {
            let Some(value) = values[idx] else { continue };
            let label = value.round();
            if label < 0.0 {
                return Err(DatasetError::InvalidValue {
                    column: column.to_string(),
                    date: *date,
                    reason: format!("regime label {value} is negative"),
                });
            }
            points.push((*date, label as u32));
        }
        Ok(Some(RegimeSeries::new(points)?))
    }

    /// Extracts a position-size column; `None` when absent.
    pub fn position_series(&self, column: &str) -> Result<Option<PositionSeries>, DatasetError> {
        let Some(idx) = self.column_index(column) else {
            return Ok(None);
        };

        let points: Vec<(NaiveDate, f64)> = self
            .rows
            .iter()
            .filter_map(|(date, values)| values[idx].map(|v| (*date, v)))
            .collect();
        Ok(Some(PositionSeries::new(points)?))
    }

    fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }
}

/// Pandas exports the index either as a bare date or as a full datetime.
fn parse_index_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date())
        })
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const MASTER: &str = "\
,nav_v5,state_hmm,final_pos_lag
2024-01-01,100.0,0,1.0
2024-01-02,101.0,0,0.5
2024-01-03,,1,
2024-01-04,103.0,1,1.0
";

    fn frame() -> MasterFrame {
        MasterFrame::from_reader(MASTER.as_bytes()).unwrap()
    }

    #[test]
    fn loads_rows_and_columns() {
        let frame = frame();
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.columns(), &["nav_v5", "state_hmm", "final_pos_lag"]);
    }

    #[test]
    fn nav_series_drops_missing_rows() {
        let nav = frame().nav_series("nav_v5").unwrap();
        assert_eq!(nav.len(), 3);
        assert_eq!(nav.last().1, 103.0);
    }

    #[test]
    fn nav_column_falls_back_to_name_containing_nav() {
        let nav = frame().nav_series("nav_v9").unwrap();
        assert_eq!(nav.len(), 3);
    }

    #[test]
    fn missing_nav_column_is_an_error() {
        let csv = ",close\n2024-01-01,1.0\n";
        let frame = MasterFrame::from_reader(csv.as_bytes()).unwrap();
        assert!(matches!(
            frame.nav_series("nav_v5"),
            Err(DatasetError::MissingColumn(_))
        ));
    }

    #[test]
    fn regime_series_reads_integer_labels() {
        let regimes = frame().regime_series("state_hmm").unwrap().unwrap();
        assert_eq!(regimes.len(), 4);
        assert_eq!(regimes.points()[2].1, 1);
    }

    #[test]
    fn absent_optional_columns_yield_none() {
        assert!(frame().regime_series("state_xyz").unwrap().is_none());
        assert!(frame().position_series("pos_xyz").unwrap().is_none());
    }

    #[test]
    fn position_series_skips_blank_cells() {
        let positions = frame().position_series("final_pos_lag").unwrap().unwrap();
        assert_eq!(positions.len(), 3);
    }

    #[test]
    fn datetime_index_is_accepted() {
        let csv = ",nav\n2024-01-01 00:00:00,100.0\n2024-01-02 00:00:00,101.0\n";
        let frame = MasterFrame::from_reader(csv.as_bytes()).unwrap();
        let nav = frame.nav_series("nav").unwrap();
        assert_eq!(nav.len(), 2);
    }

    #[test]
    fn unparseable_index_is_an_error() {
        let csv = ",nav\nnot-a-date,100.0\n";
        assert!(matches!(
            MasterFrame::from_reader(csv.as_bytes()),
            Err(DatasetError::InvalidTimestamp(_))
        ));
    }
}
