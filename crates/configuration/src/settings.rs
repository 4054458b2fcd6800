use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

/// The root configuration structure for the entire application.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub dashboard: DashboardSettings,
}

/// Where the datasets live and which master-frame columns to read.
#[derive(Debug, Clone, Deserialize)]
pub struct DataSettings {
    /// The index symbol to download (e.g., "^NSEI").
    pub symbol: String,
    /// The first date of the download range.
    pub start_date: NaiveDate,
    /// Directory the fetch command writes price CSVs into.
    pub data_dir: PathBuf,
    /// The notebook's master frame export (NAV, regimes, positions).
    pub master_path: PathBuf,
    /// Column holding the strategy NAV curve.
    pub nav_column: String,
    /// Column holding the regime labels.
    pub regime_column: String,
    /// Column holding the lagged position sizes.
    pub position_column: String,
}

/// Bind address for the dashboard API.
#[derive(Debug, Clone, Deserialize)]
pub struct DashboardSettings {
    pub host: String,
    pub port: u16,
}

impl DataSettings {
    /// The CSV path the fetch command writes for a symbol, with the
    /// characters that are awkward in file names stripped out.
    pub fn price_path(&self, symbol: &str) -> PathBuf {
        let cleaned: String = symbol.replace('^', "").replace('/', "_");
        self.data_dir.join(format!("{cleaned}.csv"))
    }
}
