use std::fs;
use std::path::Path;

use core_types::DailyBar;

use crate::error::DatasetError;

/// Writes fetched bars to a CSV file with a
/// `date,open,high,low,close,adj_close,volume` header, creating parent
/// directories as needed.
pub fn save_daily_bars(path: &Path, bars: &[DailyBar]) -> Result<(), DatasetError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)?;
    for bar in bars {
        writer.serialize(bar)?;
    }
    writer.flush()?;

    tracing::info!(path = %path.display(), rows = bars.len(), "saved price data");
    Ok(())
}

/// Reads bars back from a CSV written by `save_daily_bars`.
pub fn load_daily_bars(path: &Path) -> Result<Vec<DailyBar>, DatasetError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut bars = Vec::new();
    for record in reader.deserialize() {
        bars.push(record?);
    }
    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn bar(day: u32, close: f64) -> DailyBar {
        DailyBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            adj_close: close,
            volume: 1_000,
        }
    }

    #[test]
    fn bars_round_trip_through_csv() {
        let path = std::env::temp_dir().join(format!("bars-{}.csv", std::process::id()));
        let bars = vec![bar(2, 100.0), bar(3, 101.5)];

        save_daily_bars(&path, &bars).unwrap();
        let loaded = load_daily_bars(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(loaded, bars);
    }
}
