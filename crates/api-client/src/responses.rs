use serde::Deserialize;

// The v8 chart payload nests everything under `chart`, with either a
// `result` array or an `error` object populated.

#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: Chart,
}

#[derive(Debug, Deserialize)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartErrorBody>,
}

/// The error object Yahoo returns for unknown symbols or bad ranges.
#[derive(Debug, Clone, Deserialize)]
pub struct ChartErrorBody {
    pub code: String,
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChartResult {
    /// Unix timestamps (seconds, UTC) of the returned rows. Absent when the
    /// range contains no trading days.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    pub indicators: Indicators,
}

#[derive(Debug, Deserialize)]
pub struct Indicators {
    pub quote: Vec<QuoteBlock>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseBlock>,
}

/// OHLCV arrays, row-aligned with `timestamp`. Individual entries are null
/// on exchange holidays, so every slot is optional.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteBlock {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdjCloseBlock {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}
