use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to read or write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("The dataset has no '{0}' column")]
    MissingColumn(String),

    #[error("Invalid timestamp index value: '{0}'")]
    InvalidTimestamp(String),

    #[error("Column '{column}' has an invalid value on {date}: {reason}")]
    InvalidValue {
        column: String,
        date: chrono::NaiveDate,
        reason: String,
    },

    #[error("Series construction failed: {0}")]
    Series(#[from] core_types::CoreError),
}
