use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Failed to execute the HTTP request: {0}")]
    Request(#[from] reqwest::Error),

    #[error("The chart API returned an error ({code}): {description}")]
    Upstream { code: String, description: String },

    #[error("Failed to deserialize the API response: {0}")]
    Deserialization(String),

    #[error("Invalid data format from API: {0}")]
    InvalidData(String),

    #[error("No price rows returned for {0}; check the symbol or connectivity")]
    NoData(String),
}
