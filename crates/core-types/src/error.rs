use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid {series} series: {reason}")]
    InvalidSeries {
        series: &'static str,
        reason: String,
    },
}

impl CoreError {
    pub(crate) fn invalid(series: &'static str, reason: impl Into<String>) -> Self {
        CoreError::InvalidSeries {
            series,
            reason: reason.into(),
        }
    }
}
