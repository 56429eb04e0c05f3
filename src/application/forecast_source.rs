// Source trait for raw forecast payloads
use crate::domain::forecast::RawForecast;
use async_trait::async_trait;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FetchError {
    /// Missing credential or location; needs operator correction.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The endpoint rejected the credential.
    #[error("api key is invalid")]
    Authentication,
    #[error("failed to get api response: {0}")]
    Transient(String),
}

impl FetchError {
    /// Whether another attempt could succeed without operator action.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Transient(_))
    }
}

#[async_trait]
pub trait ForecastSource: Send + Sync {
    /// Fetch the latest forecast payload
    async fn fetch(&self) -> Result<RawForecast, FetchError>;
}
