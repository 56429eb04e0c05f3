// Open-data forecast API client
use crate::application::forecast_source::{FetchError, ForecastSource};
use crate::domain::forecast::RawForecast;
use crate::infrastructure::config::{ApiSettings, LocationSpec};
use anyhow::Context;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CwbForecastClient {
    client: reqwest::Client,
    settings: ApiSettings,
    element_names: Vec<String>,
}

impl CwbForecastClient {
    pub fn new(settings: ApiSettings, element_names: Vec<String>) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            settings,
            element_names,
        })
    }

    /// Request URL; fails before any request when credential or location is missing.
    fn build_request_url(&self) -> Result<String, FetchError> {
        self.settings.validate()?;

        let mut params: Vec<(&str, String)> = vec![
            ("Authorization", self.settings.api_key.clone()),
            ("format", self.settings.format.clone()),
        ];
        match self.settings.location()? {
            LocationSpec::Named(name) => params.push(("locationName", name)),
            LocationSpec::Coordinates {
                latitude,
                longitude,
            } => {
                params.push(("lat", latitude.to_string()));
                params.push(("lon", longitude.to_string()));
            }
        }
        if !self.element_names.is_empty() {
            params.push(("elementName", self.element_names.join(",")));
        }

        let query = params
            .iter()
            .map(|(key, value)| format!("{}={}", key, urlencoding::encode(value)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!(
            "{}/{}?{}",
            self.settings.base_url.trim_end_matches('/'),
            self.settings.data_id,
            query
        ))
    }
}

#[async_trait]
impl ForecastSource for CwbForecastClient {
    async fn fetch(&self) -> Result<RawForecast, FetchError> {
        let url = self.build_request_url()?;

        tracing::debug!("Requesting forecast dataset {}", self.settings.data_id);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| FetchError::Transient(format!("request failed: {}", e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(FetchError::Authentication);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Transient(format!("status {}: {}", status, body)));
        }

        response
            .json::<RawForecast>()
            .await
            .map_err(|e| FetchError::Transient(format!("failed to parse response: {}", e)))
    }
}
