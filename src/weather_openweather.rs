//! OpenWeatherMap Weather Provider
//!
//! Primary live source. Reads current conditions from the OpenWeatherMap
//! `weather` endpoint.
//!
//! # Features
//! - Requires an API key from https://openweathermap.org
//! - Current conditions only, so it can only answer for today
//! - Metric units (°C, %, hPa)

use crate::types::{EnvironmentalReading, FetchRequest, Provenance};
use crate::weather_provider::WeatherSource;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpenWeatherError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("API key not configured")]
    NoApiKey,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

/// `main` block of the current weather response
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenWeatherMain {
    pub temp: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// Current weather response (only the fields this crate reads)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OpenWeatherCurrent {
    pub main: OpenWeatherMain,
    pub name: Option<String>,
}

/// OpenWeatherMap service
pub struct OpenWeatherService {
    api_key: Option<String>,
    client: reqwest::Client,
    base_url: String,
}

impl OpenWeatherService {
    const BASE_URL: &'static str = "https://api.openweathermap.org/data/2.5";

    /// Create a new OpenWeatherMap service
    ///
    /// # Arguments
    /// * `api_key` - API key; `None` makes every fetch report unavailability
    /// * `timeout` - Per-request timeout
    pub fn new(api_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            api_key,
            client,
            base_url: Self::BASE_URL.to_string(),
        }
    }

    /// Point the service at another host (proxies, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Fetch current conditions for a location
    pub async fn fetch_current(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<OpenWeatherCurrent, OpenWeatherError> {
        let api_key = self.api_key.as_ref().ok_or(OpenWeatherError::NoApiKey)?;

        let url = format!("{}/weather", self.base_url);
        log::debug!(
            "OpenWeatherMap: Requesting {}?lat={}&lon={}&units=metric",
            url,
            lat,
            lon
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("appid", api_key.clone()),
                ("units", "metric".to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OpenWeatherError::ApiError(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        Self::parse_current(&body)
    }

    /// Parse and sanity-check a current weather body
    fn parse_current(body: &str) -> Result<OpenWeatherCurrent, OpenWeatherError> {
        let current: OpenWeatherCurrent = serde_json::from_str(body)?;
        let main = &current.main;

        if !main.temp.is_finite() || !main.pressure.is_finite() {
            return Err(OpenWeatherError::InvalidData(
                "Non-finite temperature or pressure".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&main.humidity) {
            return Err(OpenWeatherError::InvalidData(format!(
                "Humidity out of range: {}",
                main.humidity
            )));
        }

        Ok(current)
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherService {
    fn name(&self) -> &'static str {
        "openweathermap"
    }

    fn supports(&self, request: &FetchRequest) -> bool {
        request.is_today()
    }

    async fn try_fetch(&self, request: &FetchRequest) -> Option<EnvironmentalReading> {
        match self.fetch_current(request.lat, request.lon).await {
            Ok(current) => {
                log::info!(
                    "OpenWeatherMap: {:.1}°C {:.0}% {:.0}hPa at {}",
                    current.main.temp,
                    current.main.humidity,
                    current.main.pressure,
                    current.name.as_deref().unwrap_or("unknown location")
                );
                Some(EnvironmentalReading::new(
                    request.date.format("%Y-%m-%d").to_string(),
                    current.main.temp,
                    current.main.humidity,
                    current.main.pressure,
                    Provenance::Live,
                ))
            }
            Err(e) => {
                log::warn!("OpenWeatherMap unavailable: {}", e);
                None
            }
        }
    }
}
