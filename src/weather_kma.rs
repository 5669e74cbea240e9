//! Korea Meteorological Administration (KMA) Weather Provider
//!
//! Secondary live source, backed by the national short-range forecast
//! service on data.go.kr.
//!
//! # Features
//! - Requires a service key from data.go.kr
//! - Addressed by forecast grid cell (see [`crate::grid`]), not lat/lon
//! - Data published on a fixed schedule (see [`crate::observation_window`])
//!
//! # Data Sources
//! - `getUltraSrtNcst`: hourly nowcast observations (temperature `T1H`,
//!   humidity `REH`)
//! - `getVilageFcst`: short-range forecast, read only for pressure
//!
//! A failed forecast call does not fail the reading: pressure falls back to
//! [`DEFAULT_PRESSURE_HPA`].

use crate::grid::GridProjector;
use crate::observation_window::{select_window, ObservationWindow, WindowKind};
use crate::types::{EnvironmentalReading, FetchRequest, GridCell, Provenance};
use crate::weather_provider::WeatherSource;
use async_trait::async_trait;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Pressure used when the forecast call yields nothing
pub const DEFAULT_PRESSURE_HPA: f64 = 1013.0;

const CATEGORY_TEMPERATURE: &str = "T1H";
const CATEGORY_HUMIDITY: &str = "REH";
const CATEGORY_PRESSURE: &str = "PRS";
const RESULT_OK: &str = "00";

/// KMA reports missing values as -999 (or anything at/below -900)
const MISSING_VALUE_FLOOR: f64 = -900.0;
const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = -90.0..=60.0;
const HUMIDITY_RANGE: std::ops::RangeInclusive<f64> = 0.0..=100.0;
const PRESSURE_RANGE: std::ops::RangeInclusive<f64> = 850.0..=1100.0;

/// Parse a KMA value, treating sentinels and non-numbers as absent
fn parse_value(raw: &str) -> Option<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > MISSING_VALUE_FLOOR)
}

#[derive(Error, Debug)]
pub enum KmaError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Service key not configured")]
    NoServiceKey,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Invalid data format: {0}")]
    InvalidData(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KmaResponse {
    pub response: KmaResponseInner,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KmaResponseInner {
    pub header: KmaHeader,
    pub body: Option<KmaBody>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmaHeader {
    pub result_code: String,
    pub result_msg: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmaBody {
    pub data_type: Option<String>,
    pub items: KmaItems,
    pub total_count: Option<i32>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KmaItems {
    #[serde(default)]
    pub item: Vec<KmaItem>,
}

/// One observation or forecast value. Values arrive as strings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KmaItem {
    pub category: String,
    pub obsr_value: Option<String>,
    pub fcst_date: Option<String>,
    pub fcst_time: Option<String>,
    pub fcst_value: Option<String>,
}

impl KmaItem {
    fn forecast_time(&self) -> Option<NaiveDateTime> {
        let date = self.fcst_date.as_deref()?;
        let time = self.fcst_time.as_deref()?;
        NaiveDateTime::parse_from_str(&format!("{}{}", date, time), "%Y%m%d%H%M").ok()
    }
}

/// Nowcast conditions merged with forecast pressure
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KmaConditions {
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// KMA short-range forecast service
pub struct KmaWeatherService {
    service_key: Option<String>,
    client: reqwest::Client,
    base_url: String,
    projector: GridProjector,
}

impl KmaWeatherService {
    const BASE_URL: &'static str = "https://apis.data.go.kr/1360000/VilageFcstInfoService_2.0";
    const NOWCAST_ROWS: u32 = 10;
    const FORECAST_ROWS: u32 = 1000;

    /// Create a new KMA service
    ///
    /// # Arguments
    /// * `service_key` - data.go.kr key; `None` makes every fetch report unavailability
    /// * `timeout` - Per-request timeout
    pub fn new(service_key: Option<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            service_key,
            client,
            base_url: Self::BASE_URL.to_string(),
            projector: GridProjector::default(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn has_service_key(&self) -> bool {
        self.service_key.is_some()
    }

    /// Fetch nowcast temperature/humidity and forecast pressure
    pub async fn fetch_conditions(
        &self,
        lat: f64,
        lon: f64,
        now: NaiveDateTime,
    ) -> Result<KmaConditions, KmaError> {
        let service_key = self.service_key.as_deref().ok_or(KmaError::NoServiceKey)?;
        let cell = self.projector.project(lat, lon);

        log::info!(
            "KMA: Fetching conditions for lat={:.4}°, lon={:.4}° (grid {},{})",
            lat,
            lon,
            cell.nx,
            cell.ny
        );

        let window = select_window(now, WindowKind::Nowcast);
        let items = self
            .request_items(
                "getUltraSrtNcst",
                service_key,
                &window,
                cell,
                Self::NOWCAST_ROWS,
            )
            .await?;

        let temperature = Self::observed_value(&items, CATEGORY_TEMPERATURE)?;
        let humidity = Self::observed_value(&items, CATEGORY_HUMIDITY)?;
        Self::validate_observations(temperature, humidity)?;

        let pressure =
            Self::resolve_pressure(self.fetch_forecast_pressure(service_key, cell, now).await);

        Ok(KmaConditions {
            temperature,
            humidity,
            pressure,
        })
    }

    async fn fetch_forecast_pressure(
        &self,
        service_key: &str,
        cell: GridCell,
        now: NaiveDateTime,
    ) -> Result<Option<f64>, KmaError> {
        let window = select_window(now, WindowKind::Forecast);
        let items = self
            .request_items(
                "getVilageFcst",
                service_key,
                &window,
                cell,
                Self::FORECAST_ROWS,
            )
            .await?;
        Ok(Self::nearest_forecast_value(&items, CATEGORY_PRESSURE, now))
    }

    async fn request_items(
        &self,
        operation: &str,
        service_key: &str,
        window: &ObservationWindow,
        cell: GridCell,
        rows: u32,
    ) -> Result<Vec<KmaItem>, KmaError> {
        let url = format!("{}/{}", self.base_url, operation);
        log::debug!(
            "KMA: Requesting {} base={} {} grid={},{}",
            url,
            window.base_date,
            window.base_time,
            cell.nx,
            cell.ny
        );

        let response = self
            .client
            .get(&url)
            .query(&[
                ("serviceKey", service_key.to_string()),
                ("pageNo", "1".to_string()),
                ("numOfRows", rows.to_string()),
                ("dataType", "JSON".to_string()),
                ("base_date", window.base_date.clone()),
                ("base_time", window.base_time.clone()),
                ("nx", cell.nx.to_string()),
                ("ny", cell.ny.to_string()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KmaError::ApiError(format!(
                "API returned status {}: {}",
                status, body
            )));
        }

        let body = response.text().await?;
        Self::parse_items(&body)
    }

    /// Parse a response body into its item list
    fn parse_items(body: &str) -> Result<Vec<KmaItem>, KmaError> {
        let parsed: KmaResponse = serde_json::from_str(body)?;
        let header = parsed.response.header;

        if header.result_code != RESULT_OK {
            return Err(KmaError::ApiError(format!(
                "{}: {}",
                header.result_code, header.result_msg
            )));
        }

        let body = parsed
            .response
            .body
            .ok_or_else(|| KmaError::InvalidData("Missing response body".to_string()))?;
        Ok(body.items.item)
    }

    fn observed_value(items: &[KmaItem], category: &str) -> Result<f64, KmaError> {
        items
            .iter()
            .find(|item| item.category == category)
            .and_then(|item| item.obsr_value.as_deref())
            .and_then(parse_value)
            .ok_or_else(|| KmaError::InvalidData(format!("Missing observation {}", category)))
    }

    fn validate_observations(temperature: f64, humidity: f64) -> Result<(), KmaError> {
        if !TEMPERATURE_RANGE.contains(&temperature) {
            return Err(KmaError::InvalidData(format!(
                "Temperature out of range: {}",
                temperature
            )));
        }
        if !HUMIDITY_RANGE.contains(&humidity) {
            return Err(KmaError::InvalidData(format!(
                "Humidity out of range: {}",
                humidity
            )));
        }
        Ok(())
    }

    /// Pressure from the forecast outcome; anything unusable becomes the default
    fn resolve_pressure(forecast: Result<Option<f64>, KmaError>) -> f64 {
        match forecast {
            Ok(Some(pressure)) if PRESSURE_RANGE.contains(&pressure) => pressure,
            Ok(Some(pressure)) => {
                log::warn!(
                    "KMA: Implausible forecast pressure {}, using {}",
                    pressure,
                    DEFAULT_PRESSURE_HPA
                );
                DEFAULT_PRESSURE_HPA
            }
            Ok(None) => {
                log::debug!("KMA: No pressure in forecast, using {}", DEFAULT_PRESSURE_HPA);
                DEFAULT_PRESSURE_HPA
            }
            Err(e) => {
                log::warn!(
                    "KMA: Forecast call failed ({}), using pressure {}",
                    e,
                    DEFAULT_PRESSURE_HPA
                );
                DEFAULT_PRESSURE_HPA
            }
        }
    }

    /// Value of `category` at the forecast slot closest to `now`
    fn nearest_forecast_value(items: &[KmaItem], category: &str, now: NaiveDateTime) -> Option<f64> {
        let target = now.with_minute(0).and_then(|t| t.with_second(0)).unwrap_or(now);

        items
            .iter()
            .filter(|item| item.category == category)
            .filter_map(|item| {
                let slot = item.forecast_time()?;
                let value = parse_value(item.fcst_value.as_deref()?)?;
                Some(((slot - target).num_minutes().abs(), value))
            })
            .min_by_key(|(distance, _)| *distance)
            .map(|(_, value)| value)
    }
}

#[async_trait]
impl WeatherSource for KmaWeatherService {
    fn name(&self) -> &'static str {
        "kma"
    }

    async fn try_fetch(&self, request: &FetchRequest) -> Option<EnvironmentalReading> {
        match self
            .fetch_conditions(request.lat, request.lon, request.now)
            .await
        {
            Ok(conditions) => Some(EnvironmentalReading::new(
                request.date.format("%Y-%m-%d").to_string(),
                conditions.temperature,
                conditions.humidity,
                conditions.pressure,
                Provenance::Live,
            )),
            Err(e) => {
                log::warn!("KMA unavailable: {}", e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const NOWCAST_BODY: &str = r#"{"response":{"header":{"resultCode":"00","resultMsg":"NORMAL_SERVICE"},
        "body":{"dataType":"JSON","items":{"item":[
            {"baseDate":"20240615","baseTime":"1400","category":"PTY","nx":60,"ny":127,"obsrValue":"0"},
            {"baseDate":"20240615","baseTime":"1400","category":"REH","nx":60,"ny":127,"obsrValue":"62"},
            {"baseDate":"20240615","baseTime":"1400","category":"T1H","nx":60,"ny":127,"obsrValue":"24.3"}
        ]},"pageNo":1,"numOfRows":10,"totalCount":3}}}"#;

    fn at(date: &str, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    fn forecast_item(category: &str, date: &str, time: &str, value: &str) -> KmaItem {
        KmaItem {
            category: category.to_string(),
            obsr_value: None,
            fcst_date: Some(date.to_string()),
            fcst_time: Some(time.to_string()),
            fcst_value: Some(value.to_string()),
        }
    }

    #[test]
    fn test_parse_nowcast() {
        let items = KmaWeatherService::parse_items(NOWCAST_BODY).unwrap();
        assert_eq!(items.len(), 3);
        assert_eq!(
            KmaWeatherService::observed_value(&items, CATEGORY_TEMPERATURE).unwrap(),
            24.3
        );
        assert_eq!(
            KmaWeatherService::observed_value(&items, CATEGORY_HUMIDITY).unwrap(),
            62.0
        );
    }

    #[test]
    fn test_missing_category_is_invalid() {
        let items = KmaWeatherService::parse_items(NOWCAST_BODY).unwrap();
        assert!(matches!(
            KmaWeatherService::observed_value(&items, "XYZ"),
            Err(KmaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_error_result_code() {
        let body = r#"{"response":{"header":{"resultCode":"03","resultMsg":"NO_DATA"}}}"#;
        match KmaWeatherService::parse_items(body) {
            Err(KmaError::ApiError(msg)) => assert_eq!(msg, "03: NO_DATA"),
            other => panic!("unexpected result: {:?}", other.map(|i| i.len())),
        }
    }

    #[test]
    fn test_non_json_body() {
        let body = "<OpenAPI_ServiceResponse><cmmMsgHeader>SERVICE KEY IS NOT REGISTERED</cmmMsgHeader></OpenAPI_ServiceResponse>";
        assert!(matches!(
            KmaWeatherService::parse_items(body),
            Err(KmaError::JsonError(_))
        ));
    }

    #[test]
    fn test_nearest_forecast_value() {
        let items = vec![
            forecast_item("PRS", "20240615", "1400", "1008"),
            forecast_item("PRS", "20240615", "1500", "1009"),
            forecast_item("PRS", "20240615", "1800", "1011"),
            forecast_item("TMP", "20240615", "1500", "25"),
        ];
        let now = at("2024-06-15", 15, 20);
        assert_eq!(
            KmaWeatherService::nearest_forecast_value(&items, "PRS", now),
            Some(1009.0)
        );
        assert_eq!(
            KmaWeatherService::nearest_forecast_value(&items, "WSD", now),
            None
        );
    }

    #[test]
    fn test_missing_and_non_numeric_values_rejected() {
        let body = r#"{"response":{"header":{"resultCode":"00","resultMsg":"NORMAL_SERVICE"},
            "body":{"dataType":"JSON","items":{"item":[
                {"category":"REH","obsrValue":"-999"},
                {"category":"T1H","obsrValue":"NaN"}
            ]}}}}"#;
        let items = KmaWeatherService::parse_items(body).unwrap();
        assert!(matches!(
            KmaWeatherService::observed_value(&items, CATEGORY_HUMIDITY),
            Err(KmaError::InvalidData(_))
        ));
        assert!(matches!(
            KmaWeatherService::observed_value(&items, CATEGORY_TEMPERATURE),
            Err(KmaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_observation_ranges() {
        assert!(KmaWeatherService::validate_observations(24.3, 62.0).is_ok());
        assert!(matches!(
            KmaWeatherService::validate_observations(24.3, 140.0),
            Err(KmaError::InvalidData(_))
        ));
        assert!(matches!(
            KmaWeatherService::validate_observations(150.0, 50.0),
            Err(KmaError::InvalidData(_))
        ));
    }

    #[test]
    fn test_forecast_skips_missing_values() {
        let items = vec![
            forecast_item("PRS", "20240615", "1500", "-999"),
            forecast_item("PRS", "20240615", "1800", "1011"),
        ];
        assert_eq!(
            KmaWeatherService::nearest_forecast_value(&items, "PRS", at("2024-06-15", 15, 0)),
            Some(1011.0)
        );
    }

    #[test]
    fn test_resolve_pressure() {
        assert_eq!(KmaWeatherService::resolve_pressure(Ok(Some(1009.0))), 1009.0);
        assert_eq!(
            KmaWeatherService::resolve_pressure(Ok(None)),
            DEFAULT_PRESSURE_HPA
        );
        assert_eq!(
            KmaWeatherService::resolve_pressure(Ok(Some(12.0))),
            DEFAULT_PRESSURE_HPA
        );
        assert_eq!(
            KmaWeatherService::resolve_pressure(Err(KmaError::ApiError(
                "API returned status 500".to_string()
            ))),
            DEFAULT_PRESSURE_HPA
        );
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let service = KmaWeatherService::new(Some("key".to_string()), Duration::from_secs(2))
            .with_base_url("http://127.0.0.1:9");
        let request = FetchRequest {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            now: at("2024-06-15", 14, 10),
            lat: 37.5665,
            lon: 126.978,
        };
        assert!(matches!(
            service
                .fetch_conditions(request.lat, request.lon, request.now)
                .await,
            Err(KmaError::HttpError(_))
        ));
        assert!(service.try_fetch(&request).await.is_none());
    }

    #[tokio::test]
    async fn test_missing_key_is_unavailable() {
        let service = KmaWeatherService::new(None, Duration::from_secs(5));
        assert!(!service.has_service_key());
        let request = FetchRequest {
            date: NaiveDate::from_ymd_opt(2024, 6, 15).unwrap(),
            now: at("2024-06-15", 14, 10),
            lat: 37.5665,
            lon: 126.978,
        };
        assert!(matches!(
            service
                .fetch_conditions(request.lat, request.lon, request.now)
                .await,
            Err(KmaError::NoServiceKey)
        ));
        assert!(service.try_fetch(&request).await.is_none());
    }
}
