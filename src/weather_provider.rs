//! Unified Weather Provider
//!
//! Tiered environmental data fetcher. Sources are tried strictly in order:
//! - OpenWeatherMap (live, today only, requires API key)
//! - KMA short-range forecast service (live, requires service key)
//! - Synthetic generator (always answers)
//!
//! Sources never fail towards the fetcher; they either produce a reading or
//! report unavailability, and the fetcher moves on to the next tier.

use crate::config::FlareConfig;
use crate::types::{EnvironmentalReading, FetchRequest};
use crate::weather_kma::KmaWeatherService;
use crate::weather_openweather::OpenWeatherService;
use crate::weather_synthetic;
use async_trait::async_trait;
use chrono::{Days, Local, NaiveDate, NaiveDateTime};
use thiserror::Error;

/// Upper bound on the history `fetch_recent` will walk
pub const MAX_RECENT_DAYS: u32 = 31;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Malformed date {0:?}: expected YYYY-MM-DD")]
    MalformedDate(String),
}

/// A live weather source
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Whether this source can answer the request at all
    fn supports(&self, _request: &FetchRequest) -> bool {
        true
    }

    /// Attempt a reading; `None` means the source is unavailable
    async fn try_fetch(&self, request: &FetchRequest) -> Option<EnvironmentalReading>;
}

/// Fetches one reading per date for a fixed location
pub struct EnvironmentalDataFetcher {
    sources: Vec<Box<dyn WeatherSource>>,
    lat: f64,
    lon: f64,
}

impl EnvironmentalDataFetcher {
    /// A fetcher with no live sources; every fetch is synthetic
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            sources: Vec::new(),
            lat,
            lon,
        }
    }

    /// OpenWeatherMap then KMA, using the configured credentials and location
    pub fn from_config(config: &FlareConfig) -> Self {
        Self::new(config.latitude, config.longitude)
            .with_source(Box::new(OpenWeatherService::new(
                config.openweather_api_key.clone(),
                config.http_timeout,
            )))
            .with_source(Box::new(KmaWeatherService::new(
                config.kma_service_key.clone(),
                config.http_timeout,
            )))
    }

    /// Append a source at the lowest priority so far
    pub fn with_source(mut self, source: Box<dyn WeatherSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|s| s.name()).collect()
    }

    /// Fetch the reading for `date` (`YYYY-MM-DD`) as of the current local time.
    pub async fn fetch(&self, date: &str) -> EnvironmentalReading {
        self.fetch_at(date, Local::now().naive_local()).await
    }

    /// Fetch the reading for `date` as of `now`. Never fails: an unparseable
    /// date yields the neutral default reading.
    pub async fn fetch_at(&self, date: &str, now: NaiveDateTime) -> EnvironmentalReading {
        match self.try_fetch_at(date, now).await {
            Ok(reading) => reading,
            Err(e) => {
                log::warn!("{}, using neutral default reading", e);
                EnvironmentalReading::neutral(date)
            }
        }
    }

    /// Readings for the `days` calendar days ending with the day of `now`,
    /// oldest first. At most [`MAX_RECENT_DAYS`] days are fetched; days
    /// before the representable calendar are skipped.
    pub async fn fetch_recent(&self, days: u32, now: NaiveDateTime) -> Vec<EnvironmentalReading> {
        let today = now.date();
        if days > MAX_RECENT_DAYS {
            log::warn!("Requested {} recent days, capping at {}", days, MAX_RECENT_DAYS);
        }
        let days = days.min(MAX_RECENT_DAYS);
        let mut readings = Vec::new();

        for offset in (0..days).rev() {
            let Some(date) = today.checked_sub_days(Days::new(u64::from(offset))) else {
                continue;
            };
            let date = date.format("%Y-%m-%d").to_string();
            readings.push(self.fetch_at(&date, now).await);
        }

        readings
    }

    async fn try_fetch_at(
        &self,
        date: &str,
        now: NaiveDateTime,
    ) -> Result<EnvironmentalReading, FetchError> {
        let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
            .map_err(|_| FetchError::MalformedDate(date.to_string()))?;

        let request = FetchRequest {
            date,
            now,
            lat: self.lat,
            lon: self.lon,
        };

        for source in &self.sources {
            if !source.supports(&request) {
                log::debug!("Skipping {} for {}", source.name(), date);
                continue;
            }

            if let Some(reading) = source.try_fetch(&request).await {
                log::info!("Environmental data for {} from {}", date, source.name());
                return Ok(reading);
            }
        }

        log::warn!(
            "No live weather source available for {}, using synthetic data",
            date
        );
        Ok(weather_synthetic::generate(date))
    }
}
