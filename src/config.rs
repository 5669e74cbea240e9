//! Runtime configuration
//!
//! Credentials and location come from the process environment:
//! - `OPENWEATHER_API_KEY`: OpenWeatherMap key (optional)
//! - `KMA_SERVICE_KEY`: data.go.kr service key (optional)
//! - `FLARE_LATITUDE` / `FLARE_LONGITUDE`: location in degrees
//! - `FLARE_HTTP_TIMEOUT_SECS`: per-request timeout for weather providers
//!
//! With neither key set the pipeline runs on synthetic data only.

use std::time::Duration;
use thiserror::Error;

/// Seoul City Hall
pub const DEFAULT_LATITUDE: f64 = 37.5665;
pub const DEFAULT_LONGITUDE: f64 = 126.9780;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },

    #[error("Latitude out of range: {0}")]
    LatitudeOutOfRange(f64),

    #[error("Longitude out of range: {0}")]
    LongitudeOutOfRange(f64),

    #[error("HTTP timeout must be positive")]
    ZeroTimeout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlareConfig {
    pub openweather_api_key: Option<String>,
    pub kma_service_key: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub http_timeout: Duration,
}

impl Default for FlareConfig {
    fn default() -> Self {
        Self {
            openweather_api_key: None,
            kma_service_key: None,
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }
}

impl FlareConfig {
    /// Load from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = |name: &str| {
            lookup(name)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
        };

        let mut config = Self {
            openweather_api_key: credential("OPENWEATHER_API_KEY"),
            kma_service_key: credential("KMA_SERVICE_KEY"),
            ..Self::default()
        };

        if let Some(lat) = parse_var(&lookup, "FLARE_LATITUDE")? {
            config.latitude = lat;
        }
        if let Some(lon) = parse_var(&lookup, "FLARE_LONGITUDE")? {
            config.longitude = lon;
        }
        if let Some(secs) = parse_var::<u64, _>(&lookup, "FLARE_HTTP_TIMEOUT_SECS")? {
            config.http_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-90.0..=90.0).contains(&self.latitude) {
            return Err(ConfigError::LatitudeOutOfRange(self.latitude));
        }
        if !(-180.0..=180.0).contains(&self.longitude) {
            return Err(ConfigError::LongitudeOutOfRange(self.longitude));
        }
        if self.http_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }

    /// True when no live source can be used
    pub fn is_synthetic_only(&self) -> bool {
        self.openweather_api_key.is_none() && self.kma_service_key.is_none()
    }
}

fn parse_var<T, F>(lookup: &F, name: &'static str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FlareConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, FlareConfig::default());
        assert!(config.is_synthetic_only());
    }

    #[test]
    fn test_credentials_and_location() {
        let config = FlareConfig::from_lookup(lookup(&[
            ("OPENWEATHER_API_KEY", "abc"),
            ("KMA_SERVICE_KEY", "   "),
            ("FLARE_LATITUDE", "35.1796"),
            ("FLARE_LONGITUDE", "129.0756"),
            ("FLARE_HTTP_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.openweather_api_key.as_deref(), Some("abc"));
        assert_eq!(config.kma_service_key, None);
        assert_eq!(config.latitude, 35.1796);
        assert_eq!(config.longitude, 129.0756);
        assert_eq!(config.http_timeout, Duration::from_secs(3));
        assert!(!config.is_synthetic_only());
    }

    #[test]
    fn test_invalid_values() {
        assert_eq!(
            FlareConfig::from_lookup(lookup(&[("FLARE_LATITUDE", "north")])),
            Err(ConfigError::InvalidValue {
                name: "FLARE_LATITUDE",
                value: "north".to_string()
            })
        );
        assert_eq!(
            FlareConfig::from_lookup(lookup(&[("FLARE_LONGITUDE", "200")])),
            Err(ConfigError::LongitudeOutOfRange(200.0))
        );
        assert_eq!(
            FlareConfig::from_lookup(lookup(&[("FLARE_HTTP_TIMEOUT_SECS", "0")])),
            Err(ConfigError::ZeroTimeout)
        );
    }
}
