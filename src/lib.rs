//! Environmental Flare Risk
//!
//! This library estimates short-term flare risk from ambient weather. It
//! fetches a daily environmental reading through a tiered chain of weather
//! providers (falling back to deterministic synthetic data), scores recent
//! readings, and folds the result together with externally supplied symptom
//! and lifestyle scores into a composite flare index.
//!
//! # Modules
//!
//! - `comfort`: comfort index shared by every source and by risk scoring
//! - `grid`: Lambert Conformal Conic projection onto the KMA forecast grid
//! - `observation_window`: KMA publication schedule
//! - `weather_openweather`, `weather_kma`, `weather_synthetic`: data sources
//! - `weather_provider`: source trait and tiered fetcher
//! - `environmental_risk`: environmental risk analyzer
//! - `flare_index`: composite flare index
//! - `config`: environment-driven configuration
//! - `types`: common types

pub mod comfort;
pub mod config;
pub mod environmental_risk;
pub mod flare_index;
pub mod grid;
pub mod observation_window;
pub mod types;
pub mod weather_kma;
pub mod weather_openweather;
pub mod weather_provider;
pub mod weather_synthetic;

pub use config::{ConfigError, FlareConfig};
pub use grid::{GridProjector, LccGridConfig};
pub use observation_window::{select_window, ObservationWindow, WindowKind};
pub use types::{
    CompositeFlareIndex, EnvironmentalReading, FactorBreakdown, FetchRequest, GridCell,
    Provenance, RiskAssessment, RiskFactor, RiskLevel, SignalAssessment,
};
pub use weather_kma::{KmaError, KmaWeatherService};
pub use weather_openweather::{OpenWeatherError, OpenWeatherService};
pub use weather_provider::{EnvironmentalDataFetcher, FetchError, WeatherSource};

/// Fetch the environmental reading for `date` (`YYYY-MM-DD`).
///
/// `lat`/`lon` override the configured location when given. Never fails.
pub async fn fetch_environmental_data(
    config: &FlareConfig,
    date: &str,
    lat: Option<f64>,
    lon: Option<f64>,
) -> EnvironmentalReading {
    let fetcher = EnvironmentalDataFetcher::from_config(config).with_location(
        lat.unwrap_or(config.latitude),
        lon.unwrap_or(config.longitude),
    );
    fetcher.fetch(date).await
}

/// Score readings ordered oldest to newest.
pub fn analyze_environmental_risk(readings: &[EnvironmentalReading]) -> RiskAssessment {
    environmental_risk::analyze(readings)
}

/// Combine the three signals into the composite flare index.
pub fn aggregate_flare_index(
    symptom: &SignalAssessment,
    environment: &SignalAssessment,
    lifestyle: &SignalAssessment,
) -> CompositeFlareIndex {
    flare_index::aggregate(symptom, environment, lifestyle)
}

/// Combine bare 0-100 scores; each signal's level follows from its score.
pub fn aggregate_flare_index_scores(
    symptom: f64,
    environment: f64,
    lifestyle: f64,
) -> CompositeFlareIndex {
    flare_index::aggregate_scores(symptom, environment, lifestyle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pipeline_without_credentials() {
        let config = FlareConfig::default();
        let reading = fetch_environmental_data(&config, "2024-01-15", None, None).await;
        assert_eq!(reading.provenance, Provenance::Synthetic);

        let assessment = analyze_environmental_risk(&[reading]);
        let index = aggregate_flare_index(
            &SignalAssessment::from_score(0.0),
            &SignalAssessment::from(&assessment),
            &SignalAssessment::from_score(0.0),
        );
        assert!(index.score <= 100);
        assert!(!index.recommendations.is_empty());
        assert!(index.recommendations.len() <= 3);
    }

    #[test]
    fn test_aggregate_from_scores() {
        let index = aggregate_flare_index_scores(80.0, 80.0, 80.0);
        assert_eq!(index.score, 80);
        assert_eq!(index.level, RiskLevel::Critical);
        assert_eq!(index.probability, 80);
    }

    #[tokio::test]
    async fn test_malformed_date_degrades_to_neutral() {
        let config = FlareConfig::default();
        let reading = fetch_environmental_data(&config, "yesterday", Some(35.0), Some(129.0)).await;
        assert_eq!(reading, EnvironmentalReading::neutral("yesterday"));
    }
}
