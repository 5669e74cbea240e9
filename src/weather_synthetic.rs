//! Synthetic weather
//!
//! Produces a seasonally plausible reading for any calendar date when no live
//! provider answers. Output depends only on the date, so repeated calls for
//! the same day agree without any caching.

use crate::types::{EnvironmentalReading, Provenance};
use chrono::{Datelike, NaiveDate};

/// Meteorological season of a month
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Season {
    Winter,
    Spring,
    Summer,
    Fall,
}

impl Season {
    /// December-February winter, March-May spring, June-August summer,
    /// September-November fall.
    pub fn from_month(month: u32) -> Self {
        match month {
            3..=5 => Season::Spring,
            6..=8 => Season::Summer,
            9..=11 => Season::Fall,
            _ => Season::Winter,
        }
    }

    /// Seasonal (temperature °C, humidity %, pressure hPa)
    fn baseline(self) -> (f64, f64, f64) {
        match self {
            Season::Winter => (2.0, 45.0, 1022.0),
            Season::Spring => (13.0, 55.0, 1015.0),
            Season::Summer => (26.0, 75.0, 1007.0),
            Season::Fall => (15.0, 60.0, 1017.0),
        }
    }
}

const TEMPERATURE_SPREAD: f64 = 3.0;
const HUMIDITY_SPREAD: f64 = 7.5;
const PRESSURE_SPREAD: f64 = 2.0;

/// `YYYYMMDD` read as a number, mod 100: the day of the month (1..=31).
/// Same day in different months or years shares a seed; only the season
/// baseline tells them apart.
fn seed(date: NaiveDate) -> u32 {
    date.day()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Generate the synthetic reading for `date`.
pub fn generate(date: NaiveDate) -> EnvironmentalReading {
    let season = Season::from_month(date.month());
    let (base_temperature, base_humidity, base_pressure) = season.baseline();
    let s = seed(date) as f64;

    let temperature = round1(base_temperature + s.sin() * TEMPERATURE_SPREAD);
    let humidity = round1((base_humidity + (s * 1.3).cos() * HUMIDITY_SPREAD).clamp(0.0, 100.0));
    let pressure = round1(base_pressure + (s * 0.7).sin() * PRESSURE_SPREAD);

    log::debug!(
        "Synthetic weather for {} ({:?}, seed {}): {:.1}°C {:.1}% {:.1}hPa",
        date,
        season,
        s,
        temperature,
        humidity,
        pressure
    );

    EnvironmentalReading::new(
        date.format("%Y-%m-%d").to_string(),
        temperature,
        humidity,
        pressure,
        Provenance::Synthetic,
    )
}
