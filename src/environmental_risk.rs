//! Environmental flare risk
//!
//! Scores the most recent readings (up to three) against fixed thresholds.
//! Each factor adds an independent penalty; the total is clamped to 0-100
//! and mapped onto a [`RiskLevel`].

use crate::types::{EnvironmentalReading, RiskAssessment, RiskFactor, RiskLevel};

/// Number of most recent readings considered
pub const WINDOW: usize = 3;

const NARRATIVE_EMPTY: &str = "No environmental data available; flare risk from weather cannot be assessed.";
const RECOMMEND_DEFAULT: &str = "Maintain current conditions and routines.";
const RECOMMEND_COLD: &str = "Keep warm and avoid sudden exposure to cold air.";
const RECOMMEND_HOT: &str = "Stay cool, drink plenty of water and avoid prolonged heat exposure.";
const RECOMMEND_DRY: &str = "Use a humidifier and stay well hydrated.";
const RECOMMEND_HUMID: &str = "Use a dehumidifier or air conditioning to reduce indoor humidity.";
const RECOMMEND_PRESSURE: &str =
    "Atmospheric pressure is shifting; pace your activities and watch for early symptoms.";
const RECOMMEND_COMFORT: &str = "Overall conditions are uncomfortable; limit time outdoors.";

fn narrative_prefix(level: RiskLevel) -> &'static str {
    match level {
        RiskLevel::Low => "Environmental conditions pose little flare risk",
        RiskLevel::Medium => "Environmental conditions may slightly raise flare risk",
        RiskLevel::High => "Environmental conditions are raising flare risk",
        RiskLevel::Critical => "Environmental conditions pose a serious flare risk",
    }
}

/// Averages over the analysis window
#[derive(Debug, Clone, Copy, PartialEq)]
struct WindowSummary {
    temperature: f64,
    humidity: f64,
    comfort_index: f64,
    /// |newest - oldest|, only with two or more readings
    pressure_change: Option<f64>,
}

impl WindowSummary {
    fn of(window: &[EnvironmentalReading]) -> Option<Self> {
        let (first, last) = (window.first()?, window.last()?);

        Some(Self {
            temperature: mean(window, |r| r.temperature),
            humidity: mean(window, |r| r.humidity),
            comfort_index: mean(window, |r| r.comfort_index),
            pressure_change: (window.len() >= 2).then(|| (last.pressure - first.pressure).abs()),
        })
    }
}

fn mean(window: &[EnvironmentalReading], field: impl Fn(&EnvironmentalReading) -> f64) -> f64 {
    window.iter().map(field).sum::<f64>() / window.len() as f64
}

/// One triggered factor: its penalty, description and suggestion
struct Finding {
    factor: RiskFactor,
    penalty: u32,
    fragment: String,
    recommendation: &'static str,
}

fn temperature_finding(mean: f64) -> Option<Finding> {
    let (penalty, fragment, recommendation) = if mean < 5.0 {
        (20, "very low temperature", RECOMMEND_COLD)
    } else if mean > 30.0 {
        (20, "very high temperature", RECOMMEND_HOT)
    } else if mean < 10.0 {
        (10, "low temperature", RECOMMEND_COLD)
    } else if mean > 28.0 {
        (10, "high temperature", RECOMMEND_HOT)
    } else {
        return None;
    };

    Some(Finding {
        factor: RiskFactor::Temperature,
        penalty,
        fragment: format!("{} ({:.1}°C)", fragment, mean),
        recommendation,
    })
}

fn humidity_finding(mean: f64) -> Option<Finding> {
    let (penalty, fragment, recommendation) = if mean < 30.0 {
        (15, "very dry air", RECOMMEND_DRY)
    } else if mean > 80.0 {
        (15, "very humid air", RECOMMEND_HUMID)
    } else if mean < 35.0 {
        (8, "dry air", RECOMMEND_DRY)
    } else if mean > 75.0 {
        (8, "humid air", RECOMMEND_HUMID)
    } else {
        return None;
    };

    Some(Finding {
        factor: RiskFactor::Humidity,
        penalty,
        fragment: format!("{} ({:.0}%)", fragment, mean),
        recommendation,
    })
}

fn pressure_finding(change: f64) -> Option<Finding> {
    let (penalty, fragment) = if change > 10.0 {
        (15, "sharp pressure change")
    } else if change > 5.0 {
        (8, "pressure change")
    } else {
        return None;
    };

    Some(Finding {
        factor: RiskFactor::Pressure,
        penalty,
        fragment: format!("{} ({:.1}hPa)", fragment, change),
        recommendation: RECOMMEND_PRESSURE,
    })
}

fn comfort_finding(mean: f64) -> Option<Finding> {
    let (penalty, fragment) = if mean < 40.0 {
        (20, "very low comfort index")
    } else if mean < 50.0 {
        (10, "low comfort index")
    } else {
        return None;
    };

    Some(Finding {
        factor: RiskFactor::ComfortIndex,
        penalty,
        fragment: format!("{} ({:.0})", fragment, mean),
        recommendation: RECOMMEND_COMFORT,
    })
}

/// Assessment returned for an empty input
pub fn empty_assessment() -> RiskAssessment {
    RiskAssessment {
        score: 0,
        level: RiskLevel::Low,
        triggered_factors: Vec::new(),
        narrative: NARRATIVE_EMPTY.to_string(),
        recommendations: vec![RECOMMEND_DEFAULT.to_string()],
    }
}

/// Analyze readings ordered oldest to newest.
pub fn analyze(readings: &[EnvironmentalReading]) -> RiskAssessment {
    let window = &readings[readings.len().saturating_sub(WINDOW)..];
    let summary = match WindowSummary::of(window) {
        Some(summary) => summary,
        None => {
            log::debug!("No readings to analyze");
            return empty_assessment();
        }
    };

    let findings: Vec<Finding> = [
        temperature_finding(summary.temperature),
        humidity_finding(summary.humidity),
        summary.pressure_change.and_then(pressure_finding),
        comfort_finding(summary.comfort_index),
    ]
    .into_iter()
    .flatten()
    .collect();

    let total: u32 = findings.iter().map(|f| f.penalty).sum();
    let score = total.min(100) as u8;
    let level = RiskLevel::from_score(score as f64);

    let mut narrative = narrative_prefix(level).to_string();
    if findings.is_empty() {
        narrative.push('.');
    } else {
        let fragments: Vec<&str> = findings.iter().map(|f| f.fragment.as_str()).collect();
        narrative.push_str(": ");
        narrative.push_str(&fragments.join(", "));
        narrative.push('.');
    }

    let mut recommendations: Vec<String> = Vec::new();
    for finding in &findings {
        if !recommendations.iter().any(|r| r == finding.recommendation) {
            recommendations.push(finding.recommendation.to_string());
        }
    }
    if recommendations.is_empty() {
        recommendations.push(RECOMMEND_DEFAULT.to_string());
    }

    log::debug!(
        "Environmental risk over {} reading(s): score {} ({})",
        window.len(),
        score,
        level
    );

    RiskAssessment {
        score,
        level,
        triggered_factors: findings.iter().map(|f| f.factor).collect(),
        narrative,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Provenance;

    fn reading(temperature: f64, humidity: f64, pressure: f64, comfort_index: f64) -> EnvironmentalReading {
        EnvironmentalReading {
            date: "2024-01-10".to_string(),
            temperature,
            humidity,
            pressure,
            comfort_index,
            provenance: Provenance::Synthetic,
        }
    }

    #[test]
    fn test_empty_input() {
        let assessment = analyze(&[]);
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert!(assessment.triggered_factors.is_empty());
        assert!(!assessment.narrative.is_empty());
        assert_eq!(assessment.recommendations, vec![RECOMMEND_DEFAULT]);
    }

    #[test]
    fn test_all_factors_critical() {
        let readings = vec![
            reading(1.0, 84.0, 1000.0, 34.0),
            reading(2.0, 85.0, 1006.0, 35.0),
            reading(3.0, 86.0, 1012.0, 36.0),
        ];
        let assessment = analyze(&readings);
        assert_eq!(assessment.score, 70);
        assert_eq!(assessment.level, RiskLevel::Critical);
        assert_eq!(
            assessment.triggered_factors,
            vec![
                RiskFactor::Temperature,
                RiskFactor::Humidity,
                RiskFactor::Pressure,
                RiskFactor::ComfortIndex
            ]
        );
        assert_eq!(
            assessment.recommendations,
            vec![RECOMMEND_COLD, RECOMMEND_HUMID, RECOMMEND_PRESSURE, RECOMMEND_COMFORT]
        );
        assert!(assessment
            .narrative
            .starts_with("Environmental conditions pose a serious flare risk: "));
        assert!(assessment.narrative.contains("sharp pressure change (12.0hPa)"));
    }

    #[test]
    fn test_comfortable_conditions() {
        let readings = vec![reading(20.0, 50.0, 1013.0, 100.0), reading(21.0, 52.0, 1014.0, 100.0)];
        let assessment = analyze(&readings);
        assert_eq!(assessment.score, 0);
        assert_eq!(assessment.level, RiskLevel::Low);
        assert_eq!(
            assessment.narrative,
            "Environmental conditions pose little flare risk."
        );
        assert_eq!(assessment.recommendations, vec![RECOMMEND_DEFAULT]);
    }

    #[test]
    fn test_only_last_three_readings() {
        let readings = vec![
            reading(-10.0, 10.0, 950.0, 0.0),
            reading(20.0, 50.0, 1013.0, 100.0),
            reading(20.0, 50.0, 1013.0, 100.0),
            reading(20.0, 50.0, 1013.0, 100.0),
        ];
        assert_eq!(analyze(&readings).score, 0);
    }

    #[test]
    fn test_single_reading_has_no_pressure_change() {
        let assessment = analyze(&[reading(20.0, 50.0, 900.0, 80.0)]);
        assert!(!assessment.triggered_factors.contains(&RiskFactor::Pressure));
    }

    #[test]
    fn test_moderate_bands() {
        // 10 (warm) + 8 (dry) + 8 (pressure 6hPa) + 10 (comfort 45)
        let readings = vec![reading(29.0, 33.0, 1010.0, 45.0), reading(29.0, 33.0, 1016.0, 45.0)];
        let assessment = analyze(&readings);
        assert_eq!(assessment.score, 36);
        assert_eq!(assessment.level, RiskLevel::High);
        assert_eq!(
            assessment.recommendations,
            vec![RECOMMEND_HOT, RECOMMEND_DRY, RECOMMEND_PRESSURE, RECOMMEND_COMFORT]
        );
    }

    #[test]
    fn test_band_edges() {
        assert!(temperature_finding(10.0).is_none());
        assert!(temperature_finding(28.0).is_none());
        assert_eq!(temperature_finding(5.0).map(|f| f.penalty), Some(10));
        assert_eq!(temperature_finding(30.0).map(|f| f.penalty), Some(10));
        assert!(humidity_finding(35.0).is_none());
        assert!(humidity_finding(75.0).is_none());
        assert_eq!(humidity_finding(80.0).map(|f| f.penalty), Some(8));
        assert!(pressure_finding(5.0).is_none());
        assert_eq!(pressure_finding(10.0).map(|f| f.penalty), Some(8));
        assert!(comfort_finding(50.0).is_none());
        assert_eq!(comfort_finding(40.0).map(|f| f.penalty), Some(10));
    }

    #[test]
    fn test_medium_level() {
        // Only a humid window: 15 points
        let assessment = analyze(&[reading(20.0, 90.0, 1013.0, 60.0)]);
        assert_eq!(assessment.score, 15);
        assert_eq!(assessment.level, RiskLevel::Medium);
        assert_eq!(assessment.recommendations, vec![RECOMMEND_HUMID]);
    }
}
