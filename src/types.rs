//! Common types shared by the environmental pipeline, the risk analyzer and
//! the flare index aggregator.
//!
//! Every type here is a plain value: created per evaluation request and
//! dropped once the caller has consumed it.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where an environmental reading came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Retrieved from a live weather service
    Live,
    /// Generated locally because no live service answered
    Synthetic,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provenance::Live => write!(f, "live"),
            Provenance::Synthetic => write!(f, "synthetic"),
        }
    }
}

/// One day's environmental conditions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentalReading {
    /// Calendar date, `YYYY-MM-DD`
    pub date: String,
    /// Temperature in °C
    pub temperature: f64,
    /// Relative humidity in percent (0-100)
    pub humidity: f64,
    /// Sea-level pressure in hPa
    pub pressure: f64,
    /// Comfort index, always within [0, 100]
    pub comfort_index: f64,
    pub provenance: Provenance,
}

impl EnvironmentalReading {
    /// Build a reading, deriving the comfort index from the three measurements.
    pub fn new(
        date: impl Into<String>,
        temperature: f64,
        humidity: f64,
        pressure: f64,
        provenance: Provenance,
    ) -> Self {
        let comfort_index = crate::comfort::compute(temperature, humidity, pressure) as f64;
        Self {
            date: date.into(),
            temperature,
            humidity,
            pressure,
            comfort_index,
            provenance,
        }
    }

    /// Neutral reading used when the request itself cannot be interpreted.
    pub fn neutral(date: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            temperature: 20.0,
            humidity: 50.0,
            pressure: 1013.0,
            comfort_index: 70.0,
            provenance: Provenance::Synthetic,
        }
    }

    pub fn is_live(&self) -> bool {
        self.provenance == Provenance::Live
    }
}

/// Discrete cell of the national forecast grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridCell {
    pub nx: i32,
    pub ny: i32,
}

/// Parameters of a single fetch attempt handed to every weather source
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchRequest {
    /// Date the reading is requested for
    pub date: NaiveDate,
    /// Wall-clock time at which the request is made (local time)
    pub now: NaiveDateTime,
    pub lat: f64,
    pub lon: f64,
}

impl FetchRequest {
    /// True when the requested date is the current calendar day
    pub fn is_today(&self) -> bool {
        self.date == self.now.date()
    }
}

/// Risk level shared by every signal and by the composite index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    /// Map a 0-100 score onto a level (≥50 critical, ≥30 high, ≥15 medium).
    pub fn from_score(score: f64) -> Self {
        if score >= 50.0 {
            RiskLevel::Critical
        } else if score >= 30.0 {
            RiskLevel::High
        } else if score >= 15.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    /// High or critical
    pub fn is_elevated(self) -> bool {
        matches!(self, RiskLevel::High | RiskLevel::Critical)
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Environmental variable that contributed to a risk score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RiskFactor {
    Temperature,
    Humidity,
    Pressure,
    ComfortIndex,
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskFactor::Temperature => write!(f, "temperature"),
            RiskFactor::Humidity => write!(f, "humidity"),
            RiskFactor::Pressure => write!(f, "pressure"),
            RiskFactor::ComfortIndex => write!(f, "comfortIndex"),
        }
    }
}

/// Output of the environmental risk analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    /// 0-100
    pub score: u8,
    pub level: RiskLevel,
    /// Distinct factors, in evaluation order
    pub triggered_factors: Vec<RiskFactor>,
    pub narrative: String,
    /// Distinct, ordered suggestions
    pub recommendations: Vec<String>,
}

/// Result shape shared by the symptom, environment and lifestyle analyzers.
///
/// The symptom and lifestyle analyzers live outside this crate; callers hand
/// their results over in this form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalAssessment {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub factors: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl SignalAssessment {
    /// A bare score with no factors or recommendations; the level is derived
    /// from the score.
    pub fn from_score(risk_score: f64) -> Self {
        Self {
            risk_score,
            risk_level: RiskLevel::from_score(risk_score),
            factors: Vec::new(),
            recommendations: Vec::new(),
        }
    }
}

impl From<&RiskAssessment> for SignalAssessment {
    fn from(assessment: &RiskAssessment) -> Self {
        Self {
            risk_score: assessment.score as f64,
            risk_level: assessment.level,
            factors: assessment
                .triggered_factors
                .iter()
                .map(|f| f.to_string())
                .collect(),
            recommendations: assessment.recommendations.clone(),
        }
    }
}

/// Per-signal scores feeding the composite index, each 0-100
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FactorBreakdown {
    pub symptom: u8,
    pub environment: u8,
    pub lifestyle: u8,
}

/// Composite flare index combining the three signals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositeFlareIndex {
    /// Weighted score rounded for display, 0-100
    pub score: u8,
    pub level: RiskLevel,
    /// Estimated flare probability in percent
    pub probability: u8,
    pub factor_breakdown: FactorBreakdown,
    /// At most three distinct suggestions
    pub recommendations: Vec<String>,
}
