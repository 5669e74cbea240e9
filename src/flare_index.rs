//! Composite flare index
//!
//! Weighted combination of the symptom, environment and lifestyle signals.
//! Level and probability come from the unrounded weighted sum; only the
//! reported score is rounded.

use crate::types::{CompositeFlareIndex, FactorBreakdown, RiskLevel, SignalAssessment};

pub const SYMPTOM_WEIGHT: f64 = 0.4;
pub const ENVIRONMENT_WEIGHT: f64 = 0.3;
pub const LIFESTYLE_WEIGHT: f64 = 0.3;

/// Maximum number of recommendations on the composite index
pub const MAX_RECOMMENDATIONS: usize = 3;

const SYMPTOM_ALERT: &str =
    "Early warning symptoms are elevated; consider contacting your care team.";
const DEFAULT_RECOMMENDATION: &str =
    "Maintain your current routine and keep monitoring how you feel.";

/// (level, probability %) of a weighted score
fn classify(weighted: f64) -> (RiskLevel, u8) {
    if weighted >= 70.0 {
        (RiskLevel::Critical, 80)
    } else if weighted >= 50.0 {
        (RiskLevel::High, 60)
    } else if weighted >= 30.0 {
        (RiskLevel::Medium, 40)
    } else {
        (RiskLevel::Low, 15)
    }
}

fn bounded(score: f64) -> f64 {
    if score.is_finite() {
        score.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

fn collect_recommendations(
    symptom: &SignalAssessment,
    environment: &SignalAssessment,
    lifestyle: &SignalAssessment,
) -> Vec<String> {
    let mut candidates: Vec<&str> = Vec::new();
    if symptom.risk_level.is_elevated() {
        if symptom.recommendations.is_empty() {
            candidates.push(SYMPTOM_ALERT);
        } else {
            candidates.extend(symptom.recommendations.iter().map(String::as_str));
        }
    }
    if environment.risk_level.is_elevated() {
        candidates.extend(environment.recommendations.iter().map(String::as_str));
    }
    if lifestyle.risk_level.is_elevated() {
        candidates.extend(lifestyle.recommendations.iter().map(String::as_str));
    }

    let mut recommendations: Vec<String> = Vec::new();
    for candidate in candidates {
        if !recommendations.iter().any(|r| r == candidate) {
            recommendations.push(candidate.to_string());
        }
    }
    recommendations.truncate(MAX_RECOMMENDATIONS);

    if recommendations.is_empty() {
        recommendations.push(DEFAULT_RECOMMENDATION.to_string());
    }
    recommendations
}

/// Combine the three signals into one index.
pub fn aggregate(
    symptom: &SignalAssessment,
    environment: &SignalAssessment,
    lifestyle: &SignalAssessment,
) -> CompositeFlareIndex {
    let symptom_score = bounded(symptom.risk_score);
    let environment_score = bounded(environment.risk_score);
    let lifestyle_score = bounded(lifestyle.risk_score);

    let weighted = bounded(
        SYMPTOM_WEIGHT * symptom_score
            + ENVIRONMENT_WEIGHT * environment_score
            + LIFESTYLE_WEIGHT * lifestyle_score,
    );
    let (level, probability) = classify(weighted);

    log::debug!(
        "Flare index: symptom {:.1}, environment {:.1}, lifestyle {:.1} -> {:.2} ({})",
        symptom_score,
        environment_score,
        lifestyle_score,
        weighted,
        level
    );

    CompositeFlareIndex {
        score: weighted.round() as u8,
        level,
        probability,
        factor_breakdown: FactorBreakdown {
            symptom: symptom_score.round() as u8,
            environment: environment_score.round() as u8,
            lifestyle: lifestyle_score.round() as u8,
        },
        recommendations: collect_recommendations(symptom, environment, lifestyle),
    }
}

/// Aggregate bare scores; each signal's level is derived from its score.
pub fn aggregate_scores(symptom: f64, environment: f64, lifestyle: f64) -> CompositeFlareIndex {
    aggregate(
        &SignalAssessment::from_score(symptom),
        &SignalAssessment::from_score(environment),
        &SignalAssessment::from_score(lifestyle),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(score: f64, level: RiskLevel, recommendations: &[&str]) -> SignalAssessment {
        SignalAssessment {
            risk_score: score,
            risk_level: level,
            factors: Vec::new(),
            recommendations: recommendations.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_all_high() {
        let index = aggregate_scores(80.0, 80.0, 80.0);
        assert_eq!(index.score, 80);
        assert_eq!(index.level, RiskLevel::Critical);
        assert_eq!(index.probability, 80);
        assert_eq!(
            index.factor_breakdown,
            FactorBreakdown {
                symptom: 80,
                environment: 80,
                lifestyle: 80
            }
        );
    }

    #[test]
    fn test_all_zero() {
        let index = aggregate_scores(0.0, 0.0, 0.0);
        assert_eq!(index.score, 0);
        assert_eq!(index.level, RiskLevel::Low);
        assert_eq!(index.probability, 15);
        assert_eq!(index.recommendations, vec![DEFAULT_RECOMMENDATION]);
    }

    #[test]
    fn test_thresholds_use_unrounded_sum() {
        // 0.4*50 + 0.3*66 + 0.3*66 = 59.6, rounds to 60 but stays "high"
        let index = aggregate_scores(50.0, 66.0, 66.0);
        assert_eq!(index.score, 60);
        assert_eq!(index.level, RiskLevel::High);
        assert_eq!(index.probability, 60);

        // 0.4*69.9 + 0.3*69.9 + 0.3*69.9 = 69.9, displayed as 70 but not critical
        let index = aggregate_scores(69.9, 69.9, 69.9);
        assert_eq!(index.score, 70);
        assert_eq!(index.level, RiskLevel::High);
    }

    #[test]
    fn test_medium_band() {
        let index = aggregate_scores(30.0, 30.0, 30.0);
        assert_eq!(index.level, RiskLevel::Medium);
        assert_eq!(index.probability, 40);
    }

    #[test]
    fn test_out_of_range_inputs_are_clamped() {
        let index = aggregate_scores(250.0, -20.0, f64::NAN);
        assert_eq!(index.factor_breakdown.symptom, 100);
        assert_eq!(index.factor_breakdown.environment, 0);
        assert_eq!(index.factor_breakdown.lifestyle, 0);
        assert_eq!(index.score, 40);
    }

    #[test]
    fn test_recommendations_only_from_elevated_signals() {
        let index = aggregate(
            &signal(10.0, RiskLevel::Low, &[]),
            &signal(40.0, RiskLevel::High, &["Use a humidifier"]),
            &signal(20.0, RiskLevel::Medium, &["Sleep more"]),
        );
        assert_eq!(index.recommendations, vec!["Use a humidifier"]);
    }

    #[test]
    fn test_recommendations_deduplicated_and_truncated() {
        let index = aggregate(
            &signal(90.0, RiskLevel::Critical, &["Rest and log symptoms"]),
            &signal(60.0, RiskLevel::Critical, &["Stay warm", "Hydrate"]),
            &signal(60.0, RiskLevel::High, &["Hydrate", "Reduce stress"]),
        );
        assert_eq!(
            index.recommendations,
            vec!["Rest and log symptoms", "Stay warm", "Hydrate"]
        );
    }

    #[test]
    fn test_symptom_alert_when_symptom_has_no_recommendations() {
        let index = aggregate(
            &signal(90.0, RiskLevel::Critical, &[]),
            &signal(10.0, RiskLevel::Low, &["Stay warm"]),
            &signal(60.0, RiskLevel::High, &["Reduce stress"]),
        );
        assert_eq!(index.recommendations, vec![SYMPTOM_ALERT, "Reduce stress"]);
    }
}
