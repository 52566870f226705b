use tracing::debug;

use crate::error::{AdvisorError, ScoringFault};
use crate::features::{self, Feature, FeatureVector};
use crate::models::{Assessment, RiskTier, StudentMetrics};

/// Scores strictly above this are high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.4;

/// Maps a feature vector to a risk score in 0..=1.
///
/// Implementations must be deterministic and must not increase the score
/// when any single feature improves.
pub trait RiskModel: Send + Sync {
    fn score(&self, features: &FeatureVector) -> Result<f64, AdvisorError>;
}

/// Per-feature weights; all must be non-negative to keep the model monotonic.
#[derive(Debug, Clone, Copy)]
pub struct FeatureWeights {
    pub attendance: f64,
    pub quiz_score: f64,
    pub assignment_score: f64,
    pub study_hours: f64,
    pub midterm_score: f64,
}

impl FeatureWeights {
    pub fn weight(&self, feature: Feature) -> f64 {
        match feature {
            Feature::Attendance => self.attendance,
            Feature::QuizScore => self.quiz_score,
            Feature::AssignmentScore => self.assignment_score,
            Feature::StudyHours => self.study_hours,
            Feature::MidtermScore => self.midterm_score,
        }
    }
}

impl Default for FeatureWeights {
    fn default() -> Self {
        FeatureWeights {
            attendance: 2.0,
            quiz_score: 1.2,
            assignment_score: 1.2,
            study_hours: 1.0,
            midterm_score: 2.0,
        }
    }
}

/// Logistic regression: `risk = sigmoid(bias - sum(weight * feature))`.
#[derive(Debug, Clone, Copy)]
pub struct LogisticRiskModel {
    pub bias: f64,
    pub weights: FeatureWeights,
}

impl Default for LogisticRiskModel {
    fn default() -> Self {
        LogisticRiskModel {
            bias: 3.5,
            weights: FeatureWeights::default(),
        }
    }
}

impl RiskModel for LogisticRiskModel {
    fn score(&self, features: &FeatureVector) -> Result<f64, AdvisorError> {
        let mut strength = 0.0;
        for feature in Feature::ALL {
            strength += self.weights.weight(feature) * features.get(feature)?;
        }

        let logit = self.bias - strength;
        let risk = 1.0 / (1.0 + (-logit).exp());
        if !risk.is_finite() {
            return Err(ScoringFault(format!("logit {logit} produced a non-finite score")).into());
        }
        Ok(risk)
    }
}

/// The synchronous scoring stage. Errors here are fatal to a request.
pub fn assess<M>(model: &M, metrics: &StudentMetrics) -> Result<Assessment, AdvisorError>
where
    M: RiskModel + ?Sized,
{
    let features = features::build(metrics)?;
    let score = check_score(model.score(&features)?)?;
    debug!(score, "scored");

    let tier = classify(score);
    debug!(tier = %tier, "classified");

    Ok(Assessment { score, tier })
}

/// Treats anything outside 0..=1 as an engine defect.
pub fn check_score(score: f64) -> Result<f64, ScoringFault> {
    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ScoringFault(format!(
            "risk score {score} is outside 0..=1"
        )));
    }
    Ok(score)
}

/// Total over every f64; does not re-check the range.
pub fn classify(score: f64) -> RiskTier {
    if score > HIGH_RISK_THRESHOLD {
        RiskTier::High
    } else {
        RiskTier::Low
    }
}

pub fn round_score(score: f64) -> f64 {
    (score * 100.0).round_ties_even() / 100.0
}
