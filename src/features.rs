use crate::error::InputError;
use crate::models::StudentMetrics;

/// Daily study hours beyond this add nothing to the feature.
pub const STUDY_HOURS_SATURATION: f64 = 8.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Attendance,
    QuizScore,
    AssignmentScore,
    StudyHours,
    MidtermScore,
}

impl Feature {
    /// Input order expected by the scoring engine.
    pub const ALL: [Feature; 5] = [
        Feature::Attendance,
        Feature::QuizScore,
        Feature::AssignmentScore,
        Feature::StudyHours,
        Feature::MidtermScore,
    ];

    pub fn field(&self) -> &'static str {
        match self {
            Feature::Attendance => "attendance",
            Feature::QuizScore => "quiz_score",
            Feature::AssignmentScore => "assignment_score",
            Feature::StudyHours => "study_hours",
            Feature::MidtermScore => "midterm_score",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Feature::Attendance => "Attendance",
            Feature::QuizScore => "Quiz Score",
            Feature::AssignmentScore => "Assignment Score",
            Feature::StudyHours => "Study Hours",
            Feature::MidtermScore => "Midterm Score",
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Normalized features, each in 0..=1 where higher means a stronger student.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    slots: [Option<f64>; 5],
}

impl FeatureVector {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with(mut self, feature: Feature, value: f64) -> Self {
        self.slots[feature.slot()] = Some(value);
        self
    }

    pub fn get(&self, feature: Feature) -> Result<f64, InputError> {
        let field = feature.field();
        match self.slots[feature.slot()] {
            None => Err(InputError::Missing { field }),
            Some(value) if !value.is_finite() => Err(InputError::NotFinite { field }),
            Some(value) => Ok(value),
        }
    }
}

/// Validates every metric against its domain and normalizes it.
///
/// Out-of-range and non-finite values are rejected, never clamped.
pub fn build(metrics: &StudentMetrics) -> Result<FeatureVector, InputError> {
    bounded(metrics.attendance, "attendance", 1.0, "0..=1")?;
    bounded(metrics.quiz_score, "quiz_score", 10.0, "0..=10")?;
    bounded(metrics.assignment_score, "assignment_score", 10.0, "0..=10")?;
    bounded(metrics.study_hours, "study_hours", f64::INFINITY, ">= 0")?;
    bounded(metrics.midterm_score, "midterm_score", 100.0, "0..=100")?;

    Ok(Feature::ALL
        .into_iter()
        .fold(FeatureVector::empty(), |vector, feature| {
            vector.with(feature, normalized(metrics, feature))
        }))
}

/// One metric scaled to 0..=1. Only meaningful for validated metrics.
pub fn normalized(metrics: &StudentMetrics, feature: Feature) -> f64 {
    match feature {
        Feature::Attendance => metrics.attendance,
        Feature::QuizScore => metrics.quiz_score / 10.0,
        Feature::AssignmentScore => metrics.assignment_score / 10.0,
        Feature::StudyHours => {
            metrics.study_hours.min(STUDY_HOURS_SATURATION) / STUDY_HOURS_SATURATION
        }
        Feature::MidtermScore => metrics.midterm_score / 100.0,
    }
}

fn bounded(
    value: f64,
    field: &'static str,
    max: f64,
    domain: &'static str,
) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { field });
    }
    if !(0.0..=max).contains(&value) {
        return Err(InputError::OutOfRange {
            field,
            value,
            domain,
        });
    }
    Ok(())
}
