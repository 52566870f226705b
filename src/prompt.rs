use std::fmt::Write;

use crate::features::{self, Feature};
use crate::models::{RiskTier, StudentMetrics};

/// Normalized strength below which a metric is called out as weak.
pub const WEAK_AREA_CUTOFF: f64 = 0.6;

/// Metrics under the cutoff, weakest first.
pub fn weak_areas(metrics: &StudentMetrics) -> Vec<Feature> {
    let mut weak: Vec<(Feature, f64)> = Feature::ALL
        .into_iter()
        .map(|feature| (feature, features::normalized(metrics, feature)))
        .filter(|(_, strength)| *strength < WEAK_AREA_CUTOFF)
        .collect();

    weak.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    weak.into_iter().map(|(feature, _)| feature).collect()
}

pub fn describe_weak_areas(areas: &[Feature]) -> String {
    if areas.is_empty() {
        return "none flagged".to_string();
    }
    areas
        .iter()
        .map(|feature| feature.display_name())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Builds the system instruction that steers plan generation.
pub fn synthesize(metrics: &StudentMetrics, score: f64, tier: RiskTier) -> String {
    let weak = weak_areas(metrics);
    let mut output = String::new();

    let _ = writeln!(output, "You are an expert academic advisor.");
    let _ = writeln!(output, "A student has the following metrics:");
    let _ = writeln!(output, "- Attendance: {:.1}%", metrics.attendance * 100.0);
    let _ = writeln!(output, "- Quiz Score: {}/10", metrics.quiz_score);
    let _ = writeln!(output, "- Assignment Score: {}/10", metrics.assignment_score);
    let _ = writeln!(output, "- Study Hours: {} hrs/day", metrics.study_hours);
    let _ = writeln!(output, "- Midterm Score: {}/100", metrics.midterm_score);
    let _ = writeln!(
        output,
        "- Calculated Risk Level: {} (Risk Score: {:.2})",
        tier.label(),
        score
    );
    let _ = writeln!(output, "- Weakest Areas: {}", describe_weak_areas(&weak));
    let _ = writeln!(output);
    let _ = writeln!(
        output,
        "Generate a highly detailed, personalized daily study plan."
    );
    let _ = writeln!(
        output,
        "Include specific time slots, study techniques (like Pomodoro or Active Recall), \
         and actionable advice to improve their weak areas."
    );
    let _ = writeln!(output, "Format the output in clean Markdown.");

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn struggling() -> StudentMetrics {
        StudentMetrics {
            attendance: 0.3,
            quiz_score: 3.0,
            assignment_score: 4.0,
            study_hours: 0.5,
            midterm_score: 40.0,
        }
    }

    #[test]
    fn prompt_matches_template() {
        let metrics = StudentMetrics {
            attendance: 0.9,
            quiz_score: 9.0,
            assignment_score: 8.5,
            study_hours: 4.0,
            midterm_score: 85.0,
        };
        let prompt = synthesize(&metrics, 0.0654, RiskTier::Low);

        let expected = "You are an expert academic advisor.\n\
            A student has the following metrics:\n\
            - Attendance: 90.0%\n\
            - Quiz Score: 9/10\n\
            - Assignment Score: 8.5/10\n\
            - Study Hours: 4 hrs/day\n\
            - Midterm Score: 85/100\n\
            - Calculated Risk Level: Low Risk/On Track (Risk Score: 0.07)\n\
            - Weakest Areas: Study Hours\n\
            \n\
            Generate a highly detailed, personalized daily study plan.\n\
            Include specific time slots, study techniques (like Pomodoro or Active Recall), \
            and actionable advice to improve their weak areas.\n\
            Format the output in clean Markdown.\n";
        assert_eq!(prompt, expected);
    }

    #[test]
    fn prompt_carries_tier_and_two_decimal_score() {
        for (score, tier, rendered) in [
            (0.0, RiskTier::Low, "0.00"),
            (0.4, RiskTier::Low, "0.40"),
            (0.76845, RiskTier::High, "0.77"),
            (1.0, RiskTier::High, "1.00"),
        ] {
            let prompt = synthesize(&struggling(), score, tier);
            assert!(prompt.contains(tier.label()));
            assert!(prompt.contains(&format!("(Risk Score: {rendered})")));
        }
    }

    #[test]
    fn high_risk_prompt_names_the_tier() {
        let prompt = synthesize(&struggling(), 0.77, RiskTier::High);
        assert!(prompt.contains("High Risk"));
        assert!(prompt.contains("- Attendance: 30.0%"));
    }

    #[test]
    fn weak_areas_sort_weakest_first() {
        let weak = weak_areas(&struggling());
        assert_eq!(
            weak,
            vec![
                Feature::StudyHours,
                Feature::Attendance,
                Feature::QuizScore,
                Feature::AssignmentScore,
                Feature::MidtermScore,
            ]
        );
    }

    #[test]
    fn strong_student_has_no_weak_areas() {
        let metrics = StudentMetrics {
            attendance: 0.95,
            quiz_score: 9.0,
            assignment_score: 9.5,
            study_hours: 6.0,
            midterm_score: 92.0,
        };
        assert!(weak_areas(&metrics).is_empty());
        let prompt = synthesize(&metrics, 0.03, RiskTier::Low);
        assert!(prompt.contains("- Weakest Areas: none flagged"));
    }
}
