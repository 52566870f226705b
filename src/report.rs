use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::{Advice, PlanSource};
use crate::prompt;

pub fn build_report(
    student: Option<&str>,
    advice: &Advice,
    generated_at: DateTime<Utc>,
) -> String {
    let metrics = &advice.metrics;
    let weak = prompt::weak_areas(metrics);

    let mut output = String::new();
    let student_label = student.unwrap_or("unnamed student");

    let _ = writeln!(output, "# Study Plan Report");
    let _ = writeln!(
        output,
        "Generated for {} on {}",
        student_label,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Metrics");
    let _ = writeln!(output, "- Attendance: {:.1}%", metrics.attendance * 100.0);
    let _ = writeln!(output, "- Quiz Score: {}/10", metrics.quiz_score);
    let _ = writeln!(output, "- Assignment Score: {}/10", metrics.assignment_score);
    let _ = writeln!(output, "- Study Hours: {} hrs/day", metrics.study_hours);
    let _ = writeln!(output, "- Midterm Score: {}/100", metrics.midterm_score);

    let _ = writeln!(output);
    let _ = writeln!(output, "## Risk Assessment");
    let _ = writeln!(
        output,
        "- {} (score {:.2})",
        advice.assessment.tier, advice.result.risk_score
    );
    let _ = writeln!(
        output,
        "- Weakest areas: {}",
        prompt::describe_weak_areas(&weak)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Study Plan");
    if let PlanSource::Degraded { fault } = &advice.source {
        let _ = writeln!(
            output,
            "_Plan generation failed ({fault}); the risk assessment above is still valid._"
        );
        let _ = writeln!(output);
    }
    let _ = writeln!(output, "{}", advice.result.detailed_plan.trim_end());

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    use crate::models::{Assessment, PlanResult, RiskTier, StudentMetrics};

    fn advice(source: PlanSource, plan: &str) -> Advice {
        Advice {
            metrics: StudentMetrics {
                attendance: 0.3,
                quiz_score: 3.0,
                assignment_score: 4.0,
                study_hours: 0.5,
                midterm_score: 40.0,
            },
            assessment: Assessment {
                score: 0.7684,
                tier: RiskTier::High,
            },
            source,
            result: PlanResult {
                risk_score: 0.77,
                detailed_plan: plan.to_string(),
            },
        }
    }

    #[test]
    fn report_lists_sections_in_order() {
        let at = Utc.with_ymd_and_hms(2026, 2, 2, 9, 30, 0).unwrap();
        let report = build_report(
            Some("Avery Lee"),
            &advice(PlanSource::Generated, "## Monday\n- 08:00 Pomodoro\n"),
            at,
        );

        assert!(report.starts_with(
            "# Study Plan Report\nGenerated for Avery Lee on 2026-02-02 09:30 UTC\n"
        ));
        let metrics = report.find("## Metrics").unwrap();
        let risk = report.find("## Risk Assessment").unwrap();
        let plan = report.find("## Study Plan").unwrap();
        assert!(metrics < risk && risk < plan);
        assert!(report.contains("- High Risk (score 0.77)"));
        assert!(report.contains("- Weakest areas: Study Hours, Attendance"));
        assert!(report.ends_with("- 08:00 Pomodoro\n"));
        assert!(!report.contains("Plan generation failed"));
    }

    #[test]
    fn degraded_plan_is_flagged() {
        let at = Utc.with_ymd_and_hms(2026, 2, 2, 9, 30, 0).unwrap();
        let report = build_report(
            None,
            &advice(
                PlanSource::Degraded {
                    fault: "timed out".to_string(),
                },
                "Error generating detailed plan: timed out. Please try again later.",
            ),
            at,
        );

        assert!(report.contains("Generated for unnamed student"));
        assert!(report.contains("_Plan generation failed (timed out);"));
        assert!(report.contains("Error generating detailed plan"));
    }
}
