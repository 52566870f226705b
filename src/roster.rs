use std::io::Read;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use crate::models::{Assessment, StudentMetrics};
use crate::risk::{self, RiskModel};

#[derive(Debug, Clone, Deserialize)]
struct RosterRow {
    student: String,
    attendance: f64,
    quiz_score: f64,
    assignment_score: f64,
    study_hours: f64,
    midterm_score: f64,
}

#[derive(Debug, Clone)]
pub struct StudentScore {
    pub student: String,
    pub assessment: Assessment,
}

pub fn score_csv<M: RiskModel>(model: &M, csv_path: &Path) -> anyhow::Result<Vec<StudentScore>> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("failed to open roster {}", csv_path.display()))?;
    score_reader(model, file)
}

/// Scores every row, highest risk first. The first bad row aborts the run.
pub fn score_reader<M: RiskModel, R: Read>(
    model: &M,
    input: R,
) -> anyhow::Result<Vec<StudentScore>> {
    let mut reader = csv::Reader::from_reader(input);
    let mut scores = Vec::new();

    for (index, result) in reader.deserialize::<RosterRow>().enumerate() {
        let row_number = index + 1;
        let row = result.with_context(|| format!("roster row {row_number} is malformed"))?;
        let metrics = StudentMetrics {
            attendance: row.attendance,
            quiz_score: row.quiz_score,
            assignment_score: row.assignment_score,
            study_hours: row.study_hours,
            midterm_score: row.midterm_score,
        };

        let assessment = risk::assess(model, &metrics)
            .with_context(|| format!("roster row {row_number} ({})", row.student))?;

        scores.push(StudentScore {
            student: row.student,
            assessment,
        });
    }

    scores.sort_by(|a, b| {
        b.assessment
            .score
            .partial_cmp(&a.assessment.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    Ok(scores)
}
