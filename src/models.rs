use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::InputError;

/// Metrics as they arrive from a caller; any field may be absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MetricsPayload {
    pub attendance: Option<f64>,
    pub quiz_score: Option<f64>,
    pub assignment_score: Option<f64>,
    pub study_hours: Option<f64>,
    pub midterm_score: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StudentMetrics {
    /// Fraction of classes attended, 0..=1.
    pub attendance: f64,
    /// Average quiz score out of 10.
    pub quiz_score: f64,
    /// Average assignment score out of 10.
    pub assignment_score: f64,
    /// Daily study hours.
    pub study_hours: f64,
    /// Last midterm out of 100.
    pub midterm_score: f64,
}

impl TryFrom<&MetricsPayload> for StudentMetrics {
    type Error = InputError;

    fn try_from(payload: &MetricsPayload) -> Result<Self, Self::Error> {
        fn require(value: Option<f64>, field: &'static str) -> Result<f64, InputError> {
            value.ok_or(InputError::Missing { field })
        }

        Ok(StudentMetrics {
            attendance: require(payload.attendance, "attendance")?,
            quiz_score: require(payload.quiz_score, "quiz_score")?,
            assignment_score: require(payload.assignment_score, "assignment_score")?,
            study_hours: require(payload.study_hours, "study_hours")?,
            midterm_score: require(payload.midterm_score, "midterm_score")?,
        })
    }
}

impl From<StudentMetrics> for MetricsPayload {
    fn from(metrics: StudentMetrics) -> Self {
        MetricsPayload {
            attendance: Some(metrics.attendance),
            quiz_score: Some(metrics.quiz_score),
            assignment_score: Some(metrics.assignment_score),
            study_hours: Some(metrics.study_hours),
            midterm_score: Some(metrics.midterm_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl FromStr for Role {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            _ => Err(()),
        }
    }
}

/// A turn whose role has been checked against the known set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        ConversationTurn {
            role,
            content: content.into(),
        }
    }
}

/// A caller-supplied turn, role not yet validated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TurnPayload {
    pub role: String,
    pub content: String,
}

impl TurnPayload {
    pub fn user(content: impl Into<String>) -> Self {
        TurnPayload {
            role: Role::User.as_str().to_string(),
            content: content.into(),
        }
    }
}

/// Inbound request: metrics plus the running conversation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlanRequest {
    pub student_data: MetricsPayload,
    #[serde(default)]
    pub messages: Vec<TurnPayload>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTier {
    Low,
    High,
}

impl RiskTier {
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Low => "Low Risk/On Track",
            RiskTier::High => "High Risk",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Output of the scoring stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub tier: RiskTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanResult {
    pub risk_score: f64,
    pub detailed_plan: String,
}

/// Where the plan text came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    Generated,
    Degraded { fault: String },
}

/// A finished request: the caller-facing result plus how it was reached.
#[derive(Debug, Clone)]
pub struct Advice {
    pub metrics: StudentMetrics,
    pub assessment: Assessment,
    pub source: PlanSource,
    pub result: PlanResult,
}
