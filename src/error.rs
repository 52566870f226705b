use std::time::Duration;

use thiserror::Error;

/// A student metric or conversation turn the pipeline cannot accept.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InputError {
    #[error("missing required field `{field}`")]
    Missing { field: &'static str },
    #[error("field `{field}` must be a finite number")]
    NotFinite { field: &'static str },
    #[error("field `{field}` is {value}, expected {domain}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        domain: &'static str,
    },
    #[error("conversation turn {index} has unrecognized role `{role}`")]
    UnknownRole { index: usize, role: String },
}

/// The scoring engine failed or produced a score outside its contract.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("scoring fault: {0}")]
pub struct ScoringFault(pub String);

/// Errors that end a request without a plan.
#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("invalid input: {0}")]
    Input(#[from] InputError),
    #[error(transparent)]
    Scoring(#[from] ScoringFault),
}

impl AdvisorError {
    /// True when the caller sent bad data, false for server-side faults.
    pub fn is_client_error(&self) -> bool {
        matches!(self, AdvisorError::Input(_))
    }
}

/// Failures of the generation backend. Never fatal to a request.
#[derive(Debug, Error)]
pub enum GenerationFault {
    #[error("no API key configured for the generation backend")]
    MissingCredentials,
    #[error("generation request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("generation timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("generation backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed generation response: {0}")]
    Malformed(String),
    #[error("generation backend returned no content")]
    EmptyCompletion,
}
