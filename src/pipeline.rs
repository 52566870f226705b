use std::time::Duration;

use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::GenerationConfig;
use crate::conversation;
use crate::error::AdvisorError;
use crate::generation::{self, CompletionRequest, PlanGenerator};
use crate::models::{Advice, Assessment, PlanRequest, PlanResult, PlanSource, StudentMetrics};
use crate::prompt;
use crate::risk::{self, RiskModel};

/// Scores a student and asks the generation backend for a study plan.
///
/// Holds no per-request state, so one instance can serve concurrent requests.
pub struct Advisor<M, G> {
    model: M,
    generator: G,
    model_name: String,
    temperature: f32,
    timeout: Duration,
}

impl<M, G> Advisor<M, G>
where
    M: RiskModel,
    G: PlanGenerator,
{
    pub fn new(model: M, generator: G, config: &GenerationConfig) -> Self {
        Self {
            model,
            generator,
            model_name: config.model.clone(),
            temperature: config.temperature,
            timeout: config.timeout,
        }
    }

    pub fn assess(&self, metrics: &StudentMetrics) -> Result<Assessment, AdvisorError> {
        risk::assess(&self.model, metrics)
    }

    pub async fn advise(&self, request: &PlanRequest) -> Result<Advice, AdvisorError> {
        let span = info_span!("advise", request_id = %Uuid::new_v4());
        self.run(request).instrument(span).await
    }

    async fn run(&self, request: &PlanRequest) -> Result<Advice, AdvisorError> {
        let metrics = StudentMetrics::try_from(&request.student_data)?;
        let assessment = self.assess(&metrics)?;

        let instruction = prompt::synthesize(&metrics, assessment.score, assessment.tier);
        debug!(chars = instruction.len(), "prompt_built");

        let messages = conversation::assemble(&instruction, &request.messages)?;
        debug!(turns = messages.len(), "conversation_assembled");

        let completion = CompletionRequest {
            model: self.model_name.clone(),
            messages,
            temperature: self.temperature,
        };

        let (detailed_plan, source) =
            match generation::complete_within(&self.generator, &completion, self.timeout).await {
                Ok(text) => {
                    info!(chars = text.len(), "plan_generated");
                    (text, PlanSource::Generated)
                }
                Err(fault) => {
                    warn!(error = %fault, "plan_degraded");
                    (
                        generation::degraded_plan(&fault),
                        PlanSource::Degraded {
                            fault: fault.to_string(),
                        },
                    )
                }
            };

        Ok(Advice {
            metrics,
            assessment,
            source,
            result: PlanResult {
                risk_score: risk::round_score(assessment.score),
                detailed_plan,
            },
        })
    }
}
