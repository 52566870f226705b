//! Client side of the external text-completion service.
//!
//! The backend speaks the OpenAI-compatible `chat/completions` protocol. Every
//! failure surfaces as a [`GenerationFault`] so the pipeline can degrade
//! instead of failing the request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use crate::config::GenerationConfig;
use crate::error::GenerationFault;
use crate::models::ConversationTurn;

/// Longest backend error body kept in a fault message.
const MAX_ERROR_BODY_CHARS: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ConversationTurn>,
    pub temperature: f32,
}

#[async_trait]
pub trait PlanGenerator: Send + Sync {
    /// Returns the text of the single best completion.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationFault>;
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    url: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(config: &GenerationConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            url: config.completions_url(),
            timeout: config.timeout,
        })
    }

    fn transport_fault(&self, err: reqwest::Error) -> GenerationFault {
        if err.is_timeout() {
            GenerationFault::Timeout(self.timeout)
        } else {
            GenerationFault::Transport(err)
        }
    }
}

#[async_trait]
impl PlanGenerator for OpenAiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationFault> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(GenerationFault::MissingCredentials)?;

        let res = self
            .client
            .post(&self.url)
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_fault(e))?;

        let status = res.status();
        let body = res.text().await.map_err(|e| self.transport_fault(e))?;
        read_completion(status, &body)
    }
}

/// Maps a backend reply to plan text; non-2xx replies keep a truncated body.
pub fn read_completion(status: StatusCode, body: &str) -> Result<String, GenerationFault> {
    if !status.is_success() {
        return Err(GenerationFault::Status {
            status: status.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
        });
    }

    extract_content(body)
}

/// Pulls the first choice's message text out of a completion response body.
pub fn extract_content(body: &str) -> Result<String, GenerationFault> {
    let parsed: ChatResponse =
        serde_json::from_str(body).map_err(|e| GenerationFault::Malformed(e.to_string()))?;

    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| GenerationFault::Malformed("response contained no choices".to_string()))?;

    match choice.message.content {
        Some(text) if !text.trim().is_empty() => Ok(text),
        _ => Err(GenerationFault::EmptyCompletion),
    }
}

/// Runs a completion under a hard deadline.
pub async fn complete_within<G>(
    generator: &G,
    request: &CompletionRequest,
    timeout: Duration,
) -> Result<String, GenerationFault>
where
    G: PlanGenerator + ?Sized,
{
    match tokio::time::timeout(timeout, generator.complete(request)).await {
        Ok(result) => result,
        Err(_) => Err(GenerationFault::Timeout(timeout)),
    }
}

/// Placeholder shown in place of a plan when generation fails.
pub fn degraded_plan(fault: &GenerationFault) -> String {
    format!("Error generating detailed plan: {fault}. Please try again later.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    struct Stalled;

    #[async_trait]
    impl PlanGenerator for Stalled {
        async fn complete(&self, _request: &CompletionRequest) -> Result<String, GenerationFault> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok("too late".to_string())
        }
    }

    fn request() -> CompletionRequest {
        CompletionRequest {
            model: "gpt-4o".to_string(),
            messages: vec![
                ConversationTurn::new(Role::System, "advise"),
                ConversationTurn::new(Role::User, "plan please"),
            ],
            temperature: 0.7,
        }
    }

    #[test]
    fn extracts_first_choice() {
        let body = r###"{
            "id": "chatcmpl-1",
            "choices": [
                {"index": 0, "message": {"role": "assistant",
                    "content": "## Monday\n- 08:00 Active Recall"}},
                {"index": 1, "message": {"role": "assistant", "content": "ignored"}}
            ]
        }"###;
        assert_eq!(
            extract_content(body).unwrap(),
            "## Monday\n- 08:00 Active Recall"
        );
    }

    #[test]
    fn rejects_unusable_bodies() {
        assert!(matches!(
            extract_content("<html>bad gateway</html>"),
            Err(GenerationFault::Malformed(_))
        ));
        assert!(matches!(
            extract_content(r#"{"choices": []}"#),
            Err(GenerationFault::Malformed(_))
        ));
        assert!(matches!(
            extract_content(r#"{"choices": [{"message": {"content": null}}]}"#),
            Err(GenerationFault::EmptyCompletion)
        ));
        assert!(matches!(
            extract_content(r#"{"choices": [{"message": {"content": "  \n"}}]}"#),
            Err(GenerationFault::EmptyCompletion)
        ));
    }

    #[test]
    fn request_serializes_as_chat_completion() {
        let value = serde_json::to_value(request()).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "plan please");
        assert!((value["temperature"].as_f64().unwrap() - 0.7).abs() < 1e-6);
    }

    #[test]
    fn error_status_becomes_status_fault() {
        let body = format!("{{\"error\": \"{}\"}}", "x".repeat(800));
        let err = read_completion(StatusCode::TOO_MANY_REQUESTS, &body).unwrap_err();
        match err {
            GenerationFault::Status { status, body } => {
                assert_eq!(status, 429);
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS);
                assert!(body.starts_with("{\"error\": \"xxx"));
            }
            other => panic!("unexpected fault: {other}"),
        }

        let err = read_completion(StatusCode::UNAUTHORIZED, "invalid api key").unwrap_err();
        assert!(matches!(
            err,
            GenerationFault::Status { status: 401, ref body } if body == "invalid api key"
        ));
    }

    #[test]
    fn success_status_extracts_plan() {
        let body = r#"{"choices": [{"message": {"content": "- 09:00 Pomodoro"}}]}"#;
        assert_eq!(
            read_completion(StatusCode::OK, body).unwrap(),
            "- 09:00 Pomodoro"
        );
        assert!(matches!(
            read_completion(StatusCode::OK, "not json"),
            Err(GenerationFault::Malformed(_))
        ));
    }

    #[test]
    fn placeholder_describes_fault() {
        let fault = GenerationFault::Status {
            status: 429,
            body: "quota exceeded".to_string(),
        };
        let text = degraded_plan(&fault);
        assert!(text.starts_with("Error generating detailed plan:"));
        assert!(text.contains("429"));
        assert!(text.contains("quota exceeded"));
        assert!(text.ends_with("Please try again later."));
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let client = OpenAiClient::new(&GenerationConfig::default()).unwrap();
        let err = client.complete(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationFault::MissingCredentials));
    }

    #[tokio::test]
    async fn deadline_turns_into_timeout_fault() {
        let timeout = Duration::from_millis(20);
        let err = complete_within(&Stalled, &request(), timeout)
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationFault::Timeout(t) if t == timeout));
    }
}
