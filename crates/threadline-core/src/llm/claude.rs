use crate::constants::{endpoints, models};
use crate::context::{Role, Turn};
use crate::error::{Result, ThreadlineError};
use crate::llm::provider::{known_models, BackendKind, GatewayOptions};
use crate::llm::session::GatewaySession;
use crate::llm::sse::{self, SseAction};
use crate::llm::traits::*;
use serde::Deserialize;
use serde_json::Value;

/// Gateway for the Anthropic Messages API.
pub struct ClaudeGateway {
    session: GatewaySession,
}

impl ClaudeGateway {
    pub fn new(api_key: impl Into<String>, options: &GatewayOptions) -> Result<Self> {
        let session = GatewaySession::new(
            BackendKind::Claude.api_key_env(),
            api_key,
            known_models(BackendKind::Claude),
            models::DEFAULT_CLAUDE_MODEL,
            endpoints::CLAUDE_BASE_URL,
            options,
        )?;
        Ok(Self { session })
    }

    fn build_request_body(&self, messages: &[Turn], max_tokens: u32, stream: bool) -> Value {
        // System turns go into the top-level field, not the message list
        let system_prompt: String = messages
            .iter()
            .filter(|m| m.role() == Role::System)
            .map(Turn::content)
            .collect::<Vec<_>>()
            .join("\n\n");

        let conv_messages: Vec<Value> = messages
            .iter()
            .filter(|m| m.role() != Role::System)
            .map(|m| {
                serde_json::json!({
                    "role": m.role(),
                    "content": m.content(),
                })
            })
            .collect();

        let mut body = serde_json::json!({
            "model": self.session.current_model(),
            "max_tokens": max_tokens,
            "messages": conv_messages,
            "stream": stream,
        });

        if !system_prompt.is_empty() {
            body["system"] = Value::String(system_prompt);
        }

        body
    }

    async fn post(&self, messages: &[Turn], max_tokens: u32, stream: bool) -> Result<reqwest::Response> {
        let url = self.session.endpoint(endpoints::CLAUDE_MESSAGES_PATH);
        let request_body = self.build_request_body(messages, max_tokens, stream);
        tracing::debug!(
            model = self.session.current_model(),
            messages = messages.len(),
            stream,
            "sending Claude request"
        );

        let response = self
            .session
            .client()
            .post(&url)
            .header("x-api-key", self.session.api_key())
            .header("anthropic-version", endpoints::CLAUDE_API_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ThreadlineError::Remote(format!(
                "Claude API error ({}): {}",
                status,
                api_error_message(&text)
            )));
        }

        Ok(response)
    }

    async fn complete(&self, messages: &[Turn], max_tokens: u32) -> Result<String> {
        let response = self.post(messages, max_tokens, false).await?;
        let response_text = response.text().await?;

        let api_response: ClaudeApiResponse = serde_json::from_str(&response_text)
            .map_err(|e| ThreadlineError::Remote(format!("Failed to parse response: {e}")))?;

        let text: String = api_response
            .content
            .iter()
            .filter(|c| c.content_type == "text")
            .map(|c| c.text.as_str())
            .collect();
        if text.is_empty() {
            return Err(ThreadlineError::Remote("No text content in response".into()));
        }
        Ok(text)
    }

    async fn stream(&self, messages: &[Turn], max_tokens: u32) -> Result<FragmentStream> {
        let response = self.post(messages, max_tokens, true).await?;
        Ok(sse::fragments(response.bytes_stream(), parse_stream_event))
    }
}

#[derive(Debug, Deserialize)]
struct ClaudeApiResponse {
    content: Vec<ClaudeContent>,
}

#[derive(Debug, Deserialize)]
struct ClaudeContent {
    #[serde(rename = "type")]
    content_type: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct ClaudeApiError {
    error: ClaudeErrorDetails,
}

#[derive(Debug, Deserialize)]
struct ClaudeErrorDetails {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeStreamEvent {
    ContentBlockDelta { delta: ClaudeDelta },
    MessageStop,
    Error { error: ClaudeErrorDetails },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClaudeDelta {
    TextDelta { text: String },
    #[serde(other)]
    Other,
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ClaudeApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn parse_stream_event(data: &str) -> SseAction {
    match serde_json::from_str::<ClaudeStreamEvent>(data) {
        Ok(ClaudeStreamEvent::ContentBlockDelta {
            delta: ClaudeDelta::TextDelta { text },
        }) => SseAction::Emit(text),
        Ok(ClaudeStreamEvent::MessageStop) => SseAction::Stop,
        Ok(ClaudeStreamEvent::Error { error }) => SseAction::Fail(error.message),
        Ok(_) => SseAction::Skip,
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable stream event");
            SseAction::Skip
        }
    }
}

#[async_trait::async_trait]
impl LlmGateway for ClaudeGateway {
    async fn send(&self, messages: &[Turn], streaming: bool, max_tokens: u32) -> Reply {
        let result = if streaming {
            self.stream(messages, max_tokens).await.map(Reply::Stream)
        } else {
            self.complete(messages, max_tokens).await.map(Reply::Complete)
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Claude request failed");
            Reply::error(&e, streaming)
        })
    }

    fn backend(&self) -> BackendKind {
        BackendKind::Claude
    }

    fn session(&self) -> &GatewaySession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GatewaySession {
        &mut self.session
    }
}
