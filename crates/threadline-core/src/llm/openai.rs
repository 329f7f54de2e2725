use crate::constants::{endpoints, models};
use crate::context::Turn;
use crate::error::{Result, ThreadlineError};
use crate::llm::provider::{known_models, BackendKind, GatewayOptions};
use crate::llm::session::GatewaySession;
use crate::llm::sse::{self, SseAction};
use crate::llm::traits::*;
use serde::{Deserialize, Serialize};

/// Gateway for the OpenAI Chat Completions API.
pub struct OpenAiGateway {
    session: GatewaySession,
}

impl OpenAiGateway {
    pub fn new(api_key: impl Into<String>, options: &GatewayOptions) -> Result<Self> {
        let session = GatewaySession::new(
            BackendKind::OpenAI.api_key_env(),
            api_key,
            known_models(BackendKind::OpenAI),
            models::DEFAULT_OPENAI_MODEL,
            endpoints::OPENAI_BASE_URL,
            options,
        )?;
        Ok(Self { session })
    }

    fn build_request<'a>(&'a self, messages: &'a [Turn], max_tokens: u32, stream: bool) -> OpenAIRequest<'a> {
        OpenAIRequest {
            model: self.session.current_model(),
            messages: messages
                .iter()
                .map(|m| OpenAIMessageOut {
                    role: m.role().as_str(),
                    content: m.content(),
                })
                .collect(),
            max_completion_tokens: max_tokens,
            stream,
        }
    }

    async fn post(&self, messages: &[Turn], max_tokens: u32, stream: bool) -> Result<reqwest::Response> {
        let url = self.session.endpoint(endpoints::OPENAI_CHAT_PATH);
        let request_body = self.build_request(messages, max_tokens, stream);
        tracing::debug!(
            model = self.session.current_model(),
            messages = messages.len(),
            stream,
            "sending OpenAI request"
        );

        let response = self
            .session
            .client()
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.session.api_key()))
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ThreadlineError::Remote(format!(
                "OpenAI API error ({}): {}",
                status,
                api_error_message(&text)
            )));
        }

        Ok(response)
    }

    async fn complete(&self, messages: &[Turn], max_tokens: u32) -> Result<String> {
        let response = self.post(messages, max_tokens, false).await?;
        let response_text = response.text().await?;

        let api_response: OpenAIResponse = serde_json::from_str(&response_text)
            .map_err(|e| ThreadlineError::Remote(format!("Failed to parse response: {e}")))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ThreadlineError::Remote("No response from API".into()))?;

        Ok(choice.message.content.unwrap_or_default())
    }

    async fn stream(&self, messages: &[Turn], max_tokens: u32) -> Result<FragmentStream> {
        let response = self.post(messages, max_tokens, true).await?;
        Ok(sse::fragments(response.bytes_stream(), parse_stream_chunk))
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessageOut<'a>>,
    max_completion_tokens: u32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct OpenAIMessageOut<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChunk {
    #[serde(default)]
    choices: Vec<OpenAIChunkChoice>,
    error: Option<OpenAIErrorDetails>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChunkChoice {
    #[serde(default)]
    delta: OpenAIDelta,
}

#[derive(Debug, Default, Deserialize)]
struct OpenAIDelta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIApiError {
    error: OpenAIErrorDetails,
}

#[derive(Debug, Deserialize)]
struct OpenAIErrorDetails {
    message: String,
}

fn api_error_message(body: &str) -> String {
    serde_json::from_str::<OpenAIApiError>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.to_string())
}

fn parse_stream_chunk(data: &str) -> SseAction {
    if data == "[DONE]" {
        return SseAction::Stop;
    }

    match serde_json::from_str::<OpenAIChunk>(data) {
        Ok(OpenAIChunk {
            error: Some(error), ..
        }) => SseAction::Fail(error.message),
        Ok(chunk) => chunk
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.delta.content)
            .map_or(SseAction::Skip, SseAction::Emit),
        Err(e) => {
            tracing::debug!(error = %e, "skipping unparseable stream chunk");
            SseAction::Skip
        }
    }
}

#[async_trait::async_trait]
impl LlmGateway for OpenAiGateway {
    async fn send(&self, messages: &[Turn], streaming: bool, max_tokens: u32) -> Reply {
        let result = if streaming {
            self.stream(messages, max_tokens).await.map(Reply::Stream)
        } else {
            self.complete(messages, max_tokens).await.map(Reply::Complete)
        };

        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "OpenAI request failed");
            Reply::error(&e, streaming)
        })
    }

    fn backend(&self) -> BackendKind {
        BackendKind::OpenAI
    }

    fn session(&self) -> &GatewaySession {
        &self.session
    }

    fn session_mut(&mut self) -> &mut GatewaySession {
        &mut self.session
    }
}
