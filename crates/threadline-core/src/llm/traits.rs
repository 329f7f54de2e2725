use crate::context::Turn;
use crate::error::{Result, ThreadlineError};
use crate::llm::provider::{BackendKind, ModelProfile};
use crate::llm::session::GatewaySession;
use futures::{Stream, StreamExt};
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::pin::Pin;

/// Text fragments of a streamed reply, produced only as they are polled.
pub type FragmentStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// What a gateway hands back from [`LlmGateway::send`].
pub enum Reply {
    Complete(String),
    Stream(FragmentStream),
}

impl Reply {
    /// The in-band form of a failed call, shaped like the requested mode.
    pub fn error(err: &ThreadlineError, streaming: bool) -> Self {
        let text = err.inline_text();
        if streaming {
            Self::Stream(Box::pin(futures::stream::once(async move { text })))
        } else {
            Self::Complete(text)
        }
    }

    pub fn is_streaming(&self) -> bool {
        matches!(self, Self::Stream(_))
    }

    /// Drains the reply into one string, consuming a stream to its end.
    pub async fn into_text(self) -> String {
        match self {
            Self::Complete(text) => text,
            Self::Stream(stream) => stream.collect::<Vec<_>>().await.concat(),
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Complete(text) => f.debug_tuple("Complete").field(text).finish(),
            Self::Stream(_) => f.write_str("Stream(..)"),
        }
    }
}

/// Input accepted by [`LlmGateway::count_tokens`].
#[derive(Debug, Clone, Copy)]
pub enum TokenInput<'a> {
    Text(&'a str),
    Turns(&'a [Turn]),
}

impl<'a> TokenInput<'a> {
    /// Turns are joined by their content with single spaces.
    pub fn joined(&self) -> Cow<'a, str> {
        match *self {
            Self::Text(text) => Cow::Borrowed(text),
            Self::Turns(turns) => Cow::Owned(
                turns
                    .iter()
                    .map(Turn::content)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
        }
    }
}

impl<'a> From<&'a str> for TokenInput<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for TokenInput<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

impl<'a> From<&'a [Turn]> for TokenInput<'a> {
    fn from(turns: &'a [Turn]) -> Self {
        Self::Turns(turns)
    }
}

impl<'a> From<&'a Vec<Turn>> for TokenInput<'a> {
    fn from(turns: &'a Vec<Turn>) -> Self {
        Self::Turns(turns.as_slice())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenDirection {
    Input,
    Output,
}

/// The gateway trait. One implementation per remote provider.
///
/// Only `send` and the session accessors are provider specific; model
/// selection, token counting and pricing come from the shared session.
#[async_trait::async_trait]
pub trait LlmGateway: Send + Sync {
    /// Send `messages` and get the reply, whole or as a fragment stream.
    ///
    /// Remote failures never surface as `Err`: they come back as a single
    /// `Error: ...` text (or a one-fragment stream when `streaming`).
    async fn send(&self, messages: &[Turn], streaming: bool, max_tokens: u32) -> Reply;

    fn backend(&self) -> BackendKind;

    fn session(&self) -> &GatewaySession;

    fn session_mut(&mut self) -> &mut GatewaySession;

    /// Approximate token count using the shared reference encoding, whatever
    /// the backend.
    fn count_tokens(&self, input: TokenInput<'_>) -> usize {
        crate::llm::tokenizer::count_tokens(input)
    }

    fn available_models(&self) -> &BTreeMap<String, ModelProfile> {
        self.session().models()
    }

    fn set_model(&mut self, model: &str) -> Result<()> {
        self.session_mut().select_model(model)
    }

    fn current_model(&self) -> &str {
        self.session().current_model()
    }

    fn model_info(&self, model: Option<&str>) -> Result<&ModelProfile> {
        self.session().profile(model.unwrap_or(self.current_model()))
    }

    /// `token_count / 1_000_000 * rate` for the active model.
    fn token_cost(&self, token_count: u64, direction: TokenDirection) -> Result<f64> {
        let profile = self.model_info(None)?;
        let per_million = match direction {
            TokenDirection::Input => profile.input_cost_per_m,
            TokenDirection::Output => profile.output_cost_per_m,
        };
        Ok((token_count as f64 / 1_000_000.0) * per_million)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_join_with_single_spaces() {
        let turns = vec![Turn::user("hello"), Turn::assistant("world")];
        assert_eq!(TokenInput::from(&turns).joined(), "hello world");
    }

    #[test]
    fn empty_turn_list_joins_to_empty_text() {
        let turns: Vec<Turn> = Vec::new();
        assert_eq!(TokenInput::from(&turns).joined(), "");
    }

    #[tokio::test]
    async fn streaming_error_reply_is_a_single_fragment() {
        let err = ThreadlineError::Remote("boom".into());
        let reply = Reply::error(&err, true);
        assert!(reply.is_streaming());
        let Reply::Stream(stream) = reply else {
            unreachable!()
        };
        let fragments: Vec<String> = stream.collect().await;
        assert_eq!(fragments, vec!["Error: boom".to_string()]);
    }

    #[tokio::test]
    async fn complete_error_reply_keeps_description() {
        let err = ThreadlineError::Remote("timed out".into());
        let reply = Reply::error(&err, false);
        assert_eq!(reply.into_text().await, "Error: timed out");
    }
}
