//! Pull-based server-sent-events decoding shared by the streaming adapters.
//!
//! The HTTP body is only read when the returned stream is polled, so a
//! consumer that stops early never pays for the rest of the response.

use crate::llm::traits::FragmentStream;
use futures::{Stream, StreamExt};
use std::collections::VecDeque;
use std::fmt::Display;
use std::pin::Pin;

/// What an adapter wants done with one `data:` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseAction {
    Skip,
    Emit(String),
    Stop,
    Fail(String),
}

struct SseState<S, F> {
    body: Pin<Box<S>>,
    parse: F,
    buffer: Vec<u8>,
    pending: VecDeque<String>,
    done: bool,
}

impl<S, F> SseState<S, F>
where
    F: FnMut(&str) -> SseAction,
{
    fn drain_lines(&mut self) {
        while !self.done {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
        }
    }

    fn flush_tail(&mut self) {
        if !self.buffer.is_empty() && !self.done {
            let tail = std::mem::take(&mut self.buffer);
            self.handle_line(&String::from_utf8_lossy(&tail));
        }
    }

    fn handle_line(&mut self, line: &str) {
        let Some(data) = line.trim().strip_prefix("data:") else {
            return;
        };
        match (self.parse)(data.trim_start()) {
            SseAction::Skip => {}
            SseAction::Emit(text) => {
                if !text.is_empty() {
                    self.pending.push_back(text);
                }
            }
            SseAction::Stop => self.done = true,
            SseAction::Fail(message) => {
                tracing::warn!(%message, "stream reported an error");
                self.pending.push_back(format!("Error: {message}"));
                self.done = true;
            }
        }
    }
}

/// Turn a raw byte stream into text fragments using `parse` for each event.
pub fn fragments<S, B, E, F>(body: S, parse: F) -> FragmentStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
    F: FnMut(&str) -> SseAction + Send + 'static,
{
    let state = SseState {
        body: Box::pin(body),
        parse,
        buffer: Vec::new(),
        pending: VecDeque::new(),
        done: false,
    };

    Box::pin(futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(fragment) = st.pending.pop_front() {
                return Some((fragment, st));
            }
            if st.done {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    st.buffer.extend_from_slice(chunk.as_ref());
                    st.drain_lines();
                }
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "stream interrupted");
                    st.pending.push_back(format!("Error: {e}"));
                    st.done = true;
                }
                None => {
                    st.flush_tail();
                    st.done = true;
                }
            }
        }
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    fn echo(data: &str) -> SseAction {
        match data {
            "[DONE]" => SseAction::Stop,
            "boom" => SseAction::Fail("exploded".into()),
            "" => SseAction::Skip,
            other => SseAction::Emit(other.to_string()),
        }
    }

    fn chunks(parts: &[&str]) -> impl Stream<Item = Result<Vec<u8>, Infallible>> + Send + 'static {
        let owned: Vec<Result<Vec<u8>, Infallible>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures::stream::iter(owned)
    }

    #[tokio::test]
    async fn lines_split_across_chunks_are_reassembled() {
        let body = chunks(&["data: hel", "lo\n\ndata: wor", "ld\n", "data: [DONE]\n"]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["hello", "world"]);
    }

    #[tokio::test]
    async fn stop_ignores_anything_after_it() {
        let body = chunks(&["data: a\ndata: [DONE]\ndata: b\n"]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["a"]);
    }

    #[tokio::test]
    async fn non_data_lines_are_ignored() {
        let body = chunks(&["event: ping\n: comment\ndata: x\n"]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["x"]);
    }

    #[tokio::test]
    async fn unterminated_last_line_is_flushed() {
        let body = chunks(&["data: first\ndata: last"]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["first", "last"]);
    }

    #[tokio::test]
    async fn failure_event_becomes_trailing_error_fragment() {
        let body = chunks(&["data: ok\ndata: boom\ndata: never\n"]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["ok", "Error: exploded"]);
    }

    #[tokio::test]
    async fn transport_error_ends_stream_with_error_text() {
        let body = futures::stream::iter(vec![
            Ok(b"data: partial\n".to_vec()),
            Err("connection reset"),
        ]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["partial", "Error: connection reset"]);
    }

    #[tokio::test]
    async fn multibyte_text_split_mid_character_survives() {
        let bytes = "data: héllo\n".as_bytes();
        let (a, b) = bytes.split_at(8);
        let body = futures::stream::iter(vec![
            Ok::<_, Infallible>(a.to_vec()),
            Ok(b.to_vec()),
        ]);
        let out: Vec<String> = fragments(body, echo).collect().await;
        assert_eq!(out, vec!["héllo"]);
    }
}
