//! SSE streaming parser for OpenAI chat completions.
//!
//! Converts a raw `reqwest` byte stream into `ChatCompletionChunk` values.
//! Handles `data: [DONE]`, lines and characters split across network chunks,
//! and the usage-only trailer chunk sent when `stream_options.include_usage`
//! is set.

use bytes::Bytes;
use futures::stream::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};

use crate::error::OpenAIError;
use crate::types::Usage;

/// A single chunk from a streaming chat completion.
#[derive(Debug, Clone, Default)]
pub struct ChatCompletionChunk {
    /// The text delta for this chunk.
    pub delta: String,
    /// Model reported by the server, when present.
    pub model: Option<String>,
    /// Token usage; only the trailer chunk carries it.
    pub usage: Option<Usage>,
    pub finish_reason: Option<String>,
    /// Whether the stream is done.
    pub done: bool,
}

#[derive(Debug, serde::Deserialize)]
struct StreamChunkRaw {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<StreamChoiceRaw>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, serde::Deserialize)]
struct StreamChoiceRaw {
    delta: DeltaRaw,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct DeltaRaw {
    #[serde(default)]
    content: Option<String>,
}

/// Stream adapter that converts raw SSE bytes into `ChatCompletionChunk` values.
pub struct ChatCompletionStream {
    inner: Pin<Box<dyn Stream<Item = Result<Bytes, reqwest::Error>> + Send>>,
    /// Raw bytes not yet split into lines; may end mid-character
    buffer: Vec<u8>,
}

impl ChatCompletionStream {
    pub(crate) fn new(
        byte_stream: impl Stream<Item = Result<Bytes, reqwest::Error>> + Send + 'static,
    ) -> Self {
        Self {
            inner: Box::pin(byte_stream),
            buffer: Vec::new(),
        }
    }
}

impl Stream for ChatCompletionStream {
    type Item = Result<ChatCompletionChunk, OpenAIError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = try_parse_line(&mut this.buffer) {
                return Poll::Ready(Some(chunk));
            }

            match Pin::new(&mut this.inner).poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => this.buffer.extend_from_slice(&bytes),
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(OpenAIError::Network(e.to_string()))));
                }
                Poll::Ready(None) => {
                    if this.buffer.iter().all(u8::is_ascii_whitespace) {
                        return Poll::Ready(None);
                    }
                    // Flush a final line that arrived without a trailing newline
                    this.buffer.push(b'\n');
                    return Poll::Ready(try_parse_line(&mut this.buffer));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

/// Extract and parse the next complete SSE data line from the buffer.
///
/// Only whole lines are decoded, so a character split across network
/// chunks waits in the buffer until its remaining bytes arrive.
fn try_parse_line(buffer: &mut Vec<u8>) -> Option<Result<ChatCompletionChunk, OpenAIError>> {
    loop {
        let newline_pos = buffer.iter().position(|&b| b == b'\n')?;
        let raw: Vec<u8> = buffer.drain(..=newline_pos).collect();
        let line = match std::str::from_utf8(&raw) {
            Ok(text) => text.trim(),
            Err(e) => {
                return Some(Err(OpenAIError::Parse(format!(
                    "Invalid UTF-8 in stream: {}",
                    e
                ))));
            }
        };

        let Some(data) = line.strip_prefix("data:") else {
            // blank separators, "event:", "id:", "retry:"
            continue;
        };
        let data = data.trim();

        if data == "[DONE]" {
            return Some(Ok(ChatCompletionChunk {
                done: true,
                ..Default::default()
            }));
        }

        return Some(match serde_json::from_str::<StreamChunkRaw>(data) {
            Ok(raw) => {
                let (delta, finish_reason) = raw
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| (c.delta.content.unwrap_or_default(), c.finish_reason))
                    .unwrap_or_default();

                Ok(ChatCompletionChunk {
                    delta,
                    model: raw.model,
                    usage: raw.usage,
                    finish_reason,
                    done: false,
                })
            }
            Err(e) => Err(OpenAIError::Parse(format!(
                "Failed to parse stream chunk: {} (data: {})",
                e,
                crate::types::truncate_to_char_boundary(data, 200)
            ))),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    fn make_sse_bytes(lines: &[&str]) -> Vec<Result<Bytes, reqwest::Error>> {
        lines
            .iter()
            .map(|line| Ok(Bytes::from(format!("{}\n", line))))
            .collect()
    }

    #[tokio::test]
    async fn test_parse_tokens_then_done() {
        let data = make_sse_bytes(&[
            r#"data: {"model":"gpt-5-nano","choices":[{"delta":{"content":"Once"}}]}"#,
            "",
            r#"data: {"choices":[{"delta":{"content":" upon"}}]}"#,
            "",
            "data: [DONE]",
        ]);

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));

        let c1 = stream.next().await.unwrap().unwrap();
        assert_eq!(c1.delta, "Once");
        assert_eq!(c1.model.as_deref(), Some("gpt-5-nano"));

        let c2 = stream.next().await.unwrap().unwrap();
        assert_eq!(c2.delta, " upon");

        let done = stream.next().await.unwrap().unwrap();
        assert!(done.done);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_usage_trailer_has_no_choices() {
        let data = make_sse_bytes(&[
            r#"data: {"choices":[{"delta":{"content":"x"},"finish_reason":"stop"}]}"#,
            r#"data: {"choices":[],"usage":{"prompt_tokens":5,"completion_tokens":3,"total_tokens":8}}"#,
            "data: [DONE]",
        ]);

        let chunks: Vec<_> = ChatCompletionStream::new(futures::stream::iter(data))
            .collect()
            .await;

        let first = chunks[0].as_ref().unwrap();
        assert_eq!(first.finish_reason.as_deref(), Some("stop"));

        let trailer = chunks[1].as_ref().unwrap();
        assert_eq!(trailer.delta, "");
        assert_eq!(trailer.usage.map(|u| u.total_tokens), Some(8));
    }

    #[tokio::test]
    async fn test_line_split_across_byte_chunks() {
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::from(r#"data: {"choices":[{"del"#)),
            Ok(Bytes::from("ta\":{\"content\":\"Hi\"}}]}\n\n")),
        ];

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.delta, "Hi");
    }

    #[tokio::test]
    async fn test_multibyte_char_split_across_byte_chunks() {
        let line = "data: {\"choices\":[{\"delta\":{\"content\":\"Price 12€\"}}]}\n\n".as_bytes();
        let split = line.iter().position(|&b| b == 0xE2).unwrap() + 1;
        let data: Vec<Result<Bytes, reqwest::Error>> = vec![
            Ok(Bytes::copy_from_slice(&line[..split])),
            Ok(Bytes::copy_from_slice(&line[split..])),
            Ok(Bytes::from("data: [DONE]\n")),
        ];

        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));
        let chunk = stream.next().await.unwrap().unwrap();
        assert_eq!(chunk.delta, "Price 12€");
        assert!(stream.next().await.unwrap().unwrap().done);
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_parse_error() {
        let data: Vec<Result<Bytes, reqwest::Error>> =
            vec![Ok(Bytes::from_static(b"data: {\"x\": \"\xff\"}\n"))];
        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(err.to_string().contains("UTF-8"));
    }

    #[tokio::test]
    async fn test_malformed_chunk_is_parse_error() {
        let data = make_sse_bytes(&["data: {not json"]);
        let mut stream = ChatCompletionStream::new(futures::stream::iter(data));

        let err = stream.next().await.unwrap().unwrap_err();
        assert!(matches!(err, OpenAIError::Parse(_)));
    }
}
