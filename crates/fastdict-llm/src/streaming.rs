use std::pin::Pin;
use anyhow::Result;
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::buffer_utils::CircularLineBuffer;

/// Provider-agnostic event produced while a completion streams in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Message {
        content: String,
    },

    Done {
        #[serde(skip_serializing_if = "Option::is_none")]
        finish_reason: Option<String>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatStreamChunk {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub choices: Vec<StreamChoice>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StreamError>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamChoice {
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub delta: Delta,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Delta {
    pub role: Option<String>,
    pub content: Option<String>,
}

/// Error object some providers send in-band instead of failing the request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamError {
    pub message: String,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
}

impl ChatStreamChunk {
    pub fn content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.delta.content.as_deref())
    }

    pub fn is_done(&self) -> bool {
        self.choices
            .first()
            .and_then(|c| c.finish_reason.as_ref())
            .is_some()
    }

    fn to_stream_events(&self) -> Vec<StreamEvent> {
        let mut events = Vec::new();

        if let Some(choice) = self.choices.first() {
            if let Some(content) = &choice.delta.content {
                if !content.is_empty() {
                    events.push(StreamEvent::Message {
                        content: content.clone(),
                    });
                }
            }

            if let Some(finish_reason) = &choice.finish_reason {
                events.push(StreamEvent::Done {
                    finish_reason: Some(finish_reason.clone()),
                });
            }
        }

        events
    }
}

/// Turn a raw chat-completions SSE body into [`StreamEvent`]s.
///
/// Works on any stream of byte chunks so it can be fed from
/// `reqwest::Response::bytes_stream` or from memory. At most one `Done` is
/// emitted. A body that ends before any completion marker is an error.
pub fn parse_chat_sse_stream<S, B, E>(
    byte_stream: S,
) -> Pin<Box<dyn Stream<Item = Result<StreamEvent>> + Send>>
where
    S: Stream<Item = std::result::Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    Box::pin(async_stream::stream! {
        let mut byte_chunks = Box::pin(byte_stream);
        let mut buffer = CircularLineBuffer::with_capacity(8192);
        let mut finished = false;

        'read: loop {
            let chunk_result = byte_chunks.next().await;
            let at_eof = chunk_result.is_none();

            match chunk_result {
                Some(Ok(bytes)) => buffer.extend(bytes.as_ref()),
                Some(Err(e)) => {
                    yield Err(anyhow::anyhow!("Stream error: {}", e));
                    return;
                }
                None => {}
            }

            loop {
                let next = if at_eof { buffer.finish() } else { buffer.next_line() };
                let line = match next {
                    Some(Ok(line)) => line,
                    Some(Err(e)) => {
                        yield Err(e);
                        continue;
                    }
                    None => break,
                };

                let data = match line.strip_prefix("data:") {
                    Some(data) => data.trim_start(),
                    None => continue,
                };

                if data == "[DONE]" {
                    if !finished {
                        yield Ok(StreamEvent::Done { finish_reason: None });
                    }
                    finished = true;
                    break 'read;
                }

                match serde_json::from_str::<ChatStreamChunk>(data) {
                    Ok(chunk) => {
                        if let Some(error) = chunk.error {
                            yield Err(anyhow::anyhow!("Upstream stream error: {}", error.message));
                            return;
                        }
                        for event in chunk.to_stream_events() {
                            if matches!(event, StreamEvent::Done { .. }) {
                                if finished {
                                    continue;
                                }
                                finished = true;
                            }
                            yield Ok(event);
                        }
                    }
                    Err(e) => yield Err(anyhow::anyhow!("Failed to parse chat chunk: {}", e)),
                }
            }

            if at_eof {
                break;
            }
        }

        if !finished {
            yield Err(anyhow::anyhow!("Stream ended before completion"));
        }
    })
}
