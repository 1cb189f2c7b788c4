//! Server-Sent Events parsing for streamed completions.
//!
//! The completion API delivers streamed responses as SSE with typed
//! events (message_start, content_block_delta, message_delta,
//! message_stop, ...). This module buffers the byte stream, splits it on
//! blank-line event boundaries, and surfaces the text deltas and stop
//! reason as `CompletionChunk`s.

use bytes::Bytes;
use futures::Stream;
use serde::Deserialize;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::warn;

use super::error::CompletionApiError;
use crate::domain::ports::completion::{CompletionChunk, Result};

/// Streaming event taxonomy of the completion API.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum SseEvent {
    MessageStart {},
    ContentBlockStart {},
    ContentBlockDelta { delta: Delta },
    ContentBlockStop {},
    MessageDelta { delta: MessageDeltaData },
    MessageStop,
    Ping,
    Error { error: ErrorData },
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Delta {
    TextDelta { text: String },
    InputJsonDelta {},
}

#[derive(Debug, Deserialize)]
struct MessageDeltaData {
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorData {
    message: String,
}

/// Adapts an SSE byte stream into a `CompletionChunk` stream.
pub struct SseChunkStream {
    inner: Pin<Box<dyn Stream<Item = reqwest::Result<Bytes>> + Send>>,
    buffer: String,
    pending: VecDeque<CompletionChunk>,
    done: bool,
}

impl SseChunkStream {
    pub fn new(inner: impl Stream<Item = reqwest::Result<Bytes>> + Send + 'static) -> Self {
        Self {
            inner: Box::pin(inner),
            buffer: String::new(),
            pending: VecDeque::new(),
            done: false,
        }
    }

    /// Split complete events off the buffer and queue their chunks.
    ///
    /// Returns an error only for an explicit error event from the server;
    /// unparseable events are skipped (the API may add event types).
    fn drain_buffer(&mut self) -> std::result::Result<(), CompletionApiError> {
        while let Some(boundary) = self.buffer.find("\n\n") {
            let raw_event = self.buffer[..boundary].to_string();
            self.buffer.drain(..boundary + 2);

            for line in raw_event.lines() {
                let Some(data) = line.strip_prefix("data:") else {
                    continue;
                };

                match serde_json::from_str::<SseEvent>(data.trim()) {
                    Ok(SseEvent::ContentBlockDelta {
                        delta: Delta::TextDelta { text },
                    }) => {
                        self.pending.push_back(CompletionChunk {
                            delta: Some(text),
                            stop_reason: None,
                        });
                    }
                    Ok(SseEvent::MessageDelta { delta }) => {
                        if delta.stop_reason.is_some() {
                            self.pending.push_back(CompletionChunk {
                                delta: None,
                                stop_reason: delta.stop_reason,
                            });
                        }
                    }
                    Ok(SseEvent::MessageStop) => {
                        self.done = true;
                    }
                    Ok(SseEvent::Error { error }) => {
                        self.done = true;
                        return Err(CompletionApiError::ServerError(error.message));
                    }
                    Ok(_) => {}
                    Err(err) => {
                        warn!("skipping unparseable stream event: {err}");
                    }
                }
            }
        }
        Ok(())
    }
}

impl Stream for SseChunkStream {
    type Item = Result<CompletionChunk>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();

        loop {
            if let Some(chunk) = this.pending.pop_front() {
                return Poll::Ready(Some(Ok(chunk)));
            }
            if this.done {
                return Poll::Ready(None);
            }

            match this.inner.as_mut().poll_next(cx) {
                Poll::Ready(Some(Ok(bytes))) => {
                    this.buffer.push_str(&String::from_utf8_lossy(&bytes));
                    if let Err(err) = this.drain_buffer() {
                        return Poll::Ready(Some(Err(Box::new(err))));
                    }
                }
                Poll::Ready(Some(Err(err))) => {
                    this.done = true;
                    let mapped = if err.is_timeout() {
                        CompletionApiError::Timeout
                    } else {
                        CompletionApiError::NetworkError(err)
                    };
                    return Poll::Ready(Some(Err(Box::new(mapped))));
                }
                Poll::Ready(None) => {
                    this.done = true;
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
