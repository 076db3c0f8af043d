//! Chat client trait and types

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::{ChatError, Result};

/// Chat message role
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message as sent over the wire
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Reason the server gave for ending a reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Other(String),
}

impl FinishReason {
    pub(crate) fn from_wire(reason: &str) -> Self {
        match reason {
            "stop" => Self::Stop,
            "length" => Self::Length,
            other => Self::Other(other.to_string()),
        }
    }
}

/// One decoded event from a streamed reply.
///
/// `Invalid` is a per-event notification: one undecodable payload must not
/// abort an otherwise-healthy stream, so it is surfaced as an item rather
/// than as a stream error. Terminal transport and HTTP failures arrive as
/// the `Err` side of the stream item instead.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// Incremental assistant text
    Delta(String),
    /// Decoded audio payload for the playback layer
    Audio(Vec<u8>),
    /// The server closed the current reply
    Finish(FinishReason),
    /// One event payload could not be decoded; the stream continues
    Invalid { reason: String },
}

/// Ordered stream of reply events. An `Err` item is terminal.
pub type EventStream = Pin<Box<dyn Stream<Item = std::result::Result<StreamEvent, ChatError>> + Send>>;

/// Non-streaming completion response
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    pub content: Option<String>,
    pub finish_reason: FinishReason,
}

/// Chat client trait
#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Get provider name
    fn provider(&self) -> &str;

    /// Get model name
    fn model(&self) -> &str;

    /// Complete a chat request in one round trip
    async fn complete(&self, messages: Vec<Message>) -> Result<CompletionResponse>;

    /// Complete a chat request as an ordered stream of events
    fn stream(&self, messages: Vec<Message>) -> EventStream;
}
