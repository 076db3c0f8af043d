//! Deterministic mock chat client for tests.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

use crate::error::{ChatError, Result};

use super::{
    ChatClient, CompletionResponse, EventStream, FinishReason, Message, Role, StreamEvent,
};

/// Deterministic step for scripted mock replies.
#[derive(Debug, Clone)]
pub enum MockStepKind {
    /// Stream the reply as the given deltas, then finish.
    Deltas(Vec<String>),
    /// Return a chat service error before any delta.
    Error(String),
}

/// Scripted reply step with optional delay.
#[derive(Debug, Clone)]
pub struct MockStep {
    pub delay_ms: u64,
    pub kind: MockStepKind,
}

impl MockStep {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Deltas(vec![content.into()]),
        }
    }

    pub fn deltas(deltas: Vec<&str>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Deltas(deltas.into_iter().map(str::to_string).collect()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            kind: MockStepKind::Error(message.into()),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }
}

/// A deterministic mock chat client driven by scripted steps.
#[derive(Debug, Clone, Default)]
pub struct MockChatClient {
    model: String,
    script: Arc<Mutex<VecDeque<MockStep>>>,
}

impl MockChatClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<MockStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
        }
    }

    pub async fn push_step(&self, step: MockStep) {
        self.script.lock().await.push_back(step);
    }

    async fn next_step(&self) -> Option<MockStep> {
        self.script.lock().await.pop_front()
    }

    fn fallback_reply(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|msg| msg.role == Role::User)
            .map(|msg| format!("mock-echo: {}", msg.content))
            .unwrap_or_else(|| "mock-ok".to_string())
    }
}

#[async_trait]
impl ChatClient for MockChatClient {
    fn provider(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<CompletionResponse> {
        let step = self.next_step().await;
        let Some(step) = step else {
            return Ok(CompletionResponse {
                content: Some(Self::fallback_reply(&messages)),
                finish_reason: FinishReason::Stop,
            });
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        match step.kind {
            MockStepKind::Deltas(deltas) => Ok(CompletionResponse {
                content: Some(deltas.concat()),
                finish_reason: FinishReason::Stop,
            }),
            MockStepKind::Error(message) => Err(ChatError::Service(message)),
        }
    }

    fn stream(&self, messages: Vec<Message>) -> EventStream {
        let client = self.clone();
        Box::pin(async_stream::stream! {
            let step = client.next_step().await;
            let Some(step) = step else {
                yield Ok(StreamEvent::Delta(Self::fallback_reply(&messages)));
                yield Ok(StreamEvent::Finish(FinishReason::Stop));
                return;
            };

            if step.delay_ms > 0 {
                sleep(Duration::from_millis(step.delay_ms)).await;
            }

            match step.kind {
                MockStepKind::Deltas(deltas) => {
                    for delta in deltas {
                        yield Ok(StreamEvent::Delta(delta));
                    }
                    yield Ok(StreamEvent::Finish(FinishReason::Stop));
                }
                MockStepKind::Error(message) => {
                    yield Err(ChatError::Service(message));
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::StreamExt;

    use super::*;

    #[tokio::test]
    async fn mock_client_returns_scripted_text() {
        let client = MockChatClient::from_steps("mock-model", vec![MockStep::text("hello")]);

        let response = client
            .complete(vec![Message::user("ping")])
            .await
            .expect("mock response should succeed");

        assert_eq!(response.content.as_deref(), Some("hello"));
        assert_eq!(response.finish_reason, FinishReason::Stop);
    }

    #[tokio::test]
    async fn mock_client_streams_deltas_in_order() {
        let client =
            MockChatClient::from_steps("mock-model", vec![MockStep::deltas(vec!["Hi", " there"])]);

        let events: Vec<_> = client
            .stream(vec![Message::user("hi")])
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .collect::<std::result::Result<_, _>>()
            .expect("stream should succeed");

        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("Hi".to_string()),
                StreamEvent::Delta(" there".to_string()),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );
    }

    #[tokio::test]
    async fn mock_client_echoes_without_script() {
        let client = MockChatClient::new("mock-model");

        let response = client
            .complete(vec![Message::user("ping")])
            .await
            .expect("fallback response should succeed");

        assert_eq!(response.content.as_deref(), Some("mock-echo: ping"));
    }
}
