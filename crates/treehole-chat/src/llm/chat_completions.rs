//! Chat completions client for DeepSeek-compatible endpoints

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::{ChatError, Result, response_to_error};
use crate::http_client::build_http_client;
use crate::llm::client::{
    ChatClient, CompletionResponse, EventStream, FinishReason, Message, StreamEvent,
};
use crate::llm::sse::SseBuffer;

/// Client for an OpenAI-compatible `/chat/completions` endpoint
pub struct ChatCompletionsClient {
    client: Client,
    config: ChatConfig,
}

impl ChatCompletionsClient {
    /// Create a new client from explicit configuration
    pub fn new(config: ChatConfig) -> Self {
        Self {
            client: build_http_client(),
            config,
        }
    }

    /// Create with a custom reqwest client
    pub fn with_client(config: ChatConfig, client: Client) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    stream: bool,
}

#[derive(Deserialize)]
struct WireResponse {
    choices: Vec<WireChoice>,
}

#[derive(Deserialize)]
struct WireChoice {
    message: WireMessage,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct WireMessage {
    content: Option<String>,
}

// Streaming types

#[derive(Deserialize, Debug)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    audio: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    delta: Option<StreamDelta>,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamDelta {
    content: Option<String>,
}

/// Decode one SSE payload into reply events.
///
/// A payload that fails to decode produces a single `Invalid` event; the
/// stream itself keeps going.
fn decode_events(payload: &str) -> Vec<StreamEvent> {
    let parsed: StreamResponse = match serde_json::from_str(payload) {
        Ok(parsed) => parsed,
        Err(err) => {
            tracing::warn!(error = %err, "Skipping undecodable stream event");
            return vec![StreamEvent::Invalid {
                reason: err.to_string(),
            }];
        }
    };

    let mut events = Vec::new();
    for choice in parsed.choices {
        if let Some(delta) = choice.delta
            && let Some(content) = delta.content
            && !content.is_empty()
        {
            events.push(StreamEvent::Delta(content));
        }
        if let Some(reason) = choice.finish_reason {
            events.push(StreamEvent::Finish(FinishReason::from_wire(&reason)));
        }
    }

    if let Some(audio) = parsed.audio
        && !audio.is_empty()
    {
        match BASE64.decode(&audio) {
            Ok(bytes) => events.push(StreamEvent::Audio(bytes)),
            Err(err) => events.push(StreamEvent::Invalid {
                reason: format!("bad audio payload: {err}"),
            }),
        }
    }

    events
}

#[async_trait]
impl ChatClient for ChatCompletionsClient {
    fn provider(&self) -> &str {
        "deepseek"
    }

    fn model(&self) -> &str {
        &self.config.model
    }

    async fn complete(&self, messages: Vec<Message>) -> Result<CompletionResponse> {
        let body = WireRequest {
            model: &self.config.model,
            messages: &messages,
            stream: false,
        };

        let response = self
            .client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        let data: WireResponse = response.json().await?;
        let choice = data
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ChatError::Service("no choices in response".to_string()))?;

        let finish_reason = choice
            .finish_reason
            .as_deref()
            .map(FinishReason::from_wire)
            .unwrap_or(FinishReason::Stop);

        Ok(CompletionResponse {
            content: choice.message.content,
            finish_reason,
        })
    }

    fn stream(&self, messages: Vec<Message>) -> EventStream {
        let client = self.client.clone();
        let endpoint = self.endpoint();
        let api_key = self.config.api_key.clone();
        let model = self.config.model.clone();

        Box::pin(async_stream::stream! {
            let body = WireRequest {
                model: &model,
                messages: &messages,
                stream: true,
            };

            let response = match client
                .post(&endpoint)
                .header("Authorization", format!("Bearer {}", api_key))
                .header("Content-Type", "application/json")
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(err) => {
                    yield Err(ChatError::Http(err));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(response_to_error(response).await);
                return;
            }

            let mut byte_stream = response.bytes_stream();
            let mut buffer = SseBuffer::new();

            while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(err) => {
                        yield Err(ChatError::Http(err));
                        return;
                    }
                };

                for payload in buffer.push(&chunk) {
                    for event in decode_events(&payload) {
                        yield Ok(event);
                    }
                }
                if buffer.is_done() {
                    return;
                }
            }

            // The transport can close without a [DONE] sentinel; drain
            // whatever complete payload is still buffered.
            for payload in buffer.finish() {
                for event in decode_events(&payload) {
                    yield Ok(event);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_content_delta() {
        let events = decode_events(r#"{"choices":[{"delta":{"content":"Hi"}}]}"#);
        assert_eq!(events, vec![StreamEvent::Delta("Hi".to_string())]);
    }

    #[test]
    fn decode_finish_reason_after_delta() {
        let events =
            decode_events(r#"{"choices":[{"delta":{"content":"bye"},"finish_reason":"stop"}]}"#);
        assert_eq!(
            events,
            vec![
                StreamEvent::Delta("bye".to_string()),
                StreamEvent::Finish(FinishReason::Stop),
            ]
        );
    }

    #[test]
    fn decode_empty_delta_yields_nothing() {
        let events = decode_events(r#"{"choices":[{"delta":{"content":""}}]}"#);
        assert!(events.is_empty());
    }

    #[test]
    fn decode_audio_payload() {
        let events = decode_events(r#"{"choices":[],"audio":"aGVsbG8="}"#);
        assert_eq!(events, vec![StreamEvent::Audio(b"hello".to_vec())]);
    }

    #[test]
    fn malformed_json_becomes_invalid_event() {
        let events = decode_events("{not json");
        assert!(matches!(events.as_slice(), [StreamEvent::Invalid { .. }]));
    }

    #[test]
    fn bad_audio_is_invalid_but_deltas_survive() {
        let events =
            decode_events(r#"{"choices":[{"delta":{"content":"ok"}}],"audio":"!!not-base64!!"}"#);
        assert_eq!(events[0], StreamEvent::Delta("ok".to_string()));
        assert!(matches!(events[1], StreamEvent::Invalid { .. }));
    }
}
