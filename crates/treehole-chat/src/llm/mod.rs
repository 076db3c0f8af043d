//! LLM module - streaming chat completion client

mod chat_completions;
mod client;
mod mock;
pub mod sse;

pub use chat_completions::ChatCompletionsClient;
pub use client::{
    ChatClient, CompletionResponse, EventStream, FinishReason, Message, Role, StreamEvent,
};
pub use mock::{MockChatClient, MockStep, MockStepKind};
