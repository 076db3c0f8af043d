//! Treehole Chat - streaming companion-chat engine
//!
//! This crate provides:
//! - A streaming chat-completion client (SSE over HTTP) with per-event
//!   error isolation
//! - Conversation session state with reset-safe delta application
//! - The card feed API client backing the browsing screen
//! - Explicit, injectable endpoint configuration

pub mod cards;
pub mod config;
pub mod error;
mod http_client;
pub mod llm;
pub mod session;

// Re-export commonly used types
pub use cards::{Card, CardPage, CardsClient};
pub use config::ChatConfig;
pub use error::{ChatError, Result};
pub use llm::{
    ChatClient, ChatCompletionsClient, CompletionResponse, EventStream, FinishReason, Message,
    MockChatClient, MockStep, Role, StreamEvent,
};
pub use session::{
    Applied, ChatSession, ConversationMessage, MessageId, MoodTag, ReplyTicket,
};
