//! Chat endpoint configuration
//!
//! Credentials and endpoint details are always passed in explicitly; nothing
//! here is read from hardcoded service literals at request time.

use serde::{Deserialize, Serialize};

/// Default chat completions endpoint (DeepSeek-compatible).
pub const DEFAULT_BASE_URL: &str = "https://api.deepseek.com";

/// Default model served at the chat completions endpoint.
pub const DEFAULT_MODEL: &str = "deepseek-chat";

/// Default companion system prompt.
pub const DEFAULT_SYSTEM_PROMPT: &str =
    "你是一个温暖且富有同情心的AI助手，专门倾听和安慰用户的心声。";

/// Configuration for the chat completions client
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Base URL of the chat completions service
    pub base_url: String,
    /// Bearer token sent in the Authorization header
    pub api_key: String,
    /// Model name embedded in every request
    pub model: String,
    /// System prompt prepended to the conversation history
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

impl ChatConfig {
    /// Create a config with the given API key and defaults for the rest
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the system prompt
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }
}
