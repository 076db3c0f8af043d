//! Card feed API client

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Result, response_to_error};
use crate::http_client::build_http_client;

/// One card in the browsing feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    pub card_id: i64,
    pub content: String,
    pub created_at: String,
    pub audio_url: Option<String>,
    pub background_music_url: Option<String>,
    pub mood: String,
    pub is_discussion_card: bool,
    pub tags: Vec<String>,
}

/// One page of the card feed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardPage {
    pub cards: Vec<Card>,
    pub total: u32,
    pub pages: u32,
    pub current_page: u32,
}

/// Client for the card feed service
pub struct CardsClient {
    client: Client,
    base_url: String,
}

impl CardsClient {
    /// Create a new client for the given feed service
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            base_url: base_url.into(),
        }
    }

    /// Create with a custom reqwest client
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch one page of the card feed
    pub async fn fetch_cards(&self, page: u32) -> Result<CardPage> {
        let url = format!("{}/cards?page={}", self.base_url, page);
        self.get_page(&url).await
    }

    /// Search cards by free-text query
    pub async fn search_cards(&self, query: &str) -> Result<CardPage> {
        let url = format!(
            "{}/cards/search?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        self.get_page(&url).await
    }

    async fn get_page(&self, url: &str) -> Result<CardPage> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(response_to_error(response).await);
        }

        Ok(response.json().await?)
    }
}
