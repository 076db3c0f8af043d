mod cli;
mod config;
mod repl;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use treehole_chat::{CardsClient, ChatCompletionsClient, ChatConfig, ChatSession};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().or_else(config::CliConfig::default_path);
    let config = config::CliConfig::load_from_path(config_path);
    config.apply_api_key_env();

    // Configure logging: always write to file so streamed replies own stdout
    let log_dir = config::ensure_data_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::daily(log_dir, "treehole.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(false)
        .with_level(true)
        .init();

    let chat_config = build_chat_config(&cli, &config)?;
    tracing::info!(model = %chat_config.model, "Starting treehole");

    let cards = config
        .default
        .cards_url
        .as_ref()
        .map(|url| CardsClient::new(url.clone()));

    let client = Arc::new(ChatCompletionsClient::new(chat_config.clone()));
    let mut session = ChatSession::new(client, chat_config.system_prompt.clone());

    repl::run(&mut session, cards.as_ref()).await
}

fn build_chat_config(cli: &Cli, config: &config::CliConfig) -> Result<ChatConfig> {
    let api_key = cli
        .api_key
        .clone()
        .or_else(|| std::env::var("DEEPSEEK_API_KEY").ok())
        .ok_or_else(|| {
            anyhow::anyhow!(
                "No API key. Pass --api-key, set TREEHOLE_API_KEY, or add one to the config file."
            )
        })?;

    let mut chat = ChatConfig::new(api_key);
    if let Some(model) = cli.model.clone().or_else(|| config.default.model.clone()) {
        chat = chat.with_model(model);
    }
    if let Some(base_url) = cli
        .base_url
        .clone()
        .or_else(|| config.default.base_url.clone())
    {
        chat = chat.with_base_url(base_url);
    }
    if let Some(prompt) = config.default.system_prompt.clone() {
        chat = chat.with_system_prompt(prompt);
    }
    Ok(chat)
}
