//! Command line arguments

use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "treehole", about = "Companion chat in your terminal", version)]
pub struct Cli {
    /// Model to use
    #[arg(long)]
    pub model: Option<String>,

    /// Chat completions base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// API key (falls back to DEEPSEEK_API_KEY or the config file)
    #[arg(long, env = "TREEHOLE_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Path to an alternate config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}
