use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod backend;
mod config;
mod controller;
mod conversation;
mod ui;

use backend::{ChatBackend, HttpBackend};
use config::Config;
use ui::ChatApp;

#[derive(Parser)]
#[command(name = "chatr")]
#[command(version)]
#[command(about = "Terminal chat client for a remote chatbot backend", long_about = None)]
struct Cli {
    /// Backend base URL (overrides the configured value)
    #[arg(long)]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Download a conversation transcript without opening the TUI
    Export { conversation_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.backend {
        config.backend_url = url;
    }

    init_tracing(&config)?;

    let backend: Arc<dyn ChatBackend> = Arc::new(HttpBackend::new(config.backend_url.clone()));

    match cli.command {
        Some(Commands::Export { conversation_id }) => {
            let path = backend
                .export_conversation(&conversation_id, &config.export_dir)
                .await
                .context("Failed to export conversation")?;
            println!("📄 Transcript saved to {}", path.display());
        }
        None => {
            ChatApp::new(backend, &config).run().await?;
        }
    }

    Ok(())
}

/// Diagnostics go to a file so the alternate screen stays clean.
fn init_tracing(config: &Config) -> Result<()> {
    let file =
        std::fs::File::create(config.log_path()).context("Failed to create log file")?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::sync::Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
