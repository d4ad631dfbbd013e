mod app;
mod chat;
mod config;
mod telegram;

use anyhow::Result;
use app::App;
use clap::Parser;
use config::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads the environment
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let app = App::initialize(&cli.settings).await?;

    let result = match cli.command {
        Command::Telegram { bot_token } => {
            telegram::run(bot_token, app.handler()).await;
            Ok(())
        }
        Command::Chat { user_id, name } => chat::run(app.handler(), user_id, name).await,
    };

    app.shutdown().await;
    result
}
