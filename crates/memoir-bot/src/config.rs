use clap::{Args, Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "memoir-bot")]
#[command(version, about = "Memoir - a personal assistant with long-term memory")]
pub struct Cli {
    #[command(flatten)]
    pub settings: Settings,

    #[command(subcommand)]
    pub command: Command,
}

/// Process settings, read once at startup. Missing required values abort
/// before anything connects.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// API key of the OpenAI-compatible provider
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub openai_api_key: String,

    /// Base URL of the OpenAI-compatible provider
    #[arg(long, env = "OPENAI_BASE_PROVIDER", default_value = "https://api.openai.com/v1")]
    pub openai_base_provider: String,

    /// Chat model
    #[arg(long, env = "OPENAI_MODEL", default_value = "gpt-4o-2024-11-20")]
    pub openai_model: String,

    /// Embedding model for recall memories
    #[arg(long, env = "OPENAI_EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub openai_embedding_model: String,

    /// Requested embedding dimensions
    #[arg(long, env = "OPENAI_EMBEDDING_DIMENSIONS", default_value_t = 1024)]
    pub embedding_dimensions: usize,

    /// Conversation store (users, transcripts, core memories)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Recall memory store
    #[arg(long, env = "PGVECTOR_URL")]
    pub pgvector_url: String,

    /// Maximum model calls per turn
    #[arg(long, env = "MEMOIR_MAX_ITERATIONS", default_value_t = 8)]
    pub max_iterations: usize,

    /// Per-turn timeout in seconds
    #[arg(long, env = "MEMOIR_TURN_TIMEOUT_SECS", default_value_t = 120)]
    pub turn_timeout_secs: u64,
}

impl Settings {
    pub fn turn_timeout(&self) -> Duration {
        Duration::from_secs(self.turn_timeout_secs)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve a Telegram bot (long polling)
    Telegram {
        /// Telegram bot token
        #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
        bot_token: String,
    },

    /// Chat from the terminal, one message per line
    Chat {
        /// Platform user id to chat as
        #[arg(long, default_value_t = 1)]
        user_id: i64,

        /// Display name to register on first contact
        #[arg(long)]
        name: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [&str; 7] = [
        "memoir-bot",
        "--openai-api-key",
        "sk-test",
        "--database-url",
        "sqlite::memory:",
        "--pgvector-url",
        "sqlite::memory:",
    ];

    #[test]
    fn test_defaults_apply() {
        let cli = Cli::try_parse_from(REQUIRED.iter().copied().chain(["chat"])).unwrap();

        assert_eq!(cli.settings.openai_model, "gpt-4o-2024-11-20");
        assert_eq!(cli.settings.embedding_dimensions, 1024);
        assert_eq!(cli.settings.turn_timeout(), Duration::from_secs(120));
        assert!(matches!(cli.command, Command::Chat { user_id: 1, name: None }));
    }

    #[test]
    fn test_telegram_takes_bot_token() {
        let cli = Cli::try_parse_from(
            REQUIRED
                .iter()
                .copied()
                .chain(["telegram", "--bot-token", "123:abc"]),
        )
        .unwrap();

        assert!(matches!(
            cli.command,
            Command::Telegram { ref bot_token } if bot_token == "123:abc"
        ));
    }
}
