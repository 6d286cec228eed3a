use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cuohe")]
#[command(author, version, about = "Telegram help-desk bot for a resource-matchmaking community", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (webhook when WEBHOOK_URL is set)
    Run {
        /// Use long polling even if WEBHOOK_URL is set
        #[arg(long)]
        polling: bool,
    },

    /// Ask the completion API one question and print the reply
    Ask {
        /// Question text
        prompt: String,
    },

    /// Print which integrations are configured and exit
    CheckConfig,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
