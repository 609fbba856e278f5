//! Command-line interface.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sharefile-bot", about = "Telegram bot for sharing media files by link", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the bot (default)
    Run {
        /// Receive updates over a webhook instead of long polling
        #[arg(long)]
        webhook: bool,
    },
    /// Apply the database schema and exit
    Migrate,
}
