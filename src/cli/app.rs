use std::path::PathBuf;

use clap::Parser;

/// Fan a notification out to every configured target
#[derive(Parser, Debug)]
#[command(name = "herald", author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// Path to the configuration file
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Send a notification to all configured targets
    Send {
        /// Notification subject
        #[arg(short, long)]
        subject: String,
        /// Notification body
        #[arg(short, long)]
        message: String,
        /// Overall deadline in seconds (overrides notifications.timeout_secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigAction {
    /// Initialize configuration file
    Init {
        /// Overwrite an existing file without asking
        #[arg(short, long)]
        force: bool,
    },
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate configuration
    Validate,
}
