use clap::Parser;

use herald::cli::commands::send::SendArgs;
use herald::cli::commands::{config, send};
use herald::cli::{Cli, Commands, ConfigAction};
use herald::config::{Paths, load_config};
use herald::telemetry::{TracingConfig, init_tracing};

// Single-threaded so the thread-default subscriber covers every spawned send.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Paths::config_file);

    let Some(command) = cli.command else {
        println!("herald - notification fan-out");
        println!("Use --help to see available commands");
        return Ok(());
    };

    match command {
        Commands::Send {
            subject,
            message,
            timeout,
        } => {
            let loaded = load_config(&config_path)?;
            let tracing_config = match &loaded {
                Some(loaded) => TracingConfig::from_logging(&loaded.logging, cli.debug)?,
                None => TracingConfig::from_env(cli.debug),
            };
            let _guard = init_tracing(&tracing_config)?;

            send::handle_send(
                &loaded.unwrap_or_default(),
                &config_path,
                SendArgs {
                    subject: &subject,
                    message: &message,
                    timeout,
                },
            )
            .await
        }
        Commands::Config { action } => {
            let _guard = init_tracing(&TracingConfig::from_env(cli.debug))?;
            match action {
                ConfigAction::Init { force } => config::handle_init(force, &config_path),
                ConfigAction::Show { json } => config::handle_show(&config_path, json),
                ConfigAction::Validate => config::handle_validate(&config_path),
            }
        }
    }
}
