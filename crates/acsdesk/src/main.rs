mod cli;
mod commands;
mod error;
mod output;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use acsdesk_core::{Console, LatencyProfile};

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Ui;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "acsdesk", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let settings_path = cli
                .global
                .config
                .clone()
                .unwrap_or_else(acsdesk_config::config_path);
            let settings = acsdesk_config::load_settings_from(&settings_path)?;

            let mut config = settings.to_console_config();
            if cli.global.instant {
                config.latency = LatencyProfile::instant();
            }
            let console = Console::new(config, Arc::new(settings.storage()));
            let ui = Ui::resolve(&cli.global, &settings);

            tracing::debug!(command = ?cmd, settings = %settings_path.display(), "dispatching command");
            commands::dispatch(cmd, &console, &settings, &settings_path, &ui).await
        }
    }
}
