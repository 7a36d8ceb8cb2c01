mod args;
mod commands;
mod progress;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use args::{Cli, Commands};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity; console output covers the default case
    let filter = match cli.verbose {
        0 => "ytmp3=warn",
        1 => "ytmp3=info",
        2 => "ytmp3=debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    let output = cli.output.as_deref();
    let config_path = cli.config.as_deref();

    match cli.command {
        Some(Commands::Convert { url, quality }) => {
            commands::convert::run(&url, quality.into(), output, config_path).await
        }
        Some(Commands::Doctor) => commands::doctor::run(config_path).await,
        Some(Commands::Config) => commands::config::run(config_path).await,
        None => commands::interactive::run(output, config_path).await,
    }
}
