//! foundryup - the Foundry toolchain installer

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use foundryup_cli::{Cli, Config, cmd};

#[tokio::main]
async fn main() -> ExitCode {
    // Diagnostics go to stderr and stay quiet unless RUST_LOG is set
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help prints to stdout and is a success
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let config = Config::from(cli);
    tracing::debug!(?config, "parsed flags");

    match cmd::run(&config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
