//! `arena-train` binary entry point

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use arena_rl_core::ShutdownSignal;
use arena_trainer::{exit_status, install_shutdown_listener, Cli, Command};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // frames go to stdout, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let shutdown = ShutdownSignal::new();
    install_shutdown_listener(shutdown.clone());

    let result = match &cli.command {
        Command::Train(args) => arena_trainer::train(args, shutdown).await,
        Command::Watch(args) => arena_trainer::watch(args, shutdown).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => ExitCode::from(exit_status(&e)),
    }
}
