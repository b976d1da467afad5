use std::process::ExitCode;

use clap::Parser;
use rke2_cluster_provider::cli::{self, logs, Args};
use tracing::error;

fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = logs::init(args.log_level) {
        eprintln!("Failed to initialize tracing: {err}");
        return cli::error::CliError::from(err).into();
    }

    if let Err(err) = cli::run(args, std::io::stdin().lock(), std::io::stdout().lock()) {
        error!("{err}");
        return err.into();
    }

    ExitCode::SUCCESS
}
