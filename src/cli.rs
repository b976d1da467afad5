//! Command line entry point of the provider.
use crate::cli::error::CliError;
use crate::defaults::CONFIG_SCAN_DIRS;
use crate::environment::scanner::DirectoryScanner;
use crate::plugin::ClusterPlugin;
use crate::provider::renderer::Renderer;
use crate::provider::EnvFileStrategy;
use std::io::{Read, Write};
use std::path::PathBuf;
use tracing::Level;

pub mod error;
pub mod logs;

/// RKE2 cluster provider for the Kairos plugin bus.
#[derive(Debug, clap::Parser)]
#[command(version, about)]
pub struct Args {
    /// Event emitted by the host runtime
    pub event: String,

    /// Log level for the provider
    #[arg(long, env = "RKE2_PROVIDER_LOG_LEVEL", default_value = "info")]
    pub log_level: Level,

    /// Format of the container runtime environment file
    #[arg(
        long,
        env = "RKE2_PROVIDER_ENV_FILE_STRATEGY",
        value_enum,
        default_value_t = EnvFileStrategy::Containerd
    )]
    pub env_file_strategy: EnvFileStrategy,

    /// Directory scanned for cloud-config `env` entries. Can be repeated, later directories take
    /// precedence.
    #[arg(long = "config-scan-dir", value_name = "DIR", default_values = CONFIG_SCAN_DIRS)]
    pub config_scan_dirs: Vec<PathBuf>,
}

/// Handles the event read from `input`, writing the response to `output`.
pub fn run<R, W>(args: Args, input: R, output: W) -> Result<(), CliError>
where
    R: Read,
    W: Write,
{
    let plugin = ClusterPlugin::new(
        Renderer::new(args.env_file_strategy),
        DirectoryScanner::new(args.config_scan_dirs),
    );
    plugin.run(&args.event, input, output)?;
    Ok(())
}
