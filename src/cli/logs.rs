use thiserror::Error;
use tracing::level_filters::LevelFilter;
use tracing::{debug, Level};
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::EnvFilter;

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
/// Allows fine-grained directives on top of the configured level, e.g. `rke2_cluster_provider=trace`.
const LOG_FILTER_ENV_VAR: &str = "RKE2_PROVIDER_LOG_FILTER";

#[derive(Error, Debug)]
pub enum TracingError {
    #[error("init logging error: `{0}`")]
    TryInit(String),
}

/// Initializes logging (through the tracing crate) for the provider. Standard output carries the
/// plugin response, so logs are written to standard error.
pub fn init(log_level: Level) -> Result<(), TracingError> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(log_level).into())
        .with_env_var(LOG_FILTER_ENV_VAR)
        .from_env()
        .map_err(|err| TracingError::TryInit(format!("invalid {LOG_FILTER_ENV_VAR}: {err}")))?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIME_FORMAT.to_string()))
        .with_env_filter(env_filter)
        .try_init()
        .map_err(|err| TracingError::TryInit(err.to_string()))?;

    debug!("Logging initialized successfully");
    Ok(())
}
