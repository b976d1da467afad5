use std::process::ExitCode;

use thiserror::Error;

use crate::cli::logs::TracingError;
use crate::plugin::PluginError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("failed to initialize logs: {0}")]
    Tracing(#[from] TracingError),

    #[error("{0}")]
    Plugin(#[from] PluginError),
}

impl From<CliError> for ExitCode {
    /// Converts the error to an exit code.
    ///
    /// We comply with the [Advanced Bash Scripting Guide] and
    /// [BSD guidelines] for the exit codes.
    ///
    /// [Advanced Bash Scripting Guide]: https://tldp.org/LDP/abs/html/exitcodes.html
    /// [BSD guidelines]: https://man.freebsd.org/cgi/man.cgi?query=sysexits&manpath=FreeBSD+4.3-RELEASE
    fn from(value: CliError) -> Self {
        match value {
            CliError::Tracing(_) => Self::from(70),
            CliError::Plugin(_) => Self::from(1),
        }
    }
}
