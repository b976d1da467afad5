//! RKE2 provisioning logic: role resolution, proxy settings and rendering of the boot document.

pub mod error;
pub mod proxy;
pub mod renderer;
pub mod settings;

/// Selects how the container runtime environment file is rendered.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, clap::ValueEnum)]
pub enum EnvFileStrategy {
    /// Each proxy variable is followed by its `CONTAINERD_` prefixed twin.
    #[default]
    Containerd,
    /// Bare proxy variables only, the units are reloaded to pick the file up.
    Plain,
}
