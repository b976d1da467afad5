//! # RKE2 cluster provider
//!
//! Renders the boot-time provisioning stages for a node joining an RKE2 cluster: the RKE2
//! configuration fragments, the container runtime proxy environment and the directives merging
//! the fragments and enabling the right service. Applying them is up to the host runtime.

pub mod cli;
pub mod cluster;
pub mod defaults;
pub mod environment;
pub mod plugin;
pub mod provider;
pub mod yip;
