//! Maps the node role to the RKE2 service and its initial settings.
use crate::cluster::Role;
use crate::defaults::{AGENT_SERVICE_NAME, SERVER_SERVICE_NAME, SUPERVISOR_PORT};
use crate::provider::error::RenderError;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{Display, Formatter};
use tracing::warn;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ServiceName {
    Server,
    Agent,
}

impl ServiceName {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceName::Server => SERVER_SERVICE_NAME,
            ServiceName::Agent => AGENT_SERVICE_NAME,
        }
    }
}

impl Display for ServiceName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub service_name: ServiceName,
    pub cluster_init: bool,
    pub token: String,
    /// Supervisor URL of the cluster to join, empty for the node initializing it.
    pub join_server: String,
    pub tls_subject_alt_names: Vec<String>,
}

/// Settings file consumed by RKE2.
#[derive(Debug, Serialize)]
struct Rke2Config<'a> {
    #[serde(rename = "cluster-init")]
    cluster_init: bool,
    token: &'a str,
    server: &'a str,
    #[serde(rename = "tls-san")]
    tls_san: &'a [String],
}

impl ServiceSettings {
    /// Represents the settings following the RKE2 configuration schema.
    pub fn to_rke2_config(&self) -> Result<Value, RenderError> {
        let config = Rke2Config {
            cluster_init: self.cluster_init,
            token: &self.token,
            server: &self.join_server,
            tls_san: &self.tls_subject_alt_names,
        };
        Ok(serde_json::to_value(config)?)
    }
}

/// Resolves the service settings for a node with the given `role`. The host is not validated,
/// it ends up verbatim in the join URL.
pub fn resolve(role: &Role, cluster_token: &str, control_plane_host: &str) -> ServiceSettings {
    let (service_name, cluster_init) = match role {
        Role::Init => (ServiceName::Server, true),
        Role::ControlPlane => (ServiceName::Server, false),
        Role::Worker => (ServiceName::Agent, false),
        Role::Unrecognized(role) => {
            warn!("unrecognized role `{role}`, falling back to the control-plane server settings");
            (ServiceName::Server, false)
        }
    };

    let join_server = if cluster_init {
        String::new()
    } else {
        if cluster_token.is_empty() {
            warn!(%role, "empty cluster token, the node will not be able to join the cluster");
        }
        format!("https://{control_plane_host}:{SUPERVISOR_PORT}")
    };

    ServiceSettings {
        service_name,
        cluster_init,
        token: cluster_token.to_string(),
        join_server,
        tls_subject_alt_names: vec![control_plane_host.to_string()],
    }
}
