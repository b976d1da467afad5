//! Cluster descriptor handed over by the host runtime.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};

const ROLE_INIT: &str = "init";
const ROLE_CONTROL_PLANE: &str = "controlplane";
const ROLE_WORKER: &str = "worker";

/// Role assigned to the node within the cluster.
///
/// Values outside the known set are kept as [Role::Unrecognized] instead of failing, the resolver
/// decides how to treat them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    /// Control-plane node bootstrapping the cluster.
    Init,
    /// Control-plane node joining an existing cluster.
    ControlPlane,
    Worker,
    Unrecognized(String),
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        match value {
            ROLE_INIT => Role::Init,
            ROLE_CONTROL_PLANE => Role::ControlPlane,
            ROLE_WORKER => Role::Worker,
            other => Role::Unrecognized(other.to_string()),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        Role::from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.to_string()
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Init => f.write_str(ROLE_INIT),
            Role::ControlPlane => f.write_str(ROLE_CONTROL_PLANE),
            Role::Worker => f.write_str(ROLE_WORKER),
            Role::Unrecognized(role) => f.write_str(role),
        }
    }
}

/// Cluster settings for the node being provisioned.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Cluster {
    #[serde(default)]
    pub cluster_token: String,
    #[serde(default)]
    pub control_plane_host: String,
    pub role: Role,
    /// Free-form RKE2 settings supplied by the user, as YAML or JSON text.
    #[serde(default, rename = "config", deserialize_with = "deserialize_options")]
    pub options: String,
}

/// Accepts the options either as a text block or as an inline mapping. Inline values are turned
/// back into YAML text so the renderer always deals with a single representation.
fn deserialize_options<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_yaml::Value::deserialize(deserializer)? {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::String(options) => Ok(options),
        other => serde_yaml::to_string(&other).map_err(serde::de::Error::custom),
    }
}
