//! Proxy settings for the container runtime, written as an environment file for the RKE2 service.
use crate::defaults::{
    CLUSTER_CIDR_OPTION, CONTAINERD_ENV_PREFIX, HTTPS_PROXY_ENV_NAME, HTTP_PROXY_ENV_NAME,
    K8S_NO_PROXY, NO_PROXY_ENV_NAME, SERVICE_CIDR_OPTION,
};
use crate::environment::Environment;
use crate::provider::EnvFileStrategy;
use serde_json::Value;
use tracing::warn;

/// Cluster networks which must never go through the proxy.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClusterCidrs {
    pub cluster_cidr: Option<String>,
    pub service_cidr: Option<String>,
}

impl ClusterCidrs {
    /// Extracts the CIDRs from the user options. Missing, empty or non-string values don't
    /// contribute.
    pub fn from_options(options: &Value) -> Self {
        ClusterCidrs {
            cluster_cidr: string_option(options, CLUSTER_CIDR_OPTION),
            service_cidr: string_option(options, SERVICE_CIDR_OPTION),
        }
    }

    fn iter(&self) -> impl Iterator<Item = &str> {
        [self.cluster_cidr.as_deref(), self.service_cidr.as_deref()]
            .into_iter()
            .flatten()
    }
}

fn string_option(options: &Value, key: &str) -> Option<String> {
    match options.get(key)? {
        Value::String(value) if !value.is_empty() => Some(value.clone()),
        Value::String(_) | Value::Null => None,
        other => {
            warn!("ignoring user option `{key}` for {NO_PROXY_ENV_NAME}, expected a string and got `{other}`");
            None
        }
    }
}

/// Composes the `NO_PROXY` value: the base value, the cluster CIDRs and the Kubernetes internal
/// domains, comma separated. The base value is kept even when empty, which leaves a leading
/// comma.
pub fn compose_no_proxy(base_no_proxy: &str, cidrs: &ClusterCidrs) -> String {
    let mut no_proxy = base_no_proxy.to_string();
    for cidr in cidrs.iter() {
        no_proxy.push(',');
        no_proxy.push_str(cidr);
    }
    no_proxy.push(',');
    no_proxy.push_str(K8S_NO_PROXY);
    no_proxy
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProxyEnv {
    http_proxy: String,
    https_proxy: String,
    /// Only set when something other than the Kubernetes internal domains must be excluded.
    no_proxy: Option<String>,
}

impl ProxyEnv {
    /// The `NO_PROXY` value is only set when the base value or a cluster CIDR contributes. A node
    /// with `HTTP_PROXY` set and no `NO_PROXY` gets no exclusions at all, so its `.svc` traffic
    /// goes through the proxy.
    pub fn new(
        http_proxy: &str,
        https_proxy: &str,
        base_no_proxy: &str,
        cidrs: &ClusterCidrs,
    ) -> Self {
        let no_proxy = (!base_no_proxy.is_empty() || cidrs.iter().next().is_some())
            .then(|| compose_no_proxy(base_no_proxy, cidrs));
        ProxyEnv {
            http_proxy: http_proxy.to_string(),
            https_proxy: https_proxy.to_string(),
            no_proxy,
        }
    }

    pub fn from_environment(environment: &Environment, cidrs: &ClusterCidrs) -> Self {
        ProxyEnv::new(
            environment.http_proxy(),
            environment.https_proxy(),
            environment.no_proxy(),
            cidrs,
        )
    }

    /// Environment file lines, always in HTTP, HTTPS, NO_PROXY order. Unset variables are
    /// omitted.
    pub fn lines(&self, strategy: EnvFileStrategy) -> Vec<String> {
        [
            (HTTP_PROXY_ENV_NAME, self.http_proxy.as_str()),
            (HTTPS_PROXY_ENV_NAME, self.https_proxy.as_str()),
            (NO_PROXY_ENV_NAME, self.no_proxy.as_deref().unwrap_or_default()),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .flat_map(|(name, value)| {
            let mut lines = vec![format!("{name}={value}")];
            if strategy == EnvFileStrategy::Containerd {
                lines.push(format!("{CONTAINERD_ENV_PREFIX}{name}={value}"));
            }
            lines
        })
        .collect()
    }

    pub fn content(&self, strategy: EnvFileStrategy) -> String {
        self.lines(strategy).join("\n")
    }
}
