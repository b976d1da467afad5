//! Host plugin protocol.
//!
//! The host runtime executes the provider with the event name as its only argument, writes the
//! event as JSON to its standard input and reads the [EventResponse] from its standard output.
//! Failures while handling a well-formed event are reported back in [EventResponse::error].
use crate::cluster::Cluster;
use crate::environment::scanner::ConfigScanner;
use crate::environment::Environment;
use crate::provider::renderer::Renderer;
use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::io::{Read, Write};
use thiserror::Error;
use tracing::{debug, info};

/// Event asking the provider for the node boot configuration.
pub const CLUSTER_PROVIDER_EVENT: &str = "cluster.provider";

#[derive(Error, Debug)]
pub enum PluginError {
    #[error("reading the event: `{0}`")]
    Read(#[source] std::io::Error),

    #[error("decoding the event: `{0}`")]
    Decode(#[source] serde_json::Error),

    #[error("received an empty event")]
    EmptyEvent,

    #[error("encoding the response: `{0}`")]
    Encode(#[source] serde_json::Error),

    #[error("writing the response: `{0}`")]
    Write(#[source] std::io::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub file: String,
}

impl Event {
    fn is_empty(&self) -> bool {
        self.name.is_empty() && self.data.is_empty() && self.file.is_empty()
    }
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventResponse {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub data: String,
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub logs: String,
}

impl EventResponse {
    fn from_error(error: String) -> Self {
        EventResponse {
            error,
            ..Default::default()
        }
    }
}

/// Content of [Event::data].
#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    config: String,
}

/// Node configuration carried by the payload, only the cluster section is relevant.
#[derive(Debug, Deserialize)]
struct NodeConfig {
    #[serde(default)]
    cluster: Option<Cluster>,
}

pub type EnvVarFn = fn(&'static str) -> Result<String, VarError>;

pub struct ClusterPlugin<S>
where
    S: ConfigScanner,
{
    renderer: Renderer,
    scanner: S,
    env_var: EnvVarFn,
}

impl<S> ClusterPlugin<S>
where
    S: ConfigScanner,
{
    pub fn new(renderer: Renderer, scanner: S) -> Self {
        ClusterPlugin {
            renderer,
            scanner,
            env_var: |name| std::env::var(name),
        }
    }

    /// Overrides how the process environment is read.
    pub fn with_env_var(self, env_var: EnvVarFn) -> Self {
        ClusterPlugin { env_var, ..self }
    }

    /// Reads the event from `input`, handles it and writes the response to `output`.
    pub fn run<R, W>(
        &self,
        event_name: &str,
        mut input: R,
        mut output: W,
    ) -> Result<(), PluginError>
    where
        R: Read,
        W: Write,
    {
        let mut raw_event = String::new();
        input
            .read_to_string(&mut raw_event)
            .map_err(PluginError::Read)?;
        let event: Event = serde_json::from_str(&raw_event).map_err(PluginError::Decode)?;
        if event.is_empty() {
            return Err(PluginError::EmptyEvent);
        }

        let response = match event_name {
            CLUSTER_PROVIDER_EVENT => self.provide_cluster(&event),
            other => {
                debug!("ignoring unsupported event `{other}`");
                EventResponse::default()
            }
        };

        let encoded = serde_json::to_string(&response).map_err(PluginError::Encode)?;
        output
            .write_all(encoded.as_bytes())
            .and_then(|_| output.flush())
            .map_err(PluginError::Write)
    }

    /// Renders the boot configuration for the cluster described in the event.
    pub fn provide_cluster(&self, event: &Event) -> EventResponse {
        let payload: EventPayload = match serde_json::from_str(&event.data) {
            Ok(payload) => payload,
            Err(err) => {
                return EventResponse::from_error(format!("invalid event payload: {err}"));
            }
        };
        let node_config = if payload.config.trim().is_empty() {
            NodeConfig { cluster: None }
        } else {
            match serde_yaml::from_str::<NodeConfig>(&payload.config) {
                Ok(node_config) => node_config,
                Err(err) => {
                    return EventResponse::from_error(format!("invalid node config: {err}"));
                }
            }
        };
        let Some(cluster) = node_config.cluster else {
            info!("no cluster configuration found, nothing to provide");
            return EventResponse::default();
        };

        let environment = Environment::capture(self.env_var, self.scanner.scan_env());
        let config = self.renderer.render(&cluster, &environment);

        match serde_yaml::to_string(&config) {
            Ok(data) => {
                info!(role = %cluster.role, "rke2 boot configuration rendered");
                EventResponse {
                    data,
                    ..Default::default()
                }
            }
            Err(err) => EventResponse::from_error(format!("encoding boot configuration: {err}")),
        }
    }
}
