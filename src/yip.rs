//! Boot configuration document returned to the host, which owns applying it: writing the files,
//! running the commands and driving the service manager.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct YipConfig {
    pub name: String,
    /// Steps to run keyed by the boot stage they belong to.
    #[serde(default)]
    pub stages: BTreeMap<String, Vec<Stage>>,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    pub name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub files: Vec<File>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Systemctl::is_empty")]
    pub systemctl: Systemctl,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct File {
    pub path: String,
    pub permissions: u32,
    pub content: String,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Systemctl {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enable: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub start: Vec<String>,
}

impl Systemctl {
    pub fn is_empty(&self) -> bool {
        self.enable.is_empty() && self.start.is_empty()
    }
}
