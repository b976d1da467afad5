//! Effective environment for a single rendering pass.
//!
//! The proxy settings come from the process environment, optionally overridden by the `env`
//! entries found in the cloud-config directories (see [scanner]). The result is captured once and
//! passed explicitly to the renderer, the process environment is never modified.

use crate::defaults::{HTTPS_PROXY_ENV_NAME, HTTP_PROXY_ENV_NAME, NO_PROXY_ENV_NAME};
use std::collections::BTreeMap;
use std::env::VarError;

pub mod scanner;

/// Variables read from the process environment.
pub const PROXY_ENV_NAMES: [&str; 3] = [
    HTTP_PROXY_ENV_NAME,
    HTTPS_PROXY_ENV_NAME,
    NO_PROXY_ENV_NAME,
];

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Snapshots the proxy variables using `env_var` and applies `overrides` on top, in order.
    pub fn capture<F, I>(env_var: F, overrides: I) -> Self
    where
        F: Fn(&'static str) -> Result<String, VarError>,
        I: IntoIterator<Item = (String, String)>,
    {
        let mut vars: BTreeMap<String, String> = PROXY_ENV_NAMES
            .into_iter()
            .filter_map(|name| env_var(name).ok().map(|value| (name.to_string(), value)))
            .collect();
        vars.extend(overrides);
        Environment { vars }
    }

    /// Returns the value for `name`, an empty string when it is not set.
    pub fn get(&self, name: &str) -> &str {
        self.vars.get(name).map(String::as_str).unwrap_or_default()
    }

    pub fn http_proxy(&self) -> &str {
        self.get(HTTP_PROXY_ENV_NAME)
    }

    pub fn https_proxy(&self) -> &str {
        self.get(HTTPS_PROXY_ENV_NAME)
    }

    pub fn no_proxy(&self) -> &str {
        self.get(NO_PROXY_ENV_NAME)
    }
}

impl<K, V> FromIterator<(K, V)> for Environment
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Environment {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}
