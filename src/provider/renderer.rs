use crate::cluster::Cluster;
use crate::defaults::{
    BOOT_BEFORE_STAGE, DAEMON_RELOAD_COMMAND, ENABLE_SERVICES_STEP_NAME,
    GENERATED_FILE_PERMISSIONS, INSTALL_FILES_STEP_NAME, MERGE_FILTER, PROVIDER_NAME,
    PROVIDER_OPTIONS_FILE_NAME, RKE2_CONFIG_DIR, RKE2_CONFIG_FILE, SERVICE_ENV_DIR,
    USER_OPTIONS_FILE_NAME,
};
use crate::environment::Environment;
use crate::provider::error::RenderError;
use crate::provider::proxy::{ClusterCidrs, ProxyEnv};
use crate::provider::settings::resolve;
use crate::provider::EnvFileStrategy;
use crate::yip::{File, Stage, Systemctl, YipConfig};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, warn};

const EMPTY_OPTIONS: &str = "{}";

/// Renders the boot document provisioning RKE2 on a node.
#[derive(Debug, Default, Clone)]
pub struct Renderer {
    strategy: EnvFileStrategy,
}

impl Renderer {
    pub fn new(strategy: EnvFileStrategy) -> Self {
        Renderer { strategy }
    }

    /// Renders the configuration for `cluster`. Rendering never fails: any file whose content
    /// cannot be generated is written empty and a warning is logged.
    pub fn render(&self, cluster: &Cluster, environment: &Environment) -> YipConfig {
        let settings = resolve(
            &cluster.role,
            &cluster.cluster_token,
            &cluster.control_plane_host,
        );
        let service_name = settings.service_name.to_string();
        debug!(role = %cluster.role, service = %service_name, "rendering rke2 configuration");

        let user_options_path = config_path(USER_OPTIONS_FILE_NAME);
        let (user_options, cidrs) = match parse_options(normalize_options(&cluster.options)) {
            Ok(options) => (
                content_or_empty(&user_options_path, to_json(&options)),
                ClusterCidrs::from_options(&options),
            ),
            Err(err) => {
                warn!(path = %user_options_path, "no cluster CIDRs excluded from the proxy: {err}");
                (content_or_empty(&user_options_path, Err(err)), ClusterCidrs::default())
            }
        };

        let provider_options_path = config_path(PROVIDER_OPTIONS_FILE_NAME);
        let provider_options = content_or_empty(
            &provider_options_path,
            settings.to_rke2_config().and_then(|config| to_json(&config)),
        );

        let proxy_env = ProxyEnv::from_environment(environment, &cidrs);
        let env_file_path = Path::new(SERVICE_ENV_DIR)
            .join(&service_name)
            .to_string_lossy()
            .to_string();

        let mut commands = vec![merge_command()];
        if self.strategy == EnvFileStrategy::Plain {
            commands.push(DAEMON_RELOAD_COMMAND.to_string());
        }

        let install_files = Stage {
            name: INSTALL_FILES_STEP_NAME.to_string(),
            files: vec![
                restricted_file(user_options_path, user_options),
                restricted_file(provider_options_path, provider_options),
                restricted_file(env_file_path, proxy_env.content(self.strategy)),
            ],
            commands,
            ..Default::default()
        };

        let enable_services = Stage {
            name: ENABLE_SERVICES_STEP_NAME.to_string(),
            systemctl: Systemctl {
                enable: vec![service_name.clone()],
                start: vec![service_name],
            },
            ..Default::default()
        };

        YipConfig {
            name: PROVIDER_NAME.to_string(),
            stages: BTreeMap::from([(
                BOOT_BEFORE_STAGE.to_string(),
                vec![install_files, enable_services],
            )]),
        }
    }
}

/// Empty options are treated as an empty object so the fragment is always valid.
fn normalize_options(options: &str) -> &str {
    if options.trim().is_empty() {
        EMPTY_OPTIONS
    } else {
        options
    }
}

fn parse_options(options: &str) -> Result<Value, RenderError> {
    serde_yaml::from_str(options).map_err(RenderError::InvalidOptions)
}

/// Compact JSON with sorted keys, which is also valid YAML.
fn to_json(value: &Value) -> Result<String, RenderError> {
    Ok(serde_json::to_string(value)?)
}

fn content_or_empty(path: &str, content: Result<String, RenderError>) -> String {
    content.unwrap_or_else(|err| {
        warn!(%path, "writing empty file: {err}");
        String::new()
    })
}

fn config_path(file_name: &str) -> String {
    Path::new(RKE2_CONFIG_DIR)
        .join(file_name)
        .to_string_lossy()
        .to_string()
}

fn restricted_file(path: String, content: String) -> File {
    File {
        path,
        permissions: GENERATED_FILE_PERMISSIONS,
        content,
    }
}

/// Merges every fragment in the config directory, in file name order, into the file RKE2 reads.
fn merge_command() -> String {
    format!("jq -s '{MERGE_FILTER}' {RKE2_CONFIG_DIR}/*.yaml > {RKE2_CONFIG_FILE}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Role;
    use rstest::rstest;
    use serde_json::json;
    use tracing_test::traced_test;

    const USER_OPTIONS_PATH: &str = "/etc/rancher/rke2/config.d/90_userdata.yaml";
    const PROVIDER_OPTIONS_PATH: &str = "/etc/rancher/rke2/config.d/99_userdata.yaml";

    fn steps(config: &YipConfig) -> &[Stage] {
        config
            .stages
            .get("boot.before")
            .expect("boot.before stage expected")
    }

    fn file<'a>(config: &'a YipConfig, path: &str) -> &'a File {
        steps(config)[0]
            .files
            .iter()
            .find(|f| f.path == path)
            .unwrap_or_else(|| panic!("file {path} expected"))
    }

    fn json_file(config: &YipConfig, path: &str) -> Value {
        serde_json::from_str(&file(config, path).content).expect("file content should be json")
    }

    #[test]
    fn test_render_init_node() {
        let cluster = Cluster::new(Role::Init, "abc", "10.0.0.1", "");

        let config = Renderer::default().render(&cluster, &Environment::default());

        assert_eq!(
            json_file(&config, PROVIDER_OPTIONS_PATH),
            json!({"cluster-init": true, "token": "abc", "server": "", "tls-san": ["10.0.0.1"]})
        );
        assert_eq!(file(&config, "/etc/default/rke2-server").content, "");
        assert_eq!(
            steps(&config)[1].systemctl,
            Systemctl {
                enable: vec!["rke2-server".to_string()],
                start: vec!["rke2-server".to_string()],
            }
        );
    }

    #[test]
    fn test_render_worker_behind_proxy() {
        let cluster = Cluster::new(Role::Worker, "abc", "cp.local", "");
        let environment = Environment::from_iter([("HTTP_PROXY", "http://proxy:3128")]);

        let config = Renderer::default().render(&cluster, &environment);

        assert_eq!(
            file(&config, "/etc/default/rke2-agent").content,
            "HTTP_PROXY=http://proxy:3128\nCONTAINERD_HTTP_PROXY=http://proxy:3128"
        );
        assert_eq!(
            json_file(&config, PROVIDER_OPTIONS_PATH)["server"],
            json!("https://cp.local:9345")
        );
        assert_eq!(steps(&config)[1].systemctl.enable, vec!["rke2-agent"]);
        assert_eq!(steps(&config)[1].systemctl.start, vec!["rke2-agent"]);
    }

    #[test]
    fn test_render_excludes_cluster_cidrs_from_proxy() {
        let cluster = Cluster::new(
            Role::ControlPlane,
            "abc",
            "cp.local",
            "cluster-cidr: 10.42.0.0/16\nservice-cidr: 10.43.0.0/16\n",
        );

        let config = Renderer::default().render(&cluster, &Environment::default());

        let no_proxy = ",10.42.0.0/16,10.43.0.0/16,.svc,.svc.cluster,.svc.cluster.local";
        assert_eq!(
            file(&config, "/etc/default/rke2-server").content,
            format!("NO_PROXY={no_proxy}\nCONTAINERD_NO_PROXY={no_proxy}")
        );
        assert_eq!(
            json_file(&config, USER_OPTIONS_PATH),
            json!({"cluster-cidr": "10.42.0.0/16", "service-cidr": "10.43.0.0/16"})
        );
    }

    #[rstest]
    #[case::empty("")]
    #[case::blank("  \n")]
    #[case::empty_object("{}")]
    fn test_render_empty_options(#[case] options: &str) {
        let cluster = Cluster::new(Role::Worker, "abc", "cp.local", options);

        let config = Renderer::default().render(&cluster, &Environment::default());

        assert_eq!(file(&config, USER_OPTIONS_PATH).content, "{}");
        let parsed: serde_yaml::Value =
            serde_yaml::from_str(&file(&config, USER_OPTIONS_PATH).content).unwrap();
        assert_eq!(parsed, serde_yaml::Value::Mapping(Default::default()));
    }

    #[test]
    fn test_render_user_options_as_json() {
        let cluster = Cluster::new(
            Role::Worker,
            "abc",
            "cp.local",
            "node-label:\n- zone=a\n- zone=b\nwrite-kubeconfig-mode: \"0644\"\ndebug: true\n",
        );

        let config = Renderer::default().render(&cluster, &Environment::default());

        assert_eq!(
            file(&config, USER_OPTIONS_PATH).content,
            r#"{"debug":true,"node-label":["zone=a","zone=b"],"write-kubeconfig-mode":"0644"}"#
        );
    }

    // Malformed options leave the user fragment empty instead of failing the whole render. The
    // host must validate the fragment before RKE2 starts.
    #[traced_test]
    #[test]
    fn test_render_invalid_options_degrades_to_empty_file() {
        let cluster = Cluster::new(Role::Worker, "abc", "cp.local", "cluster-cidr: [unclosed");
        let environment = Environment::from_iter([("HTTPS_PROXY", "http://proxy:3128")]);

        let config = Renderer::default().render(&cluster, &environment);

        assert_eq!(file(&config, USER_OPTIONS_PATH).content, "");
        assert_eq!(
            file(&config, "/etc/default/rke2-agent").content,
            "HTTPS_PROXY=http://proxy:3128\nCONTAINERD_HTTPS_PROXY=http://proxy:3128"
        );
        assert!(!file(&config, PROVIDER_OPTIONS_PATH).content.is_empty());
        assert!(logs_contain("writing empty file"));
        assert!(logs_contain("no cluster CIDRs excluded from the proxy"));
    }

    #[test]
    fn test_render_files_and_commands() {
        let cluster = Cluster::new(Role::ControlPlane, "abc", "cp.local", "");

        let config = Renderer::default().render(&cluster, &Environment::default());

        assert_eq!(config.name, "RKE2 Kairos Cluster Provider");
        assert_eq!(config.stages.len(), 1);
        let steps = steps(&config);
        assert_eq!(steps.len(), 2);

        let paths: Vec<(&str, u32)> = steps[0]
            .files
            .iter()
            .map(|f| (f.path.as_str(), f.permissions))
            .collect();
        assert_eq!(
            paths,
            vec![
                (USER_OPTIONS_PATH, 0o400),
                (PROVIDER_OPTIONS_PATH, 0o400),
                ("/etc/default/rke2-server", 0o400),
            ]
        );
        assert_eq!(
            steps[0].commands,
            vec![format!(
                "jq -s '{MERGE_FILTER}' /etc/rancher/rke2/config.d/*.yaml > /etc/rancher/rke2/config.yaml"
            )]
        );
        assert!(steps[0].systemctl.is_empty());
        assert!(steps[1].files.is_empty());
        assert!(steps[1].commands.is_empty());
    }

    #[test]
    fn test_render_plain_strategy() {
        let cluster = Cluster::new(Role::Worker, "abc", "cp.local", "");
        let environment = Environment::from_iter([
            ("HTTP_PROXY", "http://proxy:3128"),
            ("NO_PROXY", "localhost"),
        ]);

        let config = Renderer::new(EnvFileStrategy::Plain).render(&cluster, &environment);

        assert_eq!(
            file(&config, "/etc/default/rke2-agent").content,
            "HTTP_PROXY=http://proxy:3128\nNO_PROXY=localhost,.svc,.svc.cluster,.svc.cluster.local"
        );
        let commands = &steps(&config)[0].commands;
        assert_eq!(commands.len(), 2);
        assert!(commands[0].starts_with("jq -s"));
        assert_eq!(commands[1], "systemctl daemon-reload");
    }

    #[test]
    fn test_render_is_deterministic() {
        let cluster = Cluster::new(
            Role::Worker,
            "abc",
            "cp.local",
            "service-cidr: 10.43.0.0/16\ntls-san: [extra.local]\n",
        );
        let environment = Environment::from_iter([
            ("HTTP_PROXY", "http://proxy:3128"),
            ("HTTPS_PROXY", "http://proxy:3128"),
            ("NO_PROXY", "localhost"),
        ]);
        let renderer = Renderer::default();

        let first = serde_yaml::to_string(&renderer.render(&cluster, &environment)).unwrap();
        let second = serde_yaml::to_string(&renderer.render(&cluster, &environment)).unwrap();

        assert_eq!(first, second);
    }
}
