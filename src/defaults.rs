// Paths
pub const RKE2_CONFIG_DIR: &str = "/etc/rancher/rke2/config.d";
pub const RKE2_CONFIG_FILE: &str = "/etc/rancher/rke2/config.yaml";
pub const USER_OPTIONS_FILE_NAME: &str = "90_userdata.yaml";
pub const PROVIDER_OPTIONS_FILE_NAME: &str = "99_userdata.yaml";
pub const SERVICE_ENV_DIR: &str = "/etc/default";

// Owner read-only
pub const GENERATED_FILE_PERMISSIONS: u32 = 0o400;

// Services
pub const SERVER_SERVICE_NAME: &str = "rke2-server";
pub const AGENT_SERVICE_NAME: &str = "rke2-agent";

/// Port the RKE2 supervisor listens on for node registration.
/// <https://docs.rke2.io/install/quickstart#3-configure-the-rke2-agent-service>
pub const SUPERVISOR_PORT: u16 = 9345;

// Proxy
pub const HTTP_PROXY_ENV_NAME: &str = "HTTP_PROXY";
pub const HTTPS_PROXY_ENV_NAME: &str = "HTTPS_PROXY";
pub const NO_PROXY_ENV_NAME: &str = "NO_PROXY";
pub const CONTAINERD_ENV_PREFIX: &str = "CONTAINERD_";
pub const K8S_NO_PROXY: &str = ".svc,.svc.cluster,.svc.cluster.local";

// User options keys
pub const CLUSTER_CIDR_OPTION: &str = "cluster-cidr";
pub const SERVICE_CIDR_OPTION: &str = "service-cidr";

/// Directories scanned for cloud-config files carrying `env` entries, in priority order.
pub const CONFIG_SCAN_DIRS: [&str; 3] = ["/oem", "/usr/local/cloud-config", "/run/initramfs/live"];

// Boot document
pub const PROVIDER_NAME: &str = "RKE2 Kairos Cluster Provider";
pub const BOOT_BEFORE_STAGE: &str = "boot.before";
pub const INSTALL_FILES_STEP_NAME: &str = "Install RKE2 Configuration Files";
pub const ENABLE_SERVICES_STEP_NAME: &str = "Enable Systemd Services";

/// jq program deep-merging every fragment in file order. Arrays are concatenated, objects are
/// merged key by key and any other value from a later fragment replaces the earlier one.
pub const MERGE_FILTER: &str = r#"def merge($a; $b): if ($a | type) == "object" and ($b | type) == "object" then reduce ($b | keys_unsorted[]) as $k ($a; .[$k] = merge($a[$k]; $b[$k])) elif ($a | type) == "array" and ($b | type) == "array" then $a + $b elif $b == null then $a else $b end; reduce .[] as $fragment ({}; merge(.; $fragment))"#;
pub const DAEMON_RELOAD_COMMAND: &str = "systemctl daemon-reload";
