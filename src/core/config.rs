//! # Configuration Module / 配置模块
//!
//! Scenario configuration loaded from a TOML file. When the file does not
//! exist a default two-node scenario is written to disk and used.
//!
//! 从 TOML 文件加载的场景配置。文件不存在时，会写出并使用默认的双节点场景。

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::Ipv4Addr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::errors::ConfigError;

/// Default location of the configuration file / 配置文件的默认位置
pub const DEFAULT_CONFIG_PATH: &str = "config/netprobe.toml";

/// Name of the scenario created when no configuration exists.
pub const DEFAULT_SCENARIO: &str = "basic_connectivity";

/// Addressing of one node inside a scenario.
/// 场景中单个节点的地址配置。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NodeAddress {
    pub ip_address: String,
    pub subnet_mask: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
}

impl NodeAddress {
    pub fn new(ip_address: &str, subnet_mask: &str) -> Self {
        Self {
            ip_address: ip_address.to_string(),
            subnet_mask: subnet_mask.to_string(),
            gateway: None,
        }
    }
}

/// A named test scenario: which nodes exist and how they are addressed.
/// 一个命名的测试场景：存在哪些节点以及它们的地址。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Scenario {
    #[serde(default)]
    pub description: String,
    /// Per-command timeout in seconds / 单条命令的超时时间（秒）
    #[serde(default = "default_timeout")]
    pub timeout: u64,
    pub nodes: IndexMap<String, NodeAddress>,
}

impl Scenario {
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn node_ip(&self, node: &str) -> Option<&str> {
        self.nodes.get(node).map(|n| n.ip_address.as_str())
    }
}

fn default_timeout() -> u64 {
    30
}

/// How the container runtime is driven.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeSettings {
    /// The docker CLI binary / docker 命令行程序
    pub docker_bin: String,
    /// Maps a node name to a container name; `{node}` is substituted.
    /// 将节点名映射为容器名；`{node}` 会被替换。
    pub container_template: String,
    /// Shell command that brings the nodes up / 启动节点的 shell 命令
    pub bring_up: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            docker_bin: "docker".to_string(),
            container_template: "network-test-framework-{node}-1".to_string(),
            bring_up: "docker compose up -d".to_string(),
        }
    }
}

impl RuntimeSettings {
    pub fn container_name(&self, node: &str) -> String {
        self.container_template.replace("{node}", node)
    }
}

/// When report artifacts are rewritten.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Rewrite snapshot and HTML after every result.
    #[default]
    Incremental,
    /// Append every result to `results.jsonl`; write snapshot and HTML at the end.
    Journal,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportSettings {
    pub base_dir: PathBuf,
    pub persist: PersistMode,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("reports"),
            persist: PersistMode::Incremental,
        }
    }
}

/// The whole configuration file.
/// 整个配置文件。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct NetprobeConfig {
    /// The language for console messages (e.g., "en", "zh-CN"); the system
    /// locale is used when unset.
    /// 控制台消息的语言（例如 "en", "zh-CN"）；未设置时使用系统语言。
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default = "default_tests_dir")]
    pub tests_dir: PathBuf,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_scenario: Option<String>,

    #[serde(default)]
    pub runtime: RuntimeSettings,

    #[serde(default)]
    pub report: ReportSettings,

    #[serde(default)]
    pub scenarios: IndexMap<String, Scenario>,
}

fn default_tests_dir() -> PathBuf {
    PathBuf::from("network_tests")
}

impl Default for NetprobeConfig {
    fn default() -> Self {
        let mut nodes = IndexMap::new();
        nodes.insert("node1".to_string(), NodeAddress::new("172.20.0.2", "255.255.0.0"));
        nodes.insert("node2".to_string(), NodeAddress::new("172.20.0.3", "255.255.0.0"));

        let mut scenarios = IndexMap::new();
        scenarios.insert(
            DEFAULT_SCENARIO.to_string(),
            Scenario {
                description: "Basic connectivity test between nodes".to_string(),
                timeout: default_timeout(),
                nodes,
            },
        );

        Self {
            language: None,
            tests_dir: default_tests_dir(),
            default_scenario: Some(DEFAULT_SCENARIO.to_string()),
            runtime: RuntimeSettings::default(),
            report: ReportSettings::default(),
            scenarios,
        }
    }
}

impl NetprobeConfig {
    /// Resolves a module's scenario, falling back to the configured default.
    pub fn scenario(&self, name: Option<&str>) -> Option<(&str, &Scenario)> {
        let name = name.or(self.default_scenario.as_deref())?;
        self.scenarios
            .get_key_value(name)
            .map(|(k, v)| (k.as_str(), v))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.runtime.container_template.contains("{node}") {
            return Err(ConfigError::BadContainerTemplate(
                self.runtime.container_template.clone(),
            ));
        }
        if let Some(default) = &self.default_scenario {
            if !self.scenarios.contains_key(default) {
                return Err(ConfigError::UnknownDefaultScenario(default.clone()));
            }
        }
        for (name, scenario) in &self.scenarios {
            if scenario.nodes.is_empty() {
                return Err(ConfigError::EmptyScenario(name.clone()));
            }
            for (node, addr) in &scenario.nodes {
                let fields = [
                    ("ip_address", Some(&addr.ip_address)),
                    ("subnet_mask", Some(&addr.subnet_mask)),
                    ("gateway", addr.gateway.as_ref()),
                ];
                for (field, value) in fields {
                    if let Some(value) = value {
                        if value.parse::<Ipv4Addr>().is_err() {
                            return Err(ConfigError::InvalidAddress {
                                scenario: name.clone(),
                                node: node.clone(),
                                field,
                                value: value.clone(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration")
    }
}

/// Parses and validates configuration text.
pub fn parse_config(content: &str) -> Result<NetprobeConfig> {
    let config: NetprobeConfig =
        toml::from_str(content).context("Failed to parse configuration")?;
    config.validate()?;
    Ok(config)
}

/// Loads the configuration at `path`, creating the default one first if the
/// file does not exist.
///
/// 加载 `path` 处的配置；如果文件不存在，则先创建默认配置。
pub fn load_or_create(path: &Path) -> Result<NetprobeConfig> {
    if !path.exists() {
        let config = NetprobeConfig::default();
        write_config(path, &config)?;
        info!(path = %path.display(), "created default configuration");
        return Ok(config);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
    parse_config(&content)
        .with_context(|| format!("Invalid configuration file: {}", path.display()))
}

/// Writes `config` to `path`, creating parent directories as needed.
pub fn write_config(path: &Path, config: &NetprobeConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, config.to_toml()?)
        .with_context(|| format!("Failed to write configuration file: {}", path.display()))
}
