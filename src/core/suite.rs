//! # Test Module Loading / 测试模块加载
//!
//! A test module is a `test_<name>.toml` file in the tests directory. It names
//! a scenario, optionally declares VLANs to set up around every test, and lists
//! tests made of checks.
//!
//! 测试模块是测试目录中的 `test_<name>.toml` 文件。
//! 它指定场景，可选地声明在每个测试前后建立的 VLAN，并列出由检查组成的测试。

use indexmap::IndexMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::core::checks::CheckSpec;
use crate::core::config::{NetprobeConfig, Scenario};
use crate::errors::{EnvironmentError, ModuleError};

/// File name prefix every test module carries / 每个测试模块文件名的前缀
pub const MODULE_PREFIX: &str = "test_";
/// File extension of test modules / 测试模块的文件扩展名
pub const MODULE_EXTENSION: &str = "toml";

/// A VLAN sub-interface created on the nodes around each test of a module.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VlanSpec {
    pub id: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default = "default_parent")]
    pub parent: String,
    /// Node name -> address in CIDR notation / 节点名 -> CIDR 形式的地址
    #[serde(default)]
    pub addresses: IndexMap<String, String>,
}

fn default_parent() -> String {
    "eth0".to_string()
}

impl VlanSpec {
    /// e.g. `eth0.10`
    pub fn interface(&self) -> String {
        format!("{}.{}", self.parent, self.id)
    }

    /// The node's VLAN address without the prefix length.
    pub fn ip_of(&self, node: &str) -> Option<&str> {
        self.addresses
            .get(node)
            .map(|cidr| cidr.split('/').next().unwrap_or(cidr))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestDef {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub checks: Vec<CheckSpec>,
}

/// The on-disk shape of a test module.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDef {
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scenario: Option<String>,
    #[serde(default)]
    pub vlans: Vec<VlanSpec>,
    #[serde(default)]
    pub tests: Vec<TestDef>,
}

/// Nodes, addresses and VLANs a module's tests operate on.
/// 模块测试所操作的节点、地址和 VLAN。
#[derive(Debug, Clone)]
pub struct Topology {
    pub scenario_name: String,
    pub scenario: Scenario,
    pub vlans: Vec<VlanSpec>,
}

impl Topology {
    pub fn new(scenario_name: impl Into<String>, scenario: Scenario, vlans: Vec<VlanSpec>) -> Self {
        Self {
            scenario_name: scenario_name.into(),
            scenario,
            vlans,
        }
    }

    pub fn vlan(&self, id: u16) -> Option<&VlanSpec> {
        self.vlans.iter().find(|v| v.id == id)
    }

    /// `None` disables the timeout.
    pub fn command_timeout(&self) -> Option<Duration> {
        (self.scenario.timeout > 0).then(|| self.scenario.command_timeout())
    }

    /// Resolves a ping target: a literal IP is kept, a node name becomes its
    /// VLAN address when `vlan` is given, otherwise its scenario address.
    pub fn resolve_target(&self, target: &str, vlan: Option<u16>) -> Option<String> {
        if target.parse::<std::net::IpAddr>().is_ok() {
            return Some(target.to_string());
        }
        match vlan {
            Some(id) => self.vlan(id)?.ip_of(target).map(str::to_string),
            None => self.scenario.node_ip(target).map(str::to_string),
        }
    }

    pub fn has_node(&self, node: &str) -> bool {
        self.scenario.nodes.contains_key(node)
    }
}

/// A module file found on disk (or requested by name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleSource {
    /// Module name without the `test_` prefix / 不带 `test_` 前缀的模块名
    pub name: String,
    pub path: PathBuf,
}

impl ModuleSource {
    fn from_path(path: PathBuf) -> Option<Self> {
        let stem = path.file_stem()?.to_str()?;
        let name = stem.strip_prefix(MODULE_PREFIX)?.to_string();
        Some(Self { name, path })
    }
}

/// A fully resolved, ready-to-run module.
#[derive(Debug, Clone)]
pub struct TestModule {
    pub name: String,
    pub description: String,
    pub topology: Arc<Topology>,
    pub tests: Vec<TestDef>,
}

/// Applies the `test_` naming convention to a user-supplied module name.
pub fn module_file_name(name: &str) -> String {
    let stem = name.strip_suffix(".toml").unwrap_or(name);
    if stem.starts_with(MODULE_PREFIX) {
        format!("{stem}.{MODULE_EXTENSION}")
    } else {
        format!("{MODULE_PREFIX}{stem}.{MODULE_EXTENSION}")
    }
}

/// Finds every `test_*.toml` file in `dir`, sorted by file name.
pub fn discover_modules(dir: &Path) -> Result<Vec<ModuleSource>, EnvironmentError> {
    let entries =
        fs::read_dir(dir).map_err(|_| EnvironmentError::TestsDirMissing(dir.to_path_buf()))?;

    let mut sources: Vec<ModuleSource> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| path.extension().is_some_and(|ext| ext == MODULE_EXTENSION))
        .filter_map(ModuleSource::from_path)
        .collect();

    sources.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(sources)
}

/// Resolves explicitly requested module names. Missing files are reported
/// later, when the module is loaded, so they fail only that module.
pub fn select_modules(dir: &Path, names: &[String]) -> Vec<ModuleSource> {
    names
        .iter()
        .map(|name| {
            let path = dir.join(module_file_name(name));
            ModuleSource::from_path(path.clone()).unwrap_or_else(|| ModuleSource {
                name: name.clone(),
                path,
            })
        })
        .collect()
}

/// Reads, parses and validates one module against the configuration.
pub fn load_module(source: &ModuleSource, config: &NetprobeConfig) -> Result<TestModule, ModuleError> {
    if !source.path.is_file() {
        return Err(ModuleError::NotFound(source.path.clone()));
    }
    let content = fs::read_to_string(&source.path).map_err(|e| ModuleError::Read {
        path: source.path.clone(),
        source: e,
    })?;
    let def: ModuleDef = toml::from_str(&content).map_err(|e| ModuleError::Parse {
        path: source.path.clone(),
        source: e,
    })?;
    resolve_module(&source.name, def, config)
}

/// Binds a parsed module to its scenario and checks every reference in it.
pub fn resolve_module(
    name: &str,
    def: ModuleDef,
    config: &NetprobeConfig,
) -> Result<TestModule, ModuleError> {
    let (scenario_name, scenario) = match config.scenario(def.scenario.as_deref()) {
        Some(found) => found,
        None => {
            return Err(match def.scenario {
                Some(scenario) => ModuleError::UnknownScenario {
                    module: name.to_string(),
                    scenario,
                },
                None => ModuleError::NoScenario {
                    module: name.to_string(),
                },
            });
        }
    };

    let topology = Topology::new(scenario_name, scenario.clone(), def.vlans);
    let invalid = |detail: String| ModuleError::Invalid {
        module: name.to_string(),
        detail,
    };

    for vlan in &topology.vlans {
        if vlan.id == 0 || vlan.id > 4094 {
            return Err(invalid(format!("VLAN id {} is out of range 1-4094", vlan.id)));
        }
        for node in vlan.addresses.keys() {
            if !topology.has_node(node) {
                return Err(invalid(format!("VLAN {} addresses unknown node `{node}`", vlan.id)));
            }
        }
    }

    let mut seen = std::collections::HashSet::new();
    for test in &def.tests {
        if !seen.insert(test.name.as_str()) {
            return Err(invalid(format!("duplicate test name `{}`", test.name)));
        }
        for check in &test.checks {
            check
                .validate(&topology)
                .map_err(|detail| invalid(format!("test `{}`: {detail}", test.name)))?;
        }
    }

    Ok(TestModule {
        name: name.to_string(),
        description: def.description,
        topology: Arc::new(topology),
        tests: def.tests,
    })
}
