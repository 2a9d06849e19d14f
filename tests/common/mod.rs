// Shared test helpers for integration tests
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Local;
use indexmap::IndexMap;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::{TempDir, tempdir};

use netprobe::core::config::{NetprobeConfig, PersistMode};
use netprobe::core::models::{CommandRecord, Outcome, TestDetails, TestResult};
use netprobe::core::node::{ExecOutput, NodeExecutor, RuntimeStatus};
use netprobe::core::store::ResultStore;
use netprobe::core::suite::{Topology, VlanSpec};
use netprobe::errors::ExecError;

struct Rule {
    node: Option<String>,
    contains: String,
    output: ExecOutput,
}

/// A scripted node executor. Commands match the most recently added rule
/// whose node and substring fit; unmatched commands succeed with no output.
#[derive(Default)]
pub struct FakeExecutor {
    rules: Mutex<Vec<Rule>>,
    missing: Mutex<HashSet<String>>,
    delay: Mutex<Option<Duration>>,
    calls: Mutex<Vec<(String, String)>>,
    /// `(node, interface)` pairs created by `ip link add`, when tracked.
    links: Mutex<Option<HashSet<(String, String)>>>,
    link_conflicts: AtomicUsize,
}

impl FakeExecutor {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, node: Option<&str>, contains: &str, exit_code: i32, output: &str) {
        self.rules.lock().push(Rule {
            node: node.map(str::to_string),
            contains: contains.to_string(),
            output: ExecOutput::new(exit_code, output),
        });
    }

    /// Every later command on `node` fails with `NodeNotFound`.
    pub fn remove_node(&self, node: &str) {
        self.missing.lock().insert(node.to_string());
    }

    pub fn delay_all(&self, delay: Duration) {
        *self.delay.lock() = Some(delay);
    }

    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Keeps VLAN sub-interfaces as node state, the way `ip link` would: a
    /// second `ip link add` of the same name fails with `File exists`, and
    /// commands on an interface that is not there fail.
    pub fn track_links(&self) {
        *self.links.lock() = Some(HashSet::new());
    }

    pub fn links(&self) -> Vec<(String, String)> {
        self.links.lock().iter().flatten().cloned().collect()
    }

    /// `ip link add` calls that found the interface already present.
    pub fn link_conflicts(&self) -> usize {
        self.link_conflicts.load(Ordering::SeqCst)
    }

    fn link_state(&self, node: &str, command: &str) -> Option<ExecOutput> {
        let mut guard = self.links.lock();
        let links = guard.as_mut()?;
        let words: Vec<&str> = command.split_whitespace().collect();
        let operand = |flag: &str| {
            words
                .iter()
                .position(|w| *w == flag)
                .and_then(|i| words.get(i + 1))
                .map(|iface| (node.to_string(), iface.to_string()))
        };
        let missing = |(_, iface): (String, String)| {
            ExecOutput::new(1, format!("Cannot find device \"{iface}\""))
        };

        if command.starts_with("ip link add") {
            let key = operand("name")?;
            if links.insert(key) {
                return Some(ExecOutput::new(0, ""));
            }
            self.link_conflicts.fetch_add(1, Ordering::SeqCst);
            return Some(ExecOutput::new(2, "RTNETLINK answers: File exists"));
        }
        if command.starts_with("ip link delete") || command.starts_with("ip -d link show") {
            let key = (node.to_string(), words.last()?.to_string());
            let present = if command.starts_with("ip link delete") {
                links.remove(&key)
            } else {
                links.contains(&key)
            };
            return (!present).then(|| missing(key));
        }
        if command.starts_with("ping -I") {
            let key = operand("-I")?;
            return (!links.contains(&key)).then(|| missing(key));
        }
        None
    }
}

#[async_trait]
impl NodeExecutor for FakeExecutor {
    async fn execute(&self, node: &str, command: &str) -> Result<ExecOutput, ExecError> {
        if self.missing.lock().contains(node) {
            return Err(ExecError::NodeNotFound(format!("network-test-framework-{node}-1")));
        }
        let delay = *self.delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls.lock().push((node.to_string(), command.to_string()));
        if let Some(output) = self.link_state(node, command) {
            return Ok(output);
        }

        let rules = self.rules.lock();
        let output = rules
            .iter()
            .rev()
            .find(|r| {
                r.node.as_deref().is_none_or(|n| n == node) && command.contains(&r.contains)
            })
            .map(|r| r.output.clone())
            .unwrap_or_else(|| ExecOutput::new(0, ""));
        Ok(output)
    }
}

/// A scripted container runtime.
pub struct FakeRuntime {
    pub reachable: bool,
    running: Mutex<Vec<String>>,
    /// Nodes that appear after a successful `bring_up`.
    provisioned: Vec<String>,
    bring_up_fails: bool,
    bring_up_calls: AtomicUsize,
}

impl FakeRuntime {
    pub fn up(nodes: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            running: Mutex::new(nodes.iter().map(|n| n.to_string()).collect()),
            provisioned: nodes.iter().map(|n| n.to_string()).collect(),
            bring_up_fails: false,
            bring_up_calls: AtomicUsize::new(0),
        })
    }

    pub fn unreachable() -> Arc<Self> {
        Arc::new(Self {
            reachable: false,
            running: Mutex::new(Vec::new()),
            provisioned: Vec::new(),
            bring_up_fails: false,
            bring_up_calls: AtomicUsize::new(0),
        })
    }

    /// Reachable with no node running; `bring_up` starts `nodes`.
    pub fn down(nodes: &[&str], bring_up_fails: bool) -> Arc<Self> {
        Arc::new(Self {
            reachable: true,
            running: Mutex::new(Vec::new()),
            provisioned: nodes.iter().map(|n| n.to_string()).collect(),
            bring_up_fails,
            bring_up_calls: AtomicUsize::new(0),
        })
    }

    pub fn bring_up_calls(&self) -> usize {
        self.bring_up_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RuntimeStatus for FakeRuntime {
    async fn is_reachable(&self) -> bool {
        self.reachable
    }

    async fn list_running_nodes(&self) -> Vec<String> {
        self.running.lock().clone()
    }

    async fn bring_up(&self) -> anyhow::Result<()> {
        self.bring_up_calls.fetch_add(1, Ordering::SeqCst);
        if self.bring_up_fails {
            anyhow::bail!("compose file not found");
        }
        *self.running.lock() = self.provisioned.clone();
        Ok(())
    }
}

pub fn default_topology() -> Arc<Topology> {
    let config = NetprobeConfig::default();
    let (name, scenario) = config.scenario(None).expect("default scenario");
    Arc::new(Topology::new(name, scenario.clone(), Vec::new()))
}

/// Two-node topology with VLAN 10 and 20 addressed on both nodes.
pub fn vlan_topology() -> Arc<Topology> {
    let config = NetprobeConfig::default();
    let (name, scenario) = config.scenario(None).expect("default scenario");
    let vlan = |id: u16| {
        let mut addresses = IndexMap::new();
        addresses.insert("node1".to_string(), format!("192.168.{id}.1/24"));
        addresses.insert("node2".to_string(), format!("192.168.{id}.2/24"));
        VlanSpec {
            id,
            name: format!("vlan{id}"),
            parent: "eth0".to_string(),
            addresses,
        }
    };
    Arc::new(Topology::new(name, scenario.clone(), vec![vlan(10), vlan(20)]))
}

pub fn new_store(dir: &TempDir, mode: PersistMode) -> Arc<ResultStore> {
    ResultStore::create(dir.path(), mode, "en").expect("Failed to create result store")
}

pub fn make_result(module: &str, test: &str, outcome: Outcome, commands: usize) -> TestResult {
    let command_logs = (0..commands)
        .map(|i| {
            CommandRecord::new(
                "node1",
                format!("echo {i}"),
                0,
                format!("{i}\n"),
                Local::now(),
                Duration::from_millis(5),
            )
        })
        .collect();
    TestResult {
        module_name: module.to_string(),
        test_name: test.to_string(),
        outcome,
        duration: Duration::from_millis(20),
        timestamp: Local::now(),
        details: TestDetails { command_logs },
    }
}

pub fn temp_dir() -> TempDir {
    tempdir().expect("Failed to create temporary directory")
}

pub fn write_module(dir: &Path, name: &str, content: &str) -> PathBuf {
    fs::create_dir_all(dir).expect("Failed to create tests directory");
    let path = dir.join(format!("test_{name}.toml"));
    fs::write(&path, content).expect("Failed to write test module");
    path
}

pub const TWO_PINGS_MODULE: &str = r#"
description = "two ping tests"

[[tests]]
name = "test_forward"
[[tests.checks]]
kind = "ping"
from = "node1"
to = "node2"
bidirectional = false

[[tests]]
name = "test_backward"
[[tests.checks]]
kind = "ping"
from = "node2"
to = "node1"
bidirectional = false
"#;

/// Sets up VLAN 10 on both nodes, then checks it and pings across it.
pub const VLAN_MODULE: &str = r#"
description = "vlan 10 between node1 and node2"

[[vlans]]
id = 10
addresses = { node1 = "192.168.10.1/24", node2 = "192.168.10.2/24" }

[[tests]]
name = "test_vlan_up"
[[tests.checks]]
kind = "vlan_status"
node = "node1"
vlan = 10

[[tests]]
name = "test_vlan_reachable"
[[tests.checks]]
kind = "vlan_ping"
node = "node1"
vlan = 10
target = "node2"
"#;
