//! # Init Command Module / 初始化命令模块
//!
//! Implements `netprobe init`: writes the default scenario configuration and
//! two reference test modules (connectivity and VLAN configuration).
//!
//! 实现 `netprobe init`：写出默认场景配置以及两个参考测试模块（连通性和 VLAN 配置）。

use anyhow::{Context, Result};
use colored::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::{self, NetprobeConfig};
use crate::core::suite::module_file_name;
use crate::infra::t;

pub const CONNECTIVITY_MODULE: &str = r#"# Basic connectivity between the two default nodes / 默认双节点之间的基本连通性
description = "Ping, interface and routing checks between node1 and node2"
scenario = "basic_connectivity"

[[tests]]
name = "test_ping_between_nodes"
description = "node1 and node2 can ping each other"
[[tests.checks]]
kind = "ping"
from = "node1"
to = "node2"
count = 3
bidirectional = true

[[tests]]
name = "test_interface_configuration"
description = "eth0 is up on both nodes"
[[tests.checks]]
kind = "interface"
node = "node1"
interface = "eth0"
[[tests.checks]]
kind = "interface"
node = "node2"
interface = "eth0"

[[tests]]
name = "test_routing_configuration"
description = "Both nodes route the scenario network"
[[tests.checks]]
kind = "route"
node = "node1"
prefix = "172.20.0.0/16"
[[tests.checks]]
kind = "route"
node = "node2"
prefix = "172.20.0.0/16"
"#;

pub const VLAN_MODULE: &str = r#"# VLAN sub-interfaces created around every test / 每个测试前后创建的 VLAN 子接口
description = "VLAN creation, connectivity and isolation"
scenario = "basic_connectivity"

[[vlans]]
id = 10
name = "management"
addresses = { node1 = "192.168.10.1/24", node2 = "192.168.10.2/24" }

[[vlans]]
id = 20
name = "data"
addresses = { node1 = "192.168.20.1/24", node2 = "192.168.20.2/24" }

[[tests]]
name = "test_vlan_configuration"
description = "Both VLANs carry traffic and are configured on node1"
[[tests.checks]]
kind = "vlan_ping"
node = "node1"
vlan = 10
target = "node2"
[[tests.checks]]
kind = "vlan_ping"
node = "node1"
vlan = 20
target = "node2"
[[tests.checks]]
kind = "vlan_status"
node = "node1"
vlan = 10
[[tests.checks]]
kind = "vlan_status"
node = "node1"
vlan = 20

[[tests]]
name = "test_vlan_isolation"
description = "VLAN 10 cannot reach the VLAN 20 address of node2"
[[tests.checks]]
kind = "vlan_isolation"
node = "node1"
vlan = 10
target = "node2"
target_vlan = 20
"#;

/// Executes the init command.
///
/// Existing files are kept unless `force` is set. The tests directory is taken
/// from `tests_dir`, else from an existing configuration, else the default.
pub fn execute(config_path: &Path, tests_dir: Option<PathBuf>, force: bool, locale: &str) -> Result<()> {
    let config = if config_path.exists() && !force {
        print_kept(config_path, locale);
        config::load_or_create(config_path)?
    } else {
        let config = NetprobeConfig::default();
        config::write_config(config_path, &config)?;
        println!(
            "{}",
            t!("init.success", locale = locale, path = config_path.display()).green()
        );
        config
    };

    let tests_dir = tests_dir.unwrap_or(config.tests_dir);
    fs::create_dir_all(&tests_dir).with_context(|| {
        t!("init.create_dir_failed", locale = locale, path = tests_dir.display()).to_string()
    })?;

    for (name, content) in [("connectivity", CONNECTIVITY_MODULE), ("vlan_configuration", VLAN_MODULE)] {
        let path = tests_dir.join(module_file_name(name));
        write_module(&path, content, force, locale)?;
    }

    println!("{}", t!("init.next_steps", locale = locale));
    Ok(())
}

fn write_module(path: &Path, content: &str, force: bool, locale: &str) -> Result<()> {
    if path.exists() && !force {
        print_kept(path, locale);
        return Ok(());
    }
    fs::write(path, content).with_context(|| {
        t!("init.write_failed", locale = locale, path = path.display()).to_string()
    })?;
    println!(
        "{}",
        t!("init.success", locale = locale, path = path.display()).green()
    );
    Ok(())
}

fn print_kept(path: &Path, locale: &str) {
    println!(
        "{} {}",
        t!("init.file_exists", locale = locale, path = path.display()).yellow(),
        t!("init.use_force", locale = locale).dimmed()
    );
}
