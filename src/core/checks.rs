//! # Checks Module / 检查模块
//!
//! A check is one verification step of a test: it runs commands on nodes
//! through the [`TestContext`] and fails with a [`TestFailure`] when the
//! network does not behave as expected. Test modules list checks by `kind`.
//!
//! 检查是测试中的一个验证步骤：它通过 [`TestContext`] 在节点上运行命令，
//! 当网络行为不符合预期时以 [`TestFailure`] 失败。

pub mod connectivity;
pub mod interface;
pub mod routing;
pub mod vlan;

use async_trait::async_trait;
use serde::Deserialize;

use crate::core::execution::TestContext;
use crate::core::suite::Topology;
use crate::errors::TestFailure;

pub use connectivity::PingCheck;
pub use interface::InterfaceCheck;
pub use routing::RouteCheck;
pub use vlan::{VlanFixture, VlanIsolationCheck, VlanManager, VlanPingCheck, VlanStatusCheck, with_vlans};

#[async_trait]
pub trait Check: Send + Sync {
    /// Checks references against the module's topology before anything runs.
    fn validate(&self, topology: &Topology) -> Result<(), String>;

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure>;
}

/// A check as written in a test module file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CheckSpec {
    Ping(PingCheck),
    Interface(InterfaceCheck),
    Route(RouteCheck),
    VlanPing(VlanPingCheck),
    VlanStatus(VlanStatusCheck),
    VlanIsolation(VlanIsolationCheck),
}

impl CheckSpec {
    pub fn as_check(&self) -> &dyn Check {
        match self {
            CheckSpec::Ping(c) => c,
            CheckSpec::Interface(c) => c,
            CheckSpec::Route(c) => c,
            CheckSpec::VlanPing(c) => c,
            CheckSpec::VlanStatus(c) => c,
            CheckSpec::VlanIsolation(c) => c,
        }
    }

    pub fn validate(&self, topology: &Topology) -> Result<(), String> {
        self.as_check().validate(topology)
    }

    pub async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        self.as_check().run(ctx).await
    }
}

/// Runs `checks` in order, stopping at the first failure.
pub async fn run_checks(ctx: &TestContext, checks: &[CheckSpec]) -> Result<(), TestFailure> {
    for check in checks {
        check.run(ctx).await?;
    }
    Ok(())
}

pub(crate) fn require_node(topology: &Topology, node: &str) -> Result<(), String> {
    if topology.has_node(node) {
        Ok(())
    } else {
        Err(format!(
            "node `{node}` is not part of scenario `{}`",
            topology.scenario_name
        ))
    }
}

pub(crate) fn resolve(ctx: &TestContext, target: &str, vlan: Option<u16>) -> Result<String, TestFailure> {
    ctx.topology()
        .resolve_target(target, vlan)
        .ok_or_else(|| TestFailure::Assertion(format!("cannot resolve address of `{target}`")))
}
