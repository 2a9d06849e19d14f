//! # VLAN Management / VLAN 管理
//!
//! [`VlanManager`] wraps the `ip link` commands that create, inspect and remove
//! 802.1Q sub-interfaces on one node. [`with_vlans`] sets up a module's VLANs
//! around a test body and removes them afterwards, whatever the body did.
//!
//! [`VlanManager`] 封装了在单个节点上创建、检查和删除 802.1Q 子接口的 `ip link` 命令。
//! [`with_vlans`] 在测试体前后建立并移除模块的 VLAN，无论测试体结果如何。

use async_trait::async_trait;
use futures::FutureExt;
use serde::Deserialize;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

use super::{Check, require_node, resolve};
use crate::core::execution::{TestContext, ensure};
use crate::core::suite::{Topology, VlanSpec};
use crate::errors::TestFailure;

/// Pings sent by a VLAN connectivity probe / VLAN 连通性探测发送的 ping 数
pub const VLAN_PING_COUNT: u32 = 3;

/// `RTNETLINK answers: File exists`
const ALREADY_EXISTS: &str = "File exists";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VlanInfo {
    pub vlan_id: u16,
    pub configured: bool,
    pub details: String,
}

/// VLAN operations on one node.
pub struct VlanManager<'a> {
    ctx: &'a TestContext,
    node: &'a str,
}

impl<'a> VlanManager<'a> {
    pub fn new(ctx: &'a TestContext, node: &'a str) -> Self {
        Self { ctx, node }
    }

    /// Creates the sub-interface, assigns `address` and brings it up. An
    /// interface or address left behind by an earlier run is reused.
    pub async fn create(&self, vlan: &VlanSpec, address: &str) -> Result<(), TestFailure> {
        let iface = vlan.interface();
        let context = format!("Failed to create VLAN {}", vlan.id);
        self.exec_allow_existing(
            &format!(
                "ip link add link {} name {iface} type vlan id {}",
                vlan.parent, vlan.id
            ),
            &context,
        )
        .await?;
        self.exec_allow_existing(&format!("ip addr add {address} dev {iface}"), &context)
            .await?;
        self.ctx
            .exec_ok(self.node, &format!("ip link set {iface} up"), &context)
            .await?;
        debug!(node = self.node, vlan = vlan.id, %iface, "VLAN created");
        Ok(())
    }

    async fn exec_allow_existing(&self, command: &str, context: &str) -> Result<(), TestFailure> {
        match self.ctx.exec_ok(self.node, command, context).await {
            Err(TestFailure::CommandFailed { output, .. }) if output.contains(ALREADY_EXISTS) => {
                debug!(node = self.node, command, "already present, reusing");
                Ok(())
            }
            other => other.map(|_| ()),
        }
    }

    pub async fn delete(&self, vlan: &VlanSpec) -> Result<(), TestFailure> {
        self.ctx
            .exec_ok(
                self.node,
                &format!("ip link delete {}", vlan.interface()),
                &format!("Failed to delete VLAN {}", vlan.id),
            )
            .await?;
        Ok(())
    }

    /// A sub-interface counts as configured when `ip -d link show` succeeds.
    pub async fn info(&self, vlan: &VlanSpec) -> Result<VlanInfo, TestFailure> {
        let out = self
            .ctx
            .exec(self.node, &format!("ip -d link show {}", vlan.interface()))
            .await?;
        Ok(VlanInfo {
            vlan_id: vlan.id,
            configured: out.success(),
            details: out.output,
        })
    }

    /// Pings `target_ip` out of the VLAN interface. Only the exit code counts.
    pub async fn verify_connectivity(&self, vlan: &VlanSpec, target_ip: &str) -> Result<bool, TestFailure> {
        let out = self
            .ctx
            .exec(
                self.node,
                &format!("ping -I {} -c {VLAN_PING_COUNT} {target_ip}", vlan.interface()),
            )
            .await?;
        Ok(out.success())
    }
}

/// VLAN interfaces created for one test, in creation order.
#[derive(Debug, Default)]
pub struct VlanFixture {
    created: Vec<(String, VlanSpec)>,
}

impl VlanFixture {
    /// Creates every VLAN of the topology on every node it addresses. When a
    /// step fails, whatever was already created is removed again.
    pub async fn setup(ctx: &TestContext) -> Result<Self, TestFailure> {
        let mut fixture = Self::default();
        for vlan in &ctx.topology().vlans {
            for (node, address) in &vlan.addresses {
                if let Err(e) = VlanManager::new(ctx, node).create(vlan, address).await {
                    fixture.teardown(ctx).await;
                    return Err(e);
                }
                fixture.created.push((node.clone(), vlan.clone()));
            }
        }
        Ok(fixture)
    }

    pub fn created(&self) -> usize {
        self.created.len()
    }

    /// Removes the created interfaces in reverse order. Failures are logged
    /// and do not stop the remaining deletions.
    pub async fn teardown(self, ctx: &TestContext) {
        for (node, vlan) in self.created.iter().rev() {
            if let Err(e) = VlanManager::new(ctx, node).delete(vlan).await {
                warn!(node = %node, vlan = vlan.id, error = %e, "VLAN cleanup failed");
            }
        }
    }
}

/// Runs `body` between VLAN setup and teardown. Teardown also runs when the
/// body fails or panics; the panic is resumed afterwards.
pub async fn with_vlans<F, Fut>(ctx: &TestContext, body: F) -> Result<(), TestFailure>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<(), TestFailure>>,
{
    if ctx.topology().vlans.is_empty() {
        return body().await;
    }

    let fixture = VlanFixture::setup(ctx).await?;
    let result = AssertUnwindSafe(body()).catch_unwind().await;
    fixture.teardown(ctx).await;

    match result {
        Ok(r) => r,
        Err(payload) => std::panic::resume_unwind(payload),
    }
}

fn require_vlan_member(topology: &Topology, node: &str, vlan: u16) -> Result<(), String> {
    require_node(topology, node)?;
    let declared = topology
        .vlan(vlan)
        .ok_or_else(|| format!("VLAN {vlan} is not declared by the module"))?;
    if declared.addresses.contains_key(node) {
        Ok(())
    } else {
        Err(format!("node `{node}` has no address on VLAN {vlan}"))
    }
}

fn require_target(topology: &Topology, target: &str, vlan: u16) -> Result<(), String> {
    topology
        .resolve_target(target, Some(vlan))
        .map(|_| ())
        .ok_or_else(|| format!("cannot resolve `{target}` on VLAN {vlan}"))
}

fn vlan_of<'t>(ctx: &'t TestContext, id: u16) -> Result<&'t VlanSpec, TestFailure> {
    ctx.topology()
        .vlan(id)
        .ok_or_else(|| TestFailure::Assertion(format!("VLAN {id} is not declared")))
}

/// Traffic from `node` over `vlan` reaches `target`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VlanPingCheck {
    pub node: String,
    pub vlan: u16,
    pub target: String,
    /// VLAN the target address is taken from; defaults to `vlan`
    #[serde(default)]
    pub target_vlan: Option<u16>,
}

#[async_trait]
impl Check for VlanPingCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_vlan_member(topology, &self.node, self.vlan)?;
        require_target(topology, &self.target, self.target_vlan.unwrap_or(self.vlan))
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        let vlan = vlan_of(ctx, self.vlan)?;
        let ip = resolve(ctx, &self.target, Some(self.target_vlan.unwrap_or(self.vlan)))?;
        let reached = VlanManager::new(ctx, &self.node)
            .verify_connectivity(vlan, &ip)
            .await?;
        ensure(reached, format!("VLAN {} connectivity failed", self.vlan))
    }
}

/// The sub-interface for `vlan` exists on `node`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VlanStatusCheck {
    pub node: String,
    pub vlan: u16,
}

#[async_trait]
impl Check for VlanStatusCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_vlan_member(topology, &self.node, self.vlan)
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        let vlan = vlan_of(ctx, self.vlan)?;
        let info = VlanManager::new(ctx, &self.node).info(vlan).await?;
        ensure(
            info.configured,
            format!("VLAN {} not properly configured", self.vlan),
        )
    }
}

/// Traffic from `node` over `vlan` must NOT reach `target` on another VLAN.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VlanIsolationCheck {
    pub node: String,
    pub vlan: u16,
    pub target: String,
    #[serde(default)]
    pub target_vlan: Option<u16>,
}

#[async_trait]
impl Check for VlanIsolationCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_vlan_member(topology, &self.node, self.vlan)?;
        require_target(topology, &self.target, self.target_vlan.unwrap_or(self.vlan))
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        let vlan = vlan_of(ctx, self.vlan)?;
        let ip = resolve(ctx, &self.target, Some(self.target_vlan.unwrap_or(self.vlan)))?;
        let reached = VlanManager::new(ctx, &self.node)
            .verify_connectivity(vlan, &ip)
            .await?;
        ensure(
            !reached,
            format!(
                "VLAN isolation breach detected: {} reached {} ({ip}) from VLAN {}",
                self.node, self.target, self.vlan
            ),
        )
    }
}
