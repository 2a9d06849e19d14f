//! Reachability between two nodes.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Check, require_node, resolve};
use crate::core::execution::{TestContext, ensure};
use crate::core::suite::Topology;
use crate::errors::TestFailure;

/// ICMP echo from `from` to `to`, and back when `bidirectional` is set.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PingCheck {
    pub from: String,
    /// Node name or literal IP / 节点名或 IP 字面量
    pub to: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default = "default_bidirectional")]
    pub bidirectional: bool,
}

fn default_count() -> u32 {
    3
}

fn default_bidirectional() -> bool {
    true
}

pub fn ping_command(count: u32, target_ip: &str) -> String {
    format!("ping -c {count} {target_ip}")
}

impl PingCheck {
    async fn ping(&self, ctx: &TestContext, from: &str, to: &str) -> Result<(), TestFailure> {
        let ip = resolve(ctx, to, None)?;
        let out = ctx.exec(from, &ping_command(self.count, &ip)).await?;
        ensure(out.success(), format!("{from} cannot ping {to}"))
    }
}

#[async_trait]
impl Check for PingCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_node(topology, &self.from)?;
        if self.count == 0 {
            return Err("ping count must be at least 1".to_string());
        }
        if self.bidirectional {
            require_node(topology, &self.to)?;
        } else if topology.resolve_target(&self.to, None).is_none() {
            return Err(format!("cannot resolve ping target `{}`", self.to));
        }
        Ok(())
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        self.ping(ctx, &self.from, &self.to).await?;
        if self.bidirectional {
            self.ping(ctx, &self.to, &self.from).await?;
        }
        Ok(())
    }
}
