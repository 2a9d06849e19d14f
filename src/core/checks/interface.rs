//! Link state of a network interface.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Check, require_node};
use crate::core::execution::{TestContext, ensure};
use crate::core::suite::Topology;
use crate::errors::TestFailure;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Up,
    Down,
}

impl LinkState {
    /// `ip addr show` prints `UP` among the interface flags of a live link.
    pub fn from_output(output: &str) -> Self {
        if output.contains("UP") {
            LinkState::Up
        } else {
            LinkState::Down
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InterfaceCheck {
    pub node: String,
    #[serde(default = "default_interface")]
    pub interface: String,
}

fn default_interface() -> String {
    "eth0".to_string()
}

impl InterfaceCheck {
    pub async fn query(&self, ctx: &TestContext) -> Result<LinkState, TestFailure> {
        let output = ctx
            .exec_ok(
                &self.node,
                &format!("ip addr show {}", self.interface),
                "Failed to get interface information",
            )
            .await?;
        Ok(LinkState::from_output(&output))
    }
}

#[async_trait]
impl Check for InterfaceCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_node(topology, &self.node)
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        let state = self.query(ctx).await?;
        ensure(
            state == LinkState::Up,
            format!("{} interface {} is down", self.node, self.interface),
        )
    }
}
