//! Presence of a prefix in a node's routing table.

use async_trait::async_trait;
use serde::Deserialize;

use super::{Check, require_node};
use crate::core::execution::{TestContext, ensure};
use crate::core::suite::Topology;
use crate::errors::TestFailure;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RouteCheck {
    pub node: String,
    /// e.g. `172.20.0.0/16`
    pub prefix: String,
}

#[async_trait]
impl Check for RouteCheck {
    fn validate(&self, topology: &Topology) -> Result<(), String> {
        require_node(topology, &self.node)?;
        if self.prefix.trim().is_empty() {
            return Err("route prefix must not be empty".to_string());
        }
        Ok(())
    }

    async fn run(&self, ctx: &TestContext) -> Result<(), TestFailure> {
        let routes = ctx
            .exec_ok(&self.node, "ip route", "Failed to get routing table")
            .await?;
        ensure(
            routes.contains(&self.prefix),
            format!("Missing expected route {} on {}", self.prefix, self.node),
        )
    }
}
