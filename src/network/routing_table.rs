use std::fmt::Display;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::network::node::NodeId;

/// Link and path cost.
pub type Cost = u32;

/// Cost of an unreachable destination. Finite, so that `INFINITY + link cost` still
/// fits in a `Cost`.
pub const INFINITY: Cost = 1_000_000_000;

/// Adds a link cost to a path cost, clamping at `INFINITY`.
pub fn add_costs(path: Cost, link: Cost) -> Cost {
    if path >= INFINITY || link >= INFINITY {
        return INFINITY;
    }
    path.saturating_add(link).min(INFINITY)
}

/// Destination-ordered routing table of a single router.
pub type RoutingTable = IndexMap<NodeId, RoutingTableEntry>;

/// One row of a routing table: destination, next hop, cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTableEntry {
    pub destination: NodeId,
    pub next_hop: Option<NodeId>,
    pub cost: Cost,
}

impl RoutingTableEntry {
    pub fn new(destination: NodeId, next_hop: Option<NodeId>, cost: Cost) -> Self {
        Self {
            destination,
            next_hop,
            cost: cost.min(INFINITY),
        }
    }

    /// The entry a router holds for itself.
    pub fn local(owner: &NodeId) -> Self {
        Self::new(owner.clone(), Some(owner.clone()), 0)
    }

    pub fn unreachable(destination: NodeId) -> Self {
        Self::new(destination, None, INFINITY)
    }

    pub fn is_unreachable(&self) -> bool {
        self.cost >= INFINITY
    }

    /// Cost as shown in tables and logs ("INF" for unreachable).
    pub fn cost_label(&self) -> String {
        format_cost(self.cost)
    }
}

impl Display for RoutingTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let next = self
            .next_hop
            .as_ref()
            .map(NodeId::to_string)
            .unwrap_or_else(|| "-".to_string());
        write!(
            f,
            "RTEntry[dst={}, next={}, cost={}]",
            self.destination,
            next,
            self.cost_label()
        )
    }
}

pub fn format_cost(cost: Cost) -> String {
    if cost >= INFINITY {
        "INF".to_string()
    } else {
        cost.to_string()
    }
}

/// Fresh table for `owner`: itself at cost 0, every other node unreachable.
pub fn initial_table<'a>(owner: &NodeId, nodes: impl IntoIterator<Item = &'a NodeId>) -> RoutingTable {
    nodes
        .into_iter()
        .map(|node| {
            let entry = if node == owner {
                RoutingTableEntry::local(owner)
            } else {
                RoutingTableEntry::unreachable(node.clone())
            };
            (node.clone(), entry)
        })
        .collect()
}
