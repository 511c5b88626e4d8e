use std::{borrow::Borrow, fmt::Display};

use serde::{Deserialize, Serialize};

use crate::network::{node::NodeId, routing_table::Cost};

/// Identifier of a link between two routers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl Display for EdgeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for EdgeId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EdgeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for EdgeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl PartialEq<&str> for EdgeId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Undirected link between two routers.
///
/// A link that is down stays in the topology but is ignored by every adjacency
/// computation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    a: NodeId,
    b: NodeId,
    cost: Cost,
    up: bool,
}

impl Edge {
    /// Edges are only built by `Topology::add_edge`, which validates endpoints and cost.
    pub(crate) fn new(id: EdgeId, a: NodeId, b: NodeId, cost: Cost) -> Self {
        Self { id, a, b, cost, up: true }
    }

    pub fn a(&self) -> &NodeId {
        &self.a
    }

    pub fn b(&self) -> &NodeId {
        &self.b
    }

    pub fn endpoints(&self) -> (&NodeId, &NodeId) {
        (&self.a, &self.b)
    }

    pub fn cost(&self) -> Cost {
        self.cost
    }

    pub(crate) fn set_cost(&mut self, cost: Cost) {
        self.cost = cost;
    }

    pub fn is_up(&self) -> bool {
        self.up
    }

    pub(crate) fn set_up(&mut self, up: bool) {
        self.up = up;
    }

    /// Given one endpoint, returns the other one. `None` if `node` is not an endpoint.
    pub fn other(&self, node: &str) -> Option<&NodeId> {
        if self.a == node {
            Some(&self.b)
        } else if self.b == node {
            Some(&self.a)
        } else {
            None
        }
    }

    pub fn connects(&self, x: &str, y: &str) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }

    pub fn touches(&self, node: &str) -> bool {
        self.a == node || self.b == node
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Edge[{}:{}<->{} cost={} up={}]",
            self.id, self.a, self.b, self.cost, self.up
        )
    }
}

/// One usable hop out of a node: the neighbor, the edge that reaches it and its cost.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub neighbor: NodeId,
    pub edge: EdgeId,
    pub cost: Cost,
}
