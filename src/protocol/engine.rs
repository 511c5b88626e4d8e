/*!
This module defines the trait shared by the routing engines and the selector used to pick one.
*/

use std::{fmt::Display, str::FromStr};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{
    network::{node::NodeId, routing_table::RoutingTable, topology::Topology},
    protocol::{
        distance_vector::DistanceVectorEngine, event::ProtocolEvent, link_state::LinkStateEngine,
    },
};

/// Routing protocols the simulator knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    #[serde(alias = "dv")]
    DistanceVector,
    #[serde(alias = "ls")]
    LinkState,
}

impl Algorithm {
    /// Builds an engine for this protocol over `topology`.
    pub fn engine<'a>(&self, topology: &'a Topology) -> Box<dyn RoutingEngine + 'a> {
        match self {
            Algorithm::DistanceVector => Box::new(DistanceVectorEngine::new(topology)),
            Algorithm::LinkState => Box::new(LinkStateEngine::new(topology)),
        }
    }
}

impl Display for Algorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Algorithm::DistanceVector => write!(f, "Distance Vector"),
            Algorithm::LinkState => write!(f, "Link State"),
        }
    }
}

impl FromStr for Algorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "dv" | "distance-vector" => Ok(Algorithm::DistanceVector),
            "ls" | "link-state" => Ok(Algorithm::LinkState),
            other => Err(format!("unknown algorithm: {other} (expected dv or ls)")),
        }
    }
}

/// Common surface of the routing engines, so callers can treat them alike.
///
/// An engine borrows the topology for its whole lifetime, which keeps the network
/// read-only while a run is in progress. Everything it returns is a copy of its
/// private working state.
pub trait RoutingEngine {
    fn algorithm(&self) -> Algorithm;

    /// Runs the protocol and reports whether it converged.
    /// `max_iterations` only bounds iterative protocols.
    fn run(&mut self, max_iterations: u32) -> bool;

    fn logs(&self) -> Vec<String>;

    fn events(&self) -> Vec<ProtocolEvent>;

    /// Table of `node`, empty if the node is unknown or the engine hasn't run.
    fn routing_table(&self, node: &str) -> RoutingTable;

    /// Tables of every node, in node insertion order.
    fn routing_tables(&self) -> IndexMap<NodeId, RoutingTable>;

    /// Iteration at which the run converged, `None` if it did not (or hasn't run).
    fn converged_iteration(&self) -> Option<u32>;
}
