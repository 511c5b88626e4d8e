/*
 * This module defines the network model the routing engines run over:
 * routers, links, the topology graph and the routing table row type.
 * It also provides ready-made topologies for demos and tests.
 */

pub mod edge;
pub mod generator;
pub mod node;
pub mod routing_table;
pub mod topology;

pub use edge::{Edge, EdgeId, Link};
pub use node::{Node, NodeId, Position};
pub use routing_table::{Cost, INFINITY, RoutingTable, RoutingTableEntry};
pub use topology::{Adjacency, Topology, TopologyError, TopologyResult};
