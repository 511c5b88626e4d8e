use std::fmt::Display;

use indexmap::IndexMap;
use petgraph::{
    stable_graph::{EdgeIndex, NodeIndex, StableUnGraph},
    visit::EdgeRef,
};
use thiserror::Error;
use tracing::debug;

use crate::network::{
    edge::{Edge, EdgeId, Link},
    node::{Node, NodeId, Position},
    routing_table::{Cost, INFINITY},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("Identifier must not be empty")]
    EmptyId,
    #[error("Node already exists: {0}")]
    DuplicateNode(NodeId),
    #[error("Edge already exists: {0}")]
    DuplicateEdge(EdgeId),
    #[error("Node not found: {0}")]
    UnknownNode(NodeId),
    #[error("Edge not found: {0}")]
    UnknownEdge(EdgeId),
    #[error("Edge {edge} references missing node {node}")]
    MissingEndpoint { edge: EdgeId, node: NodeId },
    #[error("Edge {edge} has invalid cost {cost} (expected 1..{max})")]
    InvalidCost { edge: EdgeId, cost: i64, max: Cost },
    #[error("Edge {0} connects a node to itself")]
    SelfLoop(EdgeId),
    #[error("Nodes {a} and {b} are already linked by {existing}")]
    DuplicateLink { a: NodeId, b: NodeId, existing: EdgeId },
}

pub type TopologyResult<T> = Result<T, TopologyError>;

/// Up-edge adjacency of every node, in node insertion order.
pub type Adjacency = IndexMap<NodeId, Vec<Link>>;

/// The simulated network: routers and the links between them.
///
/// Backed by a petgraph `StableUnGraph` so that removing a node drops its incident
/// edges and leaves every other index valid. The two id maps keep insertion order,
/// which is what engines iterate over to produce reproducible event traces.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: StableUnGraph<Node, Edge>,
    node_id_to_index_map: IndexMap<NodeId, NodeIndex>,
    edge_id_to_index_map: IndexMap<EdgeId, EdgeIndex>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /* ---------------------- Nodes ---------------------- */

    pub fn add_node(&mut self, id: impl Into<NodeId>) -> TopologyResult<()> {
        self.add_node_with(id.into(), None)
    }

    pub fn add_node_at(&mut self, id: impl Into<NodeId>, position: Position) -> TopologyResult<()> {
        self.add_node_with(id.into(), Some(position))
    }

    pub fn add_node_with(&mut self, id: NodeId, position: Option<Position>) -> TopologyResult<()> {
        if id.is_empty() {
            return Err(TopologyError::EmptyId);
        }
        if self.node_id_to_index_map.contains_key(&id) {
            return Err(TopologyError::DuplicateNode(id));
        }
        let index = self.graph.add_node(Node::new(id.clone(), position));
        debug!(node = %id, "node added");
        self.node_id_to_index_map.insert(id, index);
        Ok(())
    }

    /// Removes a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) -> TopologyResult<Node> {
        let index = self
            .node_id_to_index_map
            .shift_remove(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.into()))?;

        // Collect first, the graph drops the edges itself on node removal
        let incident: Vec<EdgeId> = self
            .graph
            .edges(index)
            .map(|edge_ref| edge_ref.weight().id.clone())
            .collect();
        for edge_id in &incident {
            self.edge_id_to_index_map.shift_remove(edge_id);
        }

        let node = self
            .graph
            .remove_node(index)
            .ok_or_else(|| TopologyError::UnknownNode(id.into()))?;
        debug!(node = %id, removed_edges = incident.len(), "node removed");
        Ok(node)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.node_id_to_index_map
            .get(id)
            .and_then(|index| self.graph.node_weight(*index))
    }

    pub fn set_node_position(&mut self, id: &str, x: i32, y: i32) -> TopologyResult<()> {
        let index = self.index_of(id)?;
        let node = self
            .graph
            .node_weight_mut(index)
            .ok_or_else(|| TopologyError::UnknownNode(id.into()))?;
        node.set_position(x, y);
        Ok(())
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.node_id_to_index_map.contains_key(id)
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.node_id_to_index_map
            .values()
            .filter_map(|index| self.graph.node_weight(*index))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = &NodeId> {
        self.node_id_to_index_map.keys()
    }

    pub fn node_count(&self) -> usize {
        self.node_id_to_index_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_id_to_index_map.is_empty()
    }

    /* ---------------------- Edges ---------------------- */

    pub fn add_edge(
        &mut self,
        id: impl Into<EdgeId>,
        a: impl Into<NodeId>,
        b: impl Into<NodeId>,
        cost: Cost,
    ) -> TopologyResult<()> {
        let (id, a, b) = (id.into(), a.into(), b.into());
        if id.is_empty() {
            return Err(TopologyError::EmptyId);
        }
        if self.edge_id_to_index_map.contains_key(&id) {
            return Err(TopologyError::DuplicateEdge(id));
        }
        Self::check_cost(&id, cost)?;
        let a_index = self.endpoint_index(&id, &a)?;
        let b_index = self.endpoint_index(&id, &b)?;
        if a == b {
            return Err(TopologyError::SelfLoop(id));
        }
        if let Some(existing) = self.find_edge_between(a.as_str(), b.as_str()) {
            return Err(TopologyError::DuplicateLink {
                a,
                b,
                existing: existing.id.clone(),
            });
        }

        debug!(edge = %id, %a, %b, cost, "edge added");
        let index = self
            .graph
            .add_edge(a_index, b_index, Edge::new(id.clone(), a, b, cost));
        self.edge_id_to_index_map.insert(id, index);
        Ok(())
    }

    pub fn remove_edge(&mut self, id: &str) -> TopologyResult<Edge> {
        let index = self
            .edge_id_to_index_map
            .shift_remove(id)
            .ok_or_else(|| TopologyError::UnknownEdge(id.into()))?;
        let edge = self
            .graph
            .remove_edge(index)
            .ok_or_else(|| TopologyError::UnknownEdge(id.into()))?;
        debug!(edge = %id, "edge removed");
        Ok(edge)
    }

    /// Marks a link up or down. Down links stay in the topology.
    pub fn set_edge_up(&mut self, id: &str, up: bool) -> TopologyResult<()> {
        let edge = self.edge_mut(id)?;
        edge.set_up(up);
        debug!(edge = %id, up, "edge state changed");
        Ok(())
    }

    pub fn set_edge_cost(&mut self, id: &str, cost: Cost) -> TopologyResult<()> {
        Self::check_cost(&EdgeId::from(id), cost)?;
        let edge = self.edge_mut(id)?;
        edge.set_cost(cost);
        Ok(())
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edge_id_to_index_map
            .get(id)
            .and_then(|index| self.graph.edge_weight(*index))
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edge_id_to_index_map
            .values()
            .filter_map(|index| self.graph.edge_weight(*index))
    }

    pub fn edge_count(&self) -> usize {
        self.edge_id_to_index_map.len()
    }

    /// The link between two nodes, whatever its state.
    pub fn find_edge_between(&self, a: &str, b: &str) -> Option<&Edge> {
        let a_index = *self.node_id_to_index_map.get(a)?;
        let b_index = *self.node_id_to_index_map.get(b)?;
        self.graph
            .find_edge(a_index, b_index)
            .and_then(|index| self.graph.edge_weight(index))
    }

    /* ---------------------- Adjacency ---------------------- */

    /// Neighbor id -> connecting edge id for every live edge of `id`, up or down,
    /// ordered by edge insertion.
    pub fn neighbors(&self, id: &str) -> IndexMap<NodeId, EdgeId> {
        self.incident_edges(id)
            .into_iter()
            .filter_map(|edge| edge.other(id).map(|other| (other.clone(), edge.id.clone())))
            .collect()
    }

    /// Usable hops out of `id`: up edges only, ordered by edge insertion.
    pub fn links(&self, id: &str) -> Vec<Link> {
        self.incident_edges(id)
            .into_iter()
            .filter(|edge| edge.is_up())
            .filter_map(|edge| {
                edge.other(id).map(|other| Link {
                    neighbor: other.clone(),
                    edge: edge.id.clone(),
                    cost: edge.cost(),
                })
            })
            .collect()
    }

    /// Up-edge adjacency of the whole network. Every node has an entry, isolated
    /// ones with an empty link list.
    pub fn adjacency(&self) -> Adjacency {
        self.node_ids()
            .map(|id| (id.clone(), self.links(id.as_str())))
            .collect()
    }

    /// Underlying petgraph graph, e.g. for running petgraph algorithms over it.
    pub fn graph(&self) -> &StableUnGraph<Node, Edge> {
        &self.graph
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_id_to_index_map.get(id).copied()
    }

    /* ---------------------- Helpers ---------------------- */

    fn incident_edges(&self, id: &str) -> Vec<&Edge> {
        let Some(&index) = self.node_id_to_index_map.get(id) else {
            return Vec::new();
        };
        let mut edges: Vec<(usize, &Edge)> = self
            .graph
            .edges(index)
            .filter_map(|edge_ref| {
                let edge = edge_ref.weight();
                self.edge_id_to_index_map
                    .get_index_of(&edge.id)
                    .map(|position| (position, edge))
            })
            .collect();
        edges.sort_by_key(|(position, _)| *position);
        edges.into_iter().map(|(_, edge)| edge).collect()
    }

    fn index_of(&self, id: &str) -> TopologyResult<NodeIndex> {
        self.node_index(id)
            .ok_or_else(|| TopologyError::UnknownNode(id.into()))
    }

    fn endpoint_index(&self, edge: &EdgeId, node: &NodeId) -> TopologyResult<NodeIndex> {
        self.node_index(node.as_str())
            .ok_or_else(|| TopologyError::MissingEndpoint {
                edge: edge.clone(),
                node: node.clone(),
            })
    }

    fn edge_mut(&mut self, id: &str) -> TopologyResult<&mut Edge> {
        let index = *self
            .edge_id_to_index_map
            .get(id)
            .ok_or_else(|| TopologyError::UnknownEdge(id.into()))?;
        self.graph
            .edge_weight_mut(index)
            .ok_or_else(|| TopologyError::UnknownEdge(id.into()))
    }

    fn check_cost(edge: &EdgeId, cost: Cost) -> TopologyResult<()> {
        if cost == 0 || cost >= INFINITY {
            return Err(TopologyError::InvalidCost {
                edge: edge.clone(),
                cost: i64::from(cost),
                max: INFINITY,
            });
        }
        Ok(())
    }
}

impl Display for Topology {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nodes: Vec<&str> = self.node_ids().map(NodeId::as_str).collect();
        let edges: Vec<&str> = self.edge_id_to_index_map.keys().map(EdgeId::as_str).collect();
        write!(
            f,
            "Graph[nodes=[{}], edges=[{}]]",
            nodes.join(", "),
            edges.join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Topology {
        let mut topology = Topology::new();
        for id in ["A", "B", "C", "D"] {
            topology.add_node(id).unwrap();
        }
        topology.add_edge("e1", "A", "B", 1).unwrap();
        topology.add_edge("e2", "B", "C", 3).unwrap();
        topology.add_edge("e3", "A", "C", 7).unwrap();
        topology.add_edge("e4", "C", "D", 2).unwrap();
        topology
    }

    #[test]
    fn test_construction_errors() {
        let mut topology = square();

        assert_eq!(topology.add_node(""), Err(TopologyError::EmptyId));
        assert_eq!(
            topology.add_node("A"),
            Err(TopologyError::DuplicateNode("A".into()))
        );
        assert_eq!(
            topology.add_edge("e1", "A", "D", 1),
            Err(TopologyError::DuplicateEdge("e1".into()))
        );
        assert_eq!(
            topology.add_edge("e9", "A", "Z", 1),
            Err(TopologyError::MissingEndpoint { edge: "e9".into(), node: "Z".into() })
        );
        assert!(matches!(
            topology.add_edge("e9", "A", "D", 0),
            Err(TopologyError::InvalidCost { cost: 0, .. })
        ));
        assert!(matches!(
            topology.add_edge("e9", "A", "D", INFINITY),
            Err(TopologyError::InvalidCost { .. })
        ));
        assert_eq!(
            topology.add_edge("e9", "A", "A", 1),
            Err(TopologyError::SelfLoop("e9".into()))
        );
        assert_eq!(
            topology.add_edge("e9", "B", "A", 2),
            Err(TopologyError::DuplicateLink { a: "B".into(), b: "A".into(), existing: "e1".into() })
        );
        // Nothing was added by the failed calls
        assert_eq!(topology.node_count(), 4);
        assert_eq!(topology.edge_count(), 4);
    }

    #[test]
    fn test_remove_node_cascades() {
        let mut topology = square();
        assert!(topology.contains_node("C"));
        let removed = topology.remove_node("C").unwrap();
        assert_eq!(removed.id, "C");
        assert!(!topology.contains_node("C"));
        assert!(topology.contains_node("A"));
        assert!(topology.edges().all(|edge| !edge.touches("C")));

        assert_eq!(topology.edge_count(), 1);
        assert!(topology.edge("e2").is_none());
        assert!(topology.edge("e3").is_none());
        assert!(topology.edge("e4").is_none());
        for node in ["A", "B", "D"] {
            assert!(!topology.neighbors(node).contains_key("C"));
        }
        assert!(topology.neighbors("D").is_empty());
        assert_eq!(topology.to_string(), "Graph[nodes=[A, B, D], edges=[e1]]");

        assert_eq!(
            topology.remove_node("C"),
            Err(TopologyError::UnknownNode("C".into()))
        );
    }

    #[test]
    fn test_removed_node_id_can_be_reused() {
        let mut topology = square();
        topology.remove_node("B").unwrap();
        topology.add_node("B").unwrap();
        topology.add_edge("e5", "B", "D", 4).unwrap();

        let order: Vec<_> = topology.node_ids().map(NodeId::as_str).collect();
        assert_eq!(order, vec!["A", "C", "D", "B"]);
        assert_eq!(topology.neighbors("B").get("D"), Some(&EdgeId::from("e5")));
    }

    #[test]
    fn test_neighbors_follow_edge_insertion_order() {
        let topology = square();
        let neighbors: Vec<(String, String)> = topology
            .neighbors("C")
            .into_iter()
            .map(|(n, e)| (n.to_string(), e.to_string()))
            .collect();
        assert_eq!(
            neighbors,
            vec![
                ("B".to_string(), "e2".to_string()),
                ("A".to_string(), "e3".to_string()),
                ("D".to_string(), "e4".to_string()),
            ]
        );
    }

    #[test]
    fn test_down_edges_are_kept_but_not_linked() {
        let mut topology = square();
        topology.set_edge_up("e3", false).unwrap();

        assert!(topology.edge("e3").is_some());
        assert!(topology.neighbors("A").contains_key("C"));
        assert!(topology.links("A").iter().all(|link| link.neighbor != "C"));

        let adjacency = topology.adjacency();
        assert_eq!(adjacency.len(), 4);
        assert_eq!(adjacency["A"].len(), 1);

        topology.set_edge_up("e3", true).unwrap();
        assert_eq!(topology.links("A").len(), 2);
    }

    #[test]
    fn test_edge_updates() {
        let mut topology = square();
        topology.set_edge_cost("e1", 9).unwrap();
        assert_eq!(topology.edge("e1").map(Edge::cost), Some(9));
        assert!(topology.set_edge_cost("e1", 0).is_err());
        assert_eq!(
            topology.set_edge_up("nope", false),
            Err(TopologyError::UnknownEdge("nope".into()))
        );

        let between = topology.find_edge_between("D", "C").map(|edge| edge.id.clone());
        assert_eq!(between, Some("e4".into()));
        assert!(topology.find_edge_between("A", "D").is_none());

        topology.remove_edge("e4").unwrap();
        assert!(topology.find_edge_between("C", "D").is_none());
        assert!(topology.neighbors("D").is_empty());
    }

    #[test]
    fn test_node_positions() {
        let mut topology = Topology::new();
        topology.add_node_at("R1", Position::new(100, 200)).unwrap();
        topology.add_node("R2").unwrap();
        topology.set_node_position("R2", 5, 6).unwrap();

        assert_eq!(topology.node("R1").unwrap().position, Some(Position::new(100, 200)));
        assert_eq!(topology.node("R2").unwrap().position, Some(Position::new(5, 6)));
        assert!(topology.set_node_position("R3", 0, 0).is_err());
    }
}
