use std::{cmp::Reverse, collections::BinaryHeap};

use indexmap::IndexMap;
use tracing::{debug, info};

use crate::{
    network::{
        edge::EdgeId,
        node::NodeId,
        routing_table::{Cost, INFINITY, RoutingTable, RoutingTableEntry, add_costs, initial_table},
        topology::Topology,
    },
    protocol::{
        engine::{Algorithm, RoutingEngine},
        event::ProtocolEvent,
        record::RunRecord,
    },
};

/// Shortest-path tree of one source, indexed by node position.
struct ShortestPaths {
    dist: Vec<Cost>,
    prev: Vec<Option<(usize, EdgeId)>>,
}

impl ShortestPaths {
    /// Neighbor of `source` on the path towards `target`.
    fn first_hop(&self, source: usize, target: usize) -> Option<usize> {
        let mut current = target;
        while let Some((parent, _)) = &self.prev[current] {
            if *parent == source {
                return Some(current);
            }
            current = *parent;
        }
        None
    }
}

/// Link-state simulation: every router floods its links, then runs Dijkstra over
/// the full picture. Each source is reported as one iteration and each finalized
/// destination as a table update.
pub struct LinkStateEngine<'a> {
    topology: &'a Topology,
    tables: IndexMap<NodeId, RoutingTable>,
    record: RunRecord,
    converged_iteration: Option<u32>,
}

impl<'a> LinkStateEngine<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self {
            topology,
            tables: IndexMap::new(),
            record: RunRecord::default(),
            converged_iteration: None,
        }
    }

    /// Computes the tables of every node. Always converges, so always returns true.
    pub fn run_with_logging(&mut self) -> bool {
        self.record.clear();
        self.tables.clear();
        self.converged_iteration = None;

        let adjacency = self.topology.adjacency();
        let nodes: Vec<NodeId> = adjacency.keys().cloned().collect();
        // Same graph, by position, so the heap can order on (cost, insertion index)
        let links: Vec<Vec<(usize, Cost, EdgeId)>> = adjacency
            .values()
            .map(|links| {
                links
                    .iter()
                    .filter_map(|link| {
                        adjacency
                            .get_index_of(&link.neighbor)
                            .map(|position| (position, link.cost, link.edge.clone()))
                    })
                    .collect()
            })
            .collect();

        self.record
            .announce("Link State: starting Dijkstra from every node.");

        for (source, source_id) in nodes.iter().enumerate() {
            let iteration = source as u32 + 1;
            self.record.log(format!("Dijkstra source: {source_id}"));
            self.record.emit(ProtocolEvent::iteration_start(iteration));
            self.record.emit(ProtocolEvent::message_send(
                source_id.clone(),
                None,
                links[source].first().map(|(_, _, edge)| edge.clone()),
                iteration,
                format!("LSA flood from {source_id}"),
            ));

            let mut table = initial_table(source_id, &nodes);
            let paths = self.dijkstra(source, &links, |record, node, cost, first_hop, edge| {
                let destination = &nodes[node];
                let next_hop = &nodes[first_hop];
                record.log(format!(
                    "Dijkstra[{source_id}]: finalized {destination} (cost={cost}) nextHop={next_hop}"
                ));
                record.emit(ProtocolEvent::table_update(
                    source_id.clone(),
                    destination.clone(),
                    next_hop.clone(),
                    None,
                    cost,
                    Some(edge.clone()),
                    iteration,
                    format!("{source_id} -> {destination}: nextHop={next_hop} cost={cost}"),
                ));
            });

            for (node, cost) in paths.dist.iter().enumerate() {
                if node == source || *cost >= INFINITY {
                    continue;
                }
                let next_hop = paths.first_hop(source, node).map(|hop| nodes[hop].clone());
                table.insert(
                    nodes[node].clone(),
                    RoutingTableEntry::new(nodes[node].clone(), next_hop, *cost),
                );
            }
            debug!(source = %source_id, iteration, "dijkstra finished");

            self.tables.insert(source_id.clone(), table);
            self.record.emit(ProtocolEvent::iteration_end(iteration));
        }

        self.converged_iteration = Some(1);
        self.record
            .log("Link State: completed Dijkstra for all nodes.");
        self.record.emit(ProtocolEvent::converged(1));
        info!(
            sources = nodes.len(),
            events = self.record.event_count(),
            "link state completed"
        );
        true
    }

    /// Dijkstra from `source`. `on_finalized(record, node, cost, first_hop, edge)` is
    /// called once per reachable node other than the source, in finalization order.
    fn dijkstra<F>(
        &mut self,
        source: usize,
        links: &[Vec<(usize, Cost, EdgeId)>],
        mut on_finalized: F,
    ) -> ShortestPaths
    where
        F: FnMut(&mut RunRecord, usize, Cost, usize, &EdgeId),
    {
        let mut paths = ShortestPaths {
            dist: vec![INFINITY; links.len()],
            prev: vec![None; links.len()],
        };
        let mut finalized = vec![false; links.len()];
        let mut heap = BinaryHeap::new();

        paths.dist[source] = 0;
        heap.push(Reverse((0, source)));

        while let Some(Reverse((cost, node))) = heap.pop() {
            if finalized[node] {
                continue;
            }
            finalized[node] = true;

            if node != source {
                if let (Some(first_hop), Some((_, edge))) =
                    (paths.first_hop(source, node), &paths.prev[node])
                {
                    on_finalized(&mut self.record, node, cost, first_hop, edge);
                }
            }

            for (neighbor, link_cost, edge) in &links[node] {
                if finalized[*neighbor] {
                    continue;
                }
                let candidate = add_costs(cost, *link_cost);
                if candidate < paths.dist[*neighbor] {
                    paths.dist[*neighbor] = candidate;
                    paths.prev[*neighbor] = Some((node, edge.clone()));
                    heap.push(Reverse((candidate, *neighbor)));
                }
            }
        }
        paths
    }

    pub fn logs(&self) -> Vec<String> {
        self.record.logs()
    }

    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.record.events()
    }

    /// Table computed with `node` as the Dijkstra source.
    pub fn routing_table(&self, node: &str) -> RoutingTable {
        self.tables.get(node).cloned().unwrap_or_default()
    }

    pub fn routing_tables(&self) -> IndexMap<NodeId, RoutingTable> {
        self.tables.clone()
    }

    pub fn converged_iteration(&self) -> Option<u32> {
        self.converged_iteration
    }
}

impl RoutingEngine for LinkStateEngine<'_> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::LinkState
    }

    fn run(&mut self, _max_iterations: u32) -> bool {
        self.run_with_logging()
    }

    fn logs(&self) -> Vec<String> {
        LinkStateEngine::logs(self)
    }

    fn events(&self) -> Vec<ProtocolEvent> {
        LinkStateEngine::events(self)
    }

    fn routing_table(&self, node: &str) -> RoutingTable {
        LinkStateEngine::routing_table(self, node)
    }

    fn routing_tables(&self) -> IndexMap<NodeId, RoutingTable> {
        LinkStateEngine::routing_tables(self)
    }

    fn converged_iteration(&self) -> Option<u32> {
        LinkStateEngine::converged_iteration(self)
    }
}
