use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::{
    network::{
        node::NodeId,
        routing_table::{
            Cost, INFINITY, RoutingTable, RoutingTableEntry, add_costs, format_cost, initial_table,
        },
        topology::{Adjacency, Topology},
    },
    protocol::{
        engine::{Algorithm, RoutingEngine},
        event::ProtocolEvent,
        record::RunRecord,
    },
};

/// Iteration bound used when the caller has no preference.
pub const DEFAULT_MAX_ITERATIONS: u32 = 50;

/// Synchronous distance-vector (Bellman-Ford) simulation.
///
/// Every round, each router receives the cost vectors its up-neighbors held at the
/// start of the round and keeps any strictly cheaper route. Rounds repeat until one
/// changes nothing or the iteration bound is hit.
pub struct DistanceVectorEngine<'a> {
    topology: &'a Topology,
    adjacency: Adjacency,
    tables: IndexMap<NodeId, RoutingTable>,
    record: RunRecord,
    converged_iteration: Option<u32>,
}

impl<'a> DistanceVectorEngine<'a> {
    pub fn new(topology: &'a Topology) -> Self {
        Self {
            topology,
            adjacency: Adjacency::new(),
            tables: IndexMap::new(),
            record: RunRecord::default(),
            converged_iteration: None,
        }
    }

    /// Runs the protocol from scratch. Returns true if a round without changes
    /// happened within `max_iterations` rounds.
    pub fn run_with_logging(&mut self, max_iterations: u32) -> bool {
        self.initialize();

        for iteration in 1..=max_iterations {
            self.record.log(format!("Iteration {iteration} begins."));
            self.record.emit(ProtocolEvent::iteration_start(iteration));

            let updates = self.exchange_round(iteration);

            let outcome = if updates > 0 { "Changes occurred." } else { "No changes." };
            self.record
                .log(format!("Iteration {iteration} ends. {outcome}"));
            self.record.emit(ProtocolEvent::iteration_end(iteration));
            debug!(iteration, updates, "distance vector round finished");

            if updates == 0 {
                self.converged_iteration = Some(iteration);
                self.record
                    .log(format!("Converged after {iteration} iterations."));
                self.record.emit(ProtocolEvent::converged(iteration));
                info!(
                    iterations = iteration,
                    events = self.record.event_count(),
                    "distance vector converged"
                );
                return true;
            }
        }

        self.record.announce(format!(
            "Reached max iterations ({max_iterations}) without full convergence."
        ));
        warn!(max_iterations, "distance vector did not converge");
        false
    }

    /// Resets every table to what a router knows on its own: itself and its up
    /// neighbors. Clears logs and events of any earlier run.
    pub fn initialize(&mut self) {
        self.record.clear();
        self.converged_iteration = None;
        self.adjacency = self.topology.adjacency();

        let nodes: Vec<NodeId> = self.adjacency.keys().cloned().collect();
        self.tables = self
            .adjacency
            .iter()
            .map(|(node, links)| {
                let mut table = initial_table(node, &nodes);
                for link in links {
                    table.insert(
                        link.neighbor.clone(),
                        RoutingTableEntry::new(
                            link.neighbor.clone(),
                            Some(link.neighbor.clone()),
                            link.cost,
                        ),
                    );
                }
                (node.clone(), table)
            })
            .collect();

        self.record.announce("Distance Vector: initialization complete.");
    }

    /// Performs one exchange round and returns how many routes improved.
    ///
    /// Neighbor vectors are read from a snapshot taken before the round, so the
    /// result does not depend on the order routers are visited in.
    pub fn exchange_round(&mut self, iteration: u32) -> usize {
        let snapshot: IndexMap<NodeId, Vec<(NodeId, Cost)>> = self
            .tables
            .iter()
            .map(|(node, table)| {
                let vector = table
                    .values()
                    .filter(|entry| !entry.is_unreachable())
                    .map(|entry| (entry.destination.clone(), entry.cost))
                    .collect();
                (node.clone(), vector)
            })
            .collect();

        let mut updates = 0;
        for (node, links) in &self.adjacency {
            // Each neighbor "sends" its vector to this node
            for link in links {
                self.record.emit(ProtocolEvent::message_send(
                    link.neighbor.clone(),
                    Some(node.clone()),
                    Some(link.edge.clone()),
                    iteration,
                    format!("Routing vector from {} to {}", link.neighbor, node),
                ));
            }

            let Some(table) = self.tables.get_mut(node) else {
                continue;
            };
            for link in links {
                let Some(vector) = snapshot.get(&link.neighbor) else {
                    continue;
                };
                for (destination, neighbor_cost) in vector {
                    let candidate = add_costs(link.cost, *neighbor_cost);
                    let current = table
                        .get(destination)
                        .map(|entry| entry.cost)
                        .unwrap_or(INFINITY);
                    if candidate >= current {
                        continue;
                    }

                    let old_cost = (current < INFINITY).then_some(current);
                    table.insert(
                        destination.clone(),
                        RoutingTableEntry::new(
                            destination.clone(),
                            Some(link.neighbor.clone()),
                            candidate,
                        ),
                    );
                    updates += 1;

                    self.record.log(format!(
                        "Node {}: updated route to {} via {} (cost {} -> {}).",
                        node,
                        destination,
                        link.neighbor,
                        format_cost(current),
                        candidate
                    ));
                    self.record.emit(ProtocolEvent::table_update(
                        node.clone(),
                        destination.clone(),
                        link.neighbor.clone(),
                        old_cost,
                        candidate,
                        Some(link.edge.clone()),
                        iteration,
                        format!(
                            "{} updated: {} via {} ({} -> {})",
                            node,
                            destination,
                            link.neighbor,
                            format_cost(current),
                            candidate
                        ),
                    ));
                }
            }
        }
        updates
    }

    pub fn logs(&self) -> Vec<String> {
        self.record.logs()
    }

    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.record.events()
    }

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

impl RoutingEngine for DistanceVectorEngine<'_> {
    fn algorithm(&self) -> Algorithm {
        Algorithm::DistanceVector
    }

    fn run(&mut self, max_iterations: u32) -> bool {
        self.run_with_logging(max_iterations)
    }

    fn logs(&self) -> Vec<String> {
        DistanceVectorEngine::logs(self)
    }

    fn events(&self) -> Vec<ProtocolEvent> {
        DistanceVectorEngine::events(self)
    }

    fn routing_table(&self, node: &str) -> RoutingTable {
        DistanceVectorEngine::routing_table(self, node)
    }

    fn routing_tables(&self) -> IndexMap<NodeId, RoutingTable> {
        DistanceVectorEngine::routing_tables(self)
    }

    fn converged_iteration(&self) -> Option<u32> {
        DistanceVectorEngine::converged_iteration(self)
    }
}
