use indexmap::IndexMap;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::info;

use crate::{
    network::{node::NodeId, routing_table::RoutingTable, topology::Topology},
    protocol::{engine::Algorithm, event::ProtocolEvent},
};

/// Everything a finished run produced, detached from the topology it ran on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub algorithm: Algorithm,
    pub converged: bool,
    pub converged_iteration: Option<u32>,
    pub tables: IndexMap<NodeId, RoutingTable>,
    pub events: Vec<ProtocolEvent>,
    pub logs: Vec<String>,
}

impl SimulationReport {
    pub fn routing_table(&self, node: &str) -> Option<&RoutingTable> {
        self.tables.get(node)
    }

    /// Plain-text rendering of every table, one block per router.
    pub fn render_tables(&self) -> String {
        self.tables
            .iter()
            .map(|(node, table)| render_table(node, table))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Renders `table` as a `Destination / Next Hop / Cost` block headed by its owner.
pub fn render_table(owner: &NodeId, table: &RoutingTable) -> String {
    let mut out = format!("Router {owner}\n");
    out.push_str(&format!("  {:<12} {:<12} {:>10}\n", "Destination", "Next Hop", "Cost"));
    for entry in table.values() {
        let next_hop = entry
            .next_hop
            .as_ref()
            .map(NodeId::as_str)
            .unwrap_or("-");
        out.push_str(&format!(
            "  {:<12} {:<12} {:>10}\n",
            entry.destination.as_str(),
            next_hop,
            entry.cost_label()
        ));
    }
    out
}

/// Runs `algorithm` over `topology` to completion.
pub fn simulate(topology: &Topology, algorithm: Algorithm, max_iterations: u32) -> SimulationReport {
    let mut engine = algorithm.engine(topology);
    let converged = engine.run(max_iterations);
    let report = SimulationReport {
        algorithm,
        converged,
        converged_iteration: engine.converged_iteration(),
        tables: engine.routing_tables(),
        events: engine.events(),
        logs: engine.logs(),
    };
    info!(
        %algorithm,
        converged,
        events = report.events.len(),
        "simulation finished"
    );
    report
}

/// Final tables of every node, without keeping the trace around.
pub fn compute_routing_tables(
    topology: &Topology,
    algorithm: Algorithm,
    max_iterations: u32,
) -> IndexMap<NodeId, RoutingTable> {
    let mut engine = algorithm.engine(topology);
    engine.run(max_iterations);
    engine.routing_tables()
}

/// Runs the simulation on tokio's blocking pool. The topology is moved in so the
/// caller can keep editing its own copy meanwhile.
///
/// Must be called from within a tokio runtime.
pub fn spawn_simulation(
    topology: Topology,
    algorithm: Algorithm,
    max_iterations: u32,
) -> JoinHandle<SimulationReport> {
    tokio::task::spawn_blocking(move || simulate(&topology, algorithm, max_iterations))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::generator::demo_topology;

    #[test]
    fn test_report_matches_engine() {
        let topology = demo_topology().unwrap();
        let report = simulate(&topology, Algorithm::DistanceVector, 50);

        assert_eq!(report.algorithm, Algorithm::DistanceVector);
        assert!(report.converged);
        assert!(report.converged_iteration.is_some());
        assert_eq!(report.tables.len(), 4);
        assert_eq!(report.routing_table("A").unwrap()["D"].cost, 6);
        assert!(report.routing_table("Z").is_none());
        assert_eq!(report.logs[0], "Distance Vector: initialization complete.");
    }

    #[test]
    fn test_render_table() {
        let mut topology = Topology::new();
        topology.add_node("A").unwrap();
        topology.add_node("B").unwrap();
        topology.add_node("C").unwrap();
        topology.add_edge("e1", "A", "B", 2).unwrap();
        let report = simulate(&topology, Algorithm::LinkState, 50);

        let rendered = render_table(&"A".into(), report.routing_table("A").unwrap());
        let lines: Vec<&str> = rendered.lines().map(str::trim_end).collect();
        assert_eq!(lines[0], "Router A");
        assert_eq!(lines[1].split_whitespace().collect::<Vec<_>>(), ["Destination", "Next", "Hop", "Cost"]);
        assert_eq!(lines[2].split_whitespace().collect::<Vec<_>>(), ["A", "A", "0"]);
        assert_eq!(lines[3].split_whitespace().collect::<Vec<_>>(), ["B", "B", "2"]);
        assert_eq!(lines[4].split_whitespace().collect::<Vec<_>>(), ["C", "-", "INF"]);
        assert_eq!(report.render_tables().matches("Router ").count(), 3);
    }

    #[test]
    fn test_both_algorithms_agree_on_demo() {
        let topology = demo_topology().unwrap();
        let dv = compute_routing_tables(&topology, Algorithm::DistanceVector, 50);
        let ls = compute_routing_tables(&topology, Algorithm::LinkState, 50);
        assert_eq!(dv, ls);
    }

    #[test]
    fn test_report_serializes() {
        let topology = demo_topology().unwrap();
        let report = simulate(&topology, Algorithm::LinkState, 0);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["algorithm"], "link-state");
        assert_eq!(value["converged_iteration"], 1);
        assert_eq!(value["tables"]["A"]["D"]["cost"], 6);
        assert_eq!(value["events"][0]["kind"], "INFO");
    }

    #[tokio::test]
    async fn test_spawned_simulation() {
        let mut topology = demo_topology().unwrap();
        let handle = spawn_simulation(topology.clone(), Algorithm::LinkState, 50);
        // Editing the local copy doesn't affect the running simulation
        topology.remove_node("D").unwrap();

        let report = handle.await.unwrap();
        assert_eq!(report.tables.len(), 4);
        assert_eq!(report.routing_table("B").unwrap()["D"].next_hop, Some("C".into()));
    }
}
