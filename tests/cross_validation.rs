use std::collections::HashMap;

use petgraph::{algo::dijkstra, stable_graph::EdgeReference, visit::EdgeFiltered};

use routing_sim::{
    network::{
        Edge, INFINITY, NodeId, RoutingTable, Topology,
        generator::{demo_topology, seeded_topology},
    },
    protocol::{
        Algorithm, DEFAULT_MAX_ITERATIONS, DistanceVectorEngine, EventKind, LinkStateEngine,
        ProtocolEvent, compute_routing_tables,
    },
};

/// Shortest-path costs from every node, computed by petgraph over the topology's
/// own graph with down links filtered out.
fn oracle(topology: &Topology) -> HashMap<(String, String), u32> {
    let graph = topology.graph();
    let live = EdgeFiltered::from_fn(graph, |edge: EdgeReference<'_, Edge>| edge.weight().is_up());

    let mut costs = HashMap::new();
    for source in topology.node_ids() {
        let start = topology.node_index(source.as_str()).unwrap();
        for (target, cost) in dijkstra(&live, start, None, |edge| edge.weight().cost()) {
            costs.insert((source.to_string(), graph[target].id.to_string()), cost);
        }
    }
    costs
}

fn assert_costs_match(topology: &Topology, tables: &indexmap::IndexMap<NodeId, RoutingTable>) {
    let expected = oracle(topology);
    for (owner, table) in tables {
        assert_eq!(table.len(), topology.node_count());
        for (destination, entry) in table {
            let key = (owner.to_string(), destination.to_string());
            match expected.get(&key) {
                Some(cost) => assert_eq!(entry.cost, *cost, "{owner} -> {destination}"),
                None => {
                    assert_eq!(entry.cost, INFINITY, "{owner} -> {destination}");
                    assert_eq!(entry.next_hop, None);
                }
            }
        }
    }
}

/// Every next hop must be a neighbor over an up link, and the advertised cost must
/// be that link plus the neighbor's own cost to the destination.
fn assert_next_hops_consistent(topology: &Topology, tables: &indexmap::IndexMap<NodeId, RoutingTable>) {
    for (owner, table) in tables {
        for (destination, entry) in table {
            let Some(next_hop) = &entry.next_hop else {
                continue;
            };
            if destination == owner {
                assert_eq!(next_hop, owner);
                assert_eq!(entry.cost, 0);
                continue;
            }
            let link = topology
                .links(owner.as_str())
                .into_iter()
                .find(|link| &link.neighbor == next_hop)
                .unwrap_or_else(|| panic!("{owner}: next hop {next_hop} is not a live neighbor"));
            let rest = tables[next_hop][destination].cost;
            assert_eq!(entry.cost, link.cost + rest, "{owner} -> {destination} via {next_hop}");
        }
    }
}

#[test]
fn test_engines_agree_with_oracle_on_random_networks() {
    for seed in 0..25 {
        let topology = seeded_topology(seed, 9, 0.25, 12).unwrap();

        let dv = compute_routing_tables(&topology, Algorithm::DistanceVector, DEFAULT_MAX_ITERATIONS);
        let ls = compute_routing_tables(&topology, Algorithm::LinkState, DEFAULT_MAX_ITERATIONS);

        assert_costs_match(&topology, &dv);
        assert_costs_match(&topology, &ls);
        assert_next_hops_consistent(&topology, &dv);
        assert_next_hops_consistent(&topology, &ls);
    }
}

#[test]
fn test_engines_agree_with_failed_links() {
    for seed in 100..110 {
        let mut topology = seeded_topology(seed, 10, 0.3, 8).unwrap();
        let to_fail: Vec<String> = topology
            .edges()
            .step_by(3)
            .map(|edge| edge.id.to_string())
            .collect();
        for id in &to_fail {
            topology.set_edge_up(id, false).unwrap();
        }

        let dv = compute_routing_tables(&topology, Algorithm::DistanceVector, DEFAULT_MAX_ITERATIONS);
        let ls = compute_routing_tables(&topology, Algorithm::LinkState, DEFAULT_MAX_ITERATIONS);
        assert_costs_match(&topology, &dv);
        assert_costs_match(&topology, &ls);
        assert_next_hops_consistent(&topology, &dv);
    }
}

#[test]
fn test_scenario_tables_are_identical() {
    let mut topology = demo_topology().unwrap();
    topology.remove_edge("e5").unwrap();

    let mut dv = DistanceVectorEngine::new(&topology);
    assert!(dv.run_with_logging(DEFAULT_MAX_ITERATIONS));
    let mut ls = LinkStateEngine::new(&topology);
    assert!(ls.run_with_logging());

    let dv_a = dv.routing_table("A");
    assert_eq!(dv_a["D"].cost, 6);
    assert_eq!(dv_a["D"].next_hop, Some("B".into()));
    assert_eq!(dv.routing_tables(), ls.routing_tables());
}

#[test]
fn test_distance_vector_bounds_rounds_by_hop_count() {
    // A line of n routers needs n - 1 rounds to spread, plus the quiet one
    let mut topology = Topology::new();
    let ids: Vec<String> = (0..6).map(|i| format!("N{i}")).collect();
    for id in &ids {
        topology.add_node(id.as_str()).unwrap();
    }
    for pair in ids.windows(2) {
        topology
            .add_edge(format!("{}-{}", pair[0], pair[1]), pair[0].as_str(), pair[1].as_str(), 1)
            .unwrap();
    }

    let mut engine = DistanceVectorEngine::new(&topology);
    assert!(engine.run_with_logging(DEFAULT_MAX_ITERATIONS));
    assert_eq!(engine.converged_iteration(), Some(5));
    assert_eq!(engine.routing_table("N0")["N5"].cost, 5);

    let mut short = DistanceVectorEngine::new(&topology);
    assert!(!short.run_with_logging(4));
    assert!(short.routing_table("N0")["N5"].cost < INFINITY);
}

#[test]
fn test_node_removal_leaves_no_routes_through_it() {
    let mut topology = demo_topology().unwrap();
    topology.remove_node("B").unwrap();

    let tables = compute_routing_tables(&topology, Algorithm::DistanceVector, DEFAULT_MAX_ITERATIONS);
    assert_eq!(tables.len(), 3);
    for table in tables.values() {
        assert!(!table.contains_key("B"));
        assert!(table.values().all(|entry| entry.next_hop.as_ref().is_none_or(|hop| hop != "B")));
    }
    assert_eq!(tables["A"]["D"].cost, 9);
    assert_costs_match(&topology, &tables);
}

#[test]
fn test_event_traces_reference_live_edges_only() {
    let mut topology = seeded_topology(3, 8, 0.4, 5).unwrap();
    topology.set_edge_up("e2", false).unwrap();

    for algorithm in [Algorithm::DistanceVector, Algorithm::LinkState] {
        let mut engine = algorithm.engine(&topology);
        assert_eq!(engine.algorithm(), algorithm);
        engine.run(DEFAULT_MAX_ITERATIONS);
        let events: Vec<ProtocolEvent> = engine.events();

        for event in &events {
            if let Some(edge) = event.edge() {
                let edge = topology.edge(edge.as_str()).unwrap();
                assert!(edge.is_up(), "{}: {event}", engine.algorithm());
            }
        }
        assert_eq!(
            events.iter().filter(|event| event.kind() == EventKind::Converged).count(),
            1
        );
    }
}
