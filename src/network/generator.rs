/*!
Ready-made topologies: the small four-router demo network and seeded random networks
used by the command line tool and by the cross-validation tests.
*/

use rand::{Rng, SeedableRng, rngs::StdRng};
use tracing::debug;

use crate::network::{
    node::Position,
    routing_table::Cost,
    topology::{Topology, TopologyResult},
};

/// The classic A-B-C-D example.
///
/// A-B(1), B-C(3), A-C(7), C-D(2), B-D(10). Best A->D is A-B-C-D at cost 6.
pub fn demo_topology() -> TopologyResult<Topology> {
    let mut topology = Topology::new();
    topology.add_node_at("A", Position::new(120, 120))?;
    topology.add_node_at("B", Position::new(320, 80))?;
    topology.add_node_at("C", Position::new(320, 300))?;
    topology.add_node_at("D", Position::new(520, 220))?;

    topology.add_edge("e1", "A", "B", 1)?;
    topology.add_edge("e2", "B", "C", 3)?;
    topology.add_edge("e3", "A", "C", 7)?;
    topology.add_edge("e4", "C", "D", 2)?;
    topology.add_edge("e5", "B", "D", 10)?;
    Ok(topology)
}

/// Random connected network of `nodes` routers named `R1..Rn`.
///
/// A random spanning tree guarantees connectivity; every other pair is then linked
/// with probability `extra_link_probability`, clamped to `0.0..=1.0` (NaN counts
/// as 0.0). Costs are uniform in `1..=max_cost`.
pub fn random_topology<R: Rng>(
    rng: &mut R,
    nodes: usize,
    extra_link_probability: f64,
    max_cost: Cost,
) -> TopologyResult<Topology> {
    let mut topology = Topology::new();
    let ids: Vec<String> = (1..=nodes).map(|i| format!("R{i}")).collect();
    for id in &ids {
        topology.add_node(id.as_str())?;
    }

    let max_cost = max_cost.max(1);
    let probability = if extra_link_probability.is_nan() {
        0.0
    } else {
        extra_link_probability.clamp(0.0, 1.0)
    };
    let mut next_edge = 1usize;

    for i in 1..ids.len() {
        let parent = rng.random_range(0..i);
        let cost = rng.random_range(1..=max_cost);
        topology.add_edge(format!("e{next_edge}"), ids[parent].as_str(), ids[i].as_str(), cost)?;
        next_edge += 1;
    }

    for i in 0..ids.len() {
        for j in (i + 1)..ids.len() {
            if topology.find_edge_between(&ids[i], &ids[j]).is_some() {
                continue;
            }
            if rng.random_bool(probability) {
                let cost = rng.random_range(1..=max_cost);
                topology.add_edge(format!("e{next_edge}"), ids[i].as_str(), ids[j].as_str(), cost)?;
                next_edge += 1;
            }
        }
    }

    debug!(
        nodes = topology.node_count(),
        edges = topology.edge_count(),
        "random topology generated"
    );
    Ok(topology)
}

/// Same as `random_topology`, reproducible from `seed`.
pub fn seeded_topology(
    seed: u64,
    nodes: usize,
    extra_link_probability: f64,
    max_cost: Cost,
) -> TopologyResult<Topology> {
    let mut rng = StdRng::seed_from_u64(seed);
    random_topology(&mut rng, nodes, extra_link_probability, max_cost)
}
