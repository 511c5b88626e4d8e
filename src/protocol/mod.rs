/*
 * This module contains the routing protocol engines and the event model they emit.
 *
 * Structure:
 * - `distance_vector`: synchronous round-based Bellman-Ford exchange.
 * - `link_state`: per-source Dijkstra with one table update per finalized node.
 * - `engine`: the `RoutingEngine` trait and the `Algorithm` selector.
 * - `event`: `ProtocolEvent`, the replayable trace record.
 * - `simulation`: one-shot runs, reports and background execution.
 */

pub mod distance_vector;
pub mod engine;
pub mod event;
pub mod link_state;
mod record;
pub mod simulation;

pub use distance_vector::{DEFAULT_MAX_ITERATIONS, DistanceVectorEngine};
pub use engine::{Algorithm, RoutingEngine};
pub use event::{EventKind, ProtocolEvent};
pub use link_state::LinkStateEngine;
pub use simulation::{
    SimulationReport, compute_routing_tables, render_table, simulate, spawn_simulation,
};
