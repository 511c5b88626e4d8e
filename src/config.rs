/*!
Scenario configuration: which protocol to run, how long to let it iterate, the
playback pace and the network to run it on. Read from JSON files such as

```json
{
  "algorithm": "dv",
  "max_iterations": 50,
  "delay": "250ms",
  "topology": {
    "nodes": [{ "id": "A", "x": 120, "y": 120 }, { "id": "B" }],
    "edges": [{ "id": "e1", "from": "A", "to": "B", "cost": 1, "isUp": true }]
  }
}
```
*/

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::{
    network::{
        generator::demo_topology,
        node::{NodeId, Position},
        routing_table::{Cost, INFINITY},
        topology::{Topology, TopologyError},
    },
    playback::player::DEFAULT_DELAY,
    protocol::{distance_vector::DEFAULT_MAX_ITERATIONS, engine::Algorithm},
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid topology: {0}")]
    Topology(#[from] TopologyError),
    #[error("Invalid delay {value:?}: {source}")]
    InvalidDelay {
        value: String,
        #[source]
        source: humantime::DurationError,
    },
}

/// Parses a human-readable duration such as `"250ms"` or `"1s 500ms"`.
pub fn parse_delay(value: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(value.trim()).map_err(|source| ConfigError::InvalidDelay {
        value: value.to_string(),
        source,
    })
}

mod delay_format {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&humantime::format_duration(*delay).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let value = String::deserialize(deserializer)?;
        super::parse_delay(&value).map_err(D::Error::custom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub algorithm: Algorithm,
    pub max_iterations: u32,
    #[serde(with = "delay_format")]
    pub delay: Duration,
    pub topology: Option<TopologySpec>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::DistanceVector,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            delay: DEFAULT_DELAY,
            topology: None,
        }
    }
}

impl SimulationConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json(&json)?;
        debug!(path = %path.display(), algorithm = %config.algorithm, "configuration loaded");
        Ok(config)
    }

    /// The configured network, or the built-in demo network if none is given.
    pub fn build_topology(&self) -> Result<Topology, ConfigError> {
        match &self.topology {
            Some(spec) => Ok(Topology::try_from(spec)?),
            None => Ok(demo_topology()?),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopologySpec {
    #[serde(default)]
    pub nodes: Vec<NodeSpec>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub id: String,
    pub from: String,
    pub to: String,
    /// Signed so that zero and negative costs reach validation instead of failing
    /// to parse.
    pub cost: i64,
    #[serde(default = "default_up", alias = "isUp")]
    pub up: bool,
}

fn default_up() -> bool {
    true
}

impl TryFrom<&TopologySpec> for Topology {
    type Error = TopologyError;

    fn try_from(spec: &TopologySpec) -> Result<Self, Self::Error> {
        let mut topology = Topology::new();
        for node in &spec.nodes {
            let position = match (node.x, node.y) {
                (Some(x), Some(y)) => Some(Position::new(x, y)),
                _ => None,
            };
            topology.add_node_with(NodeId::from(node.id.as_str()), position)?;
        }
        for edge in &spec.edges {
            let cost = Cost::try_from(edge.cost)
                .ok()
                .filter(|cost| (1..INFINITY).contains(cost))
                .ok_or_else(|| TopologyError::InvalidCost {
                    edge: edge.id.as_str().into(),
                    cost: edge.cost,
                    max: INFINITY,
                })?;
            topology.add_edge(edge.id.as_str(), edge.from.as_str(), edge.to.as_str(), cost)?;
            if !edge.up {
                topology.set_edge_up(&edge.id, false)?;
            }
        }
        Ok(topology)
    }
}
