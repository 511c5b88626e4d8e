use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::network::{
    edge::EdgeId,
    node::NodeId,
    routing_table::{Cost, format_cost},
};

/// Discriminant of a `ProtocolEvent`, handy for filtering and counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    IterationStart,
    IterationEnd,
    MessageSend,
    TableUpdate,
    Converged,
    Info,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::IterationStart => "ITERATION_START",
            EventKind::IterationEnd => "ITERATION_END",
            EventKind::MessageSend => "MESSAGE_SEND",
            EventKind::TableUpdate => "TABLE_UPDATE",
            EventKind::Converged => "CONVERGED",
            EventKind::Info => "INFO",
        };
        write!(f, "{name}")
    }
}

/// One step of a simulation run, as recorded by an engine and replayed by the player.
///
/// Each variant only carries the fields that mean something for it. Events are plain
/// values: an engine builds them once and hands out clones, nothing mutates them
/// afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProtocolEvent {
    IterationStart {
        iteration: u32,
        message: String,
    },
    IterationEnd {
        iteration: u32,
        message: String,
    },
    /// A routing message travelling from `source` to `target`.
    /// Link-state floods have no single target.
    MessageSend {
        source: NodeId,
        target: Option<NodeId>,
        edge: Option<EdgeId>,
        iteration: u32,
        message: String,
    },
    /// `node` changed its route towards `destination`.
    /// `old_cost` is `None` when the destination was previously unreachable.
    TableUpdate {
        node: NodeId,
        destination: NodeId,
        next_hop: NodeId,
        old_cost: Option<Cost>,
        new_cost: Cost,
        edge: Option<EdgeId>,
        iteration: u32,
        message: String,
    },
    Converged {
        iteration: u32,
        message: String,
    },
    Info {
        message: String,
    },
}

impl ProtocolEvent {
    pub fn iteration_start(iteration: u32) -> Self {
        Self::IterationStart {
            iteration,
            message: format!("Iteration {iteration} start"),
        }
    }

    pub fn iteration_end(iteration: u32) -> Self {
        Self::IterationEnd {
            iteration,
            message: format!("Iteration {iteration} end"),
        }
    }

    pub fn converged(iteration: u32) -> Self {
        Self::Converged {
            iteration,
            message: format!("Converged at iteration {iteration}"),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::Info {
            message: message.into(),
        }
    }

    pub fn message_send(
        source: NodeId,
        target: Option<NodeId>,
        edge: Option<EdgeId>,
        iteration: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::MessageSend {
            source,
            target,
            edge,
            iteration,
            message: message.into(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn table_update(
        node: NodeId,
        destination: NodeId,
        next_hop: NodeId,
        old_cost: Option<Cost>,
        new_cost: Cost,
        edge: Option<EdgeId>,
        iteration: u32,
        message: impl Into<String>,
    ) -> Self {
        Self::TableUpdate {
            node,
            destination,
            next_hop,
            old_cost,
            new_cost,
            edge,
            iteration,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> EventKind {
        match self {
            Self::IterationStart { .. } => EventKind::IterationStart,
            Self::IterationEnd { .. } => EventKind::IterationEnd,
            Self::MessageSend { .. } => EventKind::MessageSend,
            Self::TableUpdate { .. } => EventKind::TableUpdate,
            Self::Converged { .. } => EventKind::Converged,
            Self::Info { .. } => EventKind::Info,
        }
    }

    /// Iteration the event belongs to, 0 for informational events.
    pub fn iteration(&self) -> u32 {
        match self {
            Self::IterationStart { iteration, .. }
            | Self::IterationEnd { iteration, .. }
            | Self::MessageSend { iteration, .. }
            | Self::TableUpdate { iteration, .. }
            | Self::Converged { iteration, .. } => *iteration,
            Self::Info { .. } => 0,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::IterationStart { message, .. }
            | Self::IterationEnd { message, .. }
            | Self::MessageSend { message, .. }
            | Self::TableUpdate { message, .. }
            | Self::Converged { message, .. }
            | Self::Info { message } => message,
        }
    }

    /// Edge to highlight when rendering the event, if any.
    pub fn edge(&self) -> Option<&EdgeId> {
        match self {
            Self::MessageSend { edge, .. } | Self::TableUpdate { edge, .. } => edge.as_ref(),
            _ => None,
        }
    }

    /// Router whose state the event is about: the sender of a message or the owner of
    /// an updated table.
    pub fn node(&self) -> Option<&NodeId> {
        match self {
            Self::MessageSend { source, .. } => Some(source),
            Self::TableUpdate { node, .. } => Some(node),
            _ => None,
        }
    }
}

impl Display for ProtocolEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn or_dash<T: Display>(value: Option<&T>) -> String {
            value.map(ToString::to_string).unwrap_or_else(|| "-".to_string())
        }

        match self {
            Self::MessageSend {
                source,
                target,
                edge,
                iteration,
                message,
            } => write!(
                f,
                "[MSG] {} -> {} (edge={}) iter={} {}",
                source,
                or_dash(target.as_ref()),
                or_dash(edge.as_ref()),
                iteration,
                message
            ),
            Self::TableUpdate {
                node,
                destination,
                next_hop,
                old_cost,
                new_cost,
                iteration,
                message,
                ..
            } => write!(
                f,
                "[UPDATE] {}: dest={} via={} old={} new={} iter={} {}",
                node,
                destination,
                next_hop,
                old_cost.map(format_cost).unwrap_or_else(|| "?".to_string()),
                format_cost(*new_cost),
                iteration,
                message
            ),
            other => write!(f, "[{}] {}", other.kind(), other.message()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind_and_iteration() {
        assert_eq!(ProtocolEvent::iteration_start(3).kind(), EventKind::IterationStart);
        assert_eq!(ProtocolEvent::iteration_end(3).iteration(), 3);
        assert_eq!(ProtocolEvent::converged(5).message(), "Converged at iteration 5");
        assert_eq!(ProtocolEvent::info("hello").iteration(), 0);
    }

    #[test]
    fn test_display_matches_trace_format() {
        let msg = ProtocolEvent::message_send(
            "B".into(),
            Some("A".into()),
            Some("e1".into()),
            1,
            "Routing vector from B to A",
        );
        assert_eq!(
            msg.to_string(),
            "[MSG] B -> A (edge=e1) iter=1 Routing vector from B to A"
        );

        let flood = ProtocolEvent::message_send("A".into(), None, None, 2, "LSA flood from A");
        assert_eq!(flood.to_string(), "[MSG] A -> - (edge=-) iter=2 LSA flood from A");

        let update = ProtocolEvent::table_update(
            "A".into(),
            "D".into(),
            "B".into(),
            None,
            6,
            Some("e1".into()),
            2,
            "A updated: D via B (INF -> 6)",
        );
        assert_eq!(
            update.to_string(),
            "[UPDATE] A: dest=D via=B old=? new=6 iter=2 A updated: D via B (INF -> 6)"
        );
        assert_eq!(update.edge(), Some(&EdgeId::from("e1")));
        assert_eq!(update.node(), Some(&NodeId::from("A")));

        assert_eq!(
            ProtocolEvent::iteration_start(1).to_string(),
            "[ITERATION_START] Iteration 1 start"
        );
    }

    #[test]
    fn test_serialized_form_is_tagged_by_kind() {
        let event = ProtocolEvent::table_update(
            "A".into(),
            "C".into(),
            "B".into(),
            Some(7),
            4,
            Some("e1".into()),
            1,
            "A updated: C via B (7 -> 4)",
        );
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], "TABLE_UPDATE");
        assert_eq!(value["old_cost"], 7);
        assert_eq!(value["next_hop"], "B");

        let back: ProtocolEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back, event);
    }
}
