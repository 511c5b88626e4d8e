use tracing::trace;

use crate::protocol::event::ProtocolEvent;

/// Log lines and events collected during one engine run.
/// Getters hand out copies so callers can't rewrite what the engine produced.
#[derive(Debug, Clone, Default)]
pub(crate) struct RunRecord {
    logs: Vec<String>,
    events: Vec<ProtocolEvent>,
}

impl RunRecord {
    pub fn clear(&mut self) {
        self.logs.clear();
        self.events.clear();
    }

    pub fn log(&mut self, line: impl Into<String>) {
        let line = line.into();
        trace!(target: "routing_sim::trace", "{line}");
        self.logs.push(line);
    }

    pub fn emit(&mut self, event: ProtocolEvent) {
        self.events.push(event);
    }

    /// Records `text` both as a log line and as an INFO event.
    pub fn announce(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.events.push(ProtocolEvent::info(text.clone()));
        self.log(text);
    }

    pub fn logs(&self) -> Vec<String> {
        self.logs.clone()
    }

    pub fn events(&self) -> Vec<ProtocolEvent> {
        self.events.clone()
    }

    pub fn event_count(&self) -> usize {
        self.events.len()
    }
}
