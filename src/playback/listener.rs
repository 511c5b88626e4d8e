use crate::protocol::event::ProtocolEvent;

pub type ListenerError = Box<dyn std::error::Error + Send + Sync>;

/// Receiver of replayed events.
///
/// Errors and panics raised here are caught by the player and logged, playback
/// carries on with the next event.
pub trait PlaybackListener {
    /// `index` is the 0-based position of `event`, `total` the length of the trace.
    fn on_event(&mut self, event: &ProtocolEvent, index: usize, total: usize) -> Result<(), ListenerError>;

    /// Playback reached the end of the trace.
    fn on_finished(&mut self) {}
}
