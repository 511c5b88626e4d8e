use std::{
    any::Any,
    panic::{AssertUnwindSafe, catch_unwind},
    time::Duration,
};

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::{
    playback::{driver::PlaybackCommand, listener::PlaybackListener},
    protocol::event::ProtocolEvent,
};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(400);
pub const MIN_DELAY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

/// Replays a fixed event trace to a listener, one event per tick.
///
/// The player owns no timer. Whoever drives it calls `poll` and it dispatches
/// when the next deadline has passed; see `driver::drive` for an async loop that
/// does exactly that. Everything happens on the caller's thread.
pub struct EventPlayer<L> {
    events: Vec<ProtocolEvent>,
    listener: L,
    cursor: usize,
    delay: Duration,
    state: PlaybackState,
    next_tick: Option<Instant>,
}

impl<L: PlaybackListener> EventPlayer<L> {
    pub fn new(events: Vec<ProtocolEvent>, listener: L) -> Self {
        Self {
            events,
            listener,
            cursor: 0,
            delay: DEFAULT_DELAY,
            state: PlaybackState::Stopped,
            next_tick: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay.max(MIN_DELAY);
        self
    }

    /// Starts or resumes playback. An empty trace finishes right away.
    pub fn play(&mut self) {
        self.play_at(Instant::now());
    }

    pub fn play_at(&mut self, now: Instant) {
        if self.events.is_empty() {
            self.notify_finished();
            return;
        }
        if self.state == PlaybackState::Playing {
            return;
        }
        debug!(cursor = self.cursor, total = self.events.len(), "playback started");
        self.state = PlaybackState::Playing;
        self.next_tick = Some(now + self.delay);
    }

    /// Stops the clock and leaves the cursor where it is. Always ends Paused,
    /// whatever the previous state.
    pub fn pause(&mut self) {
        self.state = PlaybackState::Paused;
        self.next_tick = None;
    }

    /// Dispatches the next event immediately, pausing playback first.
    /// At the end of the trace this signals `on_finished` instead.
    pub fn step_forward(&mut self) {
        self.pause();
        self.tick();
    }

    /// Back to the first event, stopped.
    pub fn reset(&mut self) {
        self.pause();
        self.cursor = 0;
        self.state = PlaybackState::Stopped;
    }

    /// Alias of `reset`.
    pub fn stop(&mut self) {
        self.reset();
    }

    /// Changes the interval between events, never below `MIN_DELAY`.
    /// While playing, the next event is due one new interval from now.
    pub fn set_delay(&mut self, delay: Duration) {
        self.set_delay_at(delay, Instant::now());
    }

    pub fn set_delay_at(&mut self, delay: Duration, now: Instant) {
        self.delay = delay.max(MIN_DELAY);
        if self.state == PlaybackState::Playing {
            self.next_tick = Some(now + self.delay);
        }
    }

    /// Dispatches at most one event if its deadline has passed.
    /// Returns whether a tick happened.
    pub fn poll(&mut self) -> bool {
        self.poll_at(Instant::now())
    }

    pub fn poll_at(&mut self, now: Instant) -> bool {
        match self.next_tick {
            Some(deadline) if self.state == PlaybackState::Playing && deadline <= now => {
                self.tick();
                if self.state == PlaybackState::Playing {
                    self.next_tick = Some(now + self.delay);
                }
                true
            }
            _ => false,
        }
    }

    pub fn apply(&mut self, command: PlaybackCommand) {
        match command {
            PlaybackCommand::Play => self.play(),
            PlaybackCommand::Pause | PlaybackCommand::Shutdown => self.pause(),
            PlaybackCommand::StepForward => self.step_forward(),
            PlaybackCommand::Reset => self.reset(),
            PlaybackCommand::SetDelay(delay) => self.set_delay(delay),
        }
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// Index of the next event to dispatch.
    pub fn current_index(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// When the next tick is due, `None` unless playing.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_tick
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    fn tick(&mut self) {
        let total = self.events.len();
        let Some(event) = self.events.get(self.cursor) else {
            if self.state == PlaybackState::Playing {
                self.state = PlaybackState::Paused;
            }
            self.next_tick = None;
            debug!(total, "playback finished");
            self.notify_finished();
            return;
        };

        let index = self.cursor;
        let listener = &mut self.listener;
        match catch_unwind(AssertUnwindSafe(|| listener.on_event(event, index, total))) {
            Ok(Ok(())) => {}
            Ok(Err(error)) => warn!(index, %error, "playback listener failed"),
            Err(payload) => warn!(index, panic = panic_message(&*payload), "playback listener panicked"),
        }
        self.cursor += 1;
    }

    fn notify_finished(&mut self) {
        let listener = &mut self.listener;
        if let Err(payload) = catch_unwind(AssertUnwindSafe(|| listener.on_finished())) {
            warn!(panic = panic_message(&*payload), "playback listener panicked on finish");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}
