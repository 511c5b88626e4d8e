/*!
Timed replay of a recorded protocol trace.

- `player`: `EventPlayer`, the poll-driven scheduler with transport controls.
- `listener`: the `PlaybackListener` callback trait.
- `driver`: async loops that run a player on a tokio task.
*/

pub mod driver;
pub mod listener;
pub mod player;

pub use driver::{PlaybackCommand, drive, play_to_end};
pub use listener::{ListenerError, PlaybackListener};
pub use player::{DEFAULT_DELAY, EventPlayer, MIN_DELAY, PlaybackState};
