use std::time::Duration;

use tokio::{sync::mpsc, time::Instant};
use tracing::debug;

use crate::playback::{listener::PlaybackListener, player::EventPlayer};

/// Transport controls accepted by `drive`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackCommand {
    Play,
    Pause,
    StepForward,
    Reset,
    SetDelay(Duration),
    Shutdown,
}

/// Drives `player` from the current task until `Shutdown` arrives or every sender
/// is dropped, then hands the player back.
///
/// Commands and ticks are handled one at a time, so a pause or reset always lands
/// between two events.
pub async fn drive<L: PlaybackListener>(
    mut player: EventPlayer<L>,
    mut commands: mpsc::UnboundedReceiver<PlaybackCommand>,
) -> EventPlayer<L> {
    loop {
        let deadline = player.next_deadline();
        tokio::select! {
            command = commands.recv() => {
                match command {
                    Some(PlaybackCommand::Shutdown) | None => {
                        if player.is_playing() {
                            player.pause();
                        }
                        debug!(cursor = player.current_index(), "playback driver shutting down");
                        return player;
                    }
                    Some(command) => player.apply(command),
                }
            }

            _ = wait_for(deadline) => {
                player.poll();
            }
        }
    }
}

/// Plays the whole trace at the player's pace and returns once it has finished.
pub async fn play_to_end<L: PlaybackListener>(mut player: EventPlayer<L>) -> EventPlayer<L> {
    player.play();
    while player.is_playing() {
        wait_for(player.next_deadline()).await;
        player.poll();
    }
    player
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
