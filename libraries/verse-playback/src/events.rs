//! Player events
//!
//! The player accumulates events during command handling and ticks; the
//! embedder drains them with [`crate::Player::drain_events`] and forwards
//! them to its UI or IPC layer.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::{PlaybackState, QueueItem};

/// Why an item's playback ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndReason {
    /// The item reached its natural end
    PlayedUntilEnd,
    /// The user skipped forward
    SkippedToNext,
    /// The user skipped backward
    SkippedToPrevious,
    /// The user jumped to an arbitrary index
    JumpedToIndex,
    /// Playback was stopped explicitly
    Stopped,
    /// The queue was cleared or the current item replaced
    Cleared,
    /// The pipeline reported a failure
    Failed,
}

/// Events emitted by the player
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum PlayerEvent {
    /// The current queue item changed
    ///
    /// `last_position` is the playhead of the previous item at the moment of
    /// the change, so embedders can persist resume points.
    CurrentItemChanged {
        item: Option<QueueItem>,
        index: Option<usize>,
        previous_item: Option<QueueItem>,
        previous_index: Option<usize>,
        last_position: Duration,
    },

    /// An item's playback ended, with the cause
    PlaybackEnded { reason: EndReason },

    /// Player-level state changed
    StateChanged { state: PlaybackState },

    /// Periodic position report while playing
    SecondsElapsed {
        position: Duration,
        duration: Option<Duration>,
    },

    /// A requested seek landed
    SeekCompleted { position: Duration },

    /// A pipeline failure or other recoverable error
    Error { message: String },
}
