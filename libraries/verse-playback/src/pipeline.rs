//! Decode pipeline abstraction
//!
//! The player never touches codecs or devices directly. The platform layer
//! implements [`DecodePipeline`] over its decoder of choice and hands the
//! player a [`PipelineFactory`] so the crossfade orchestrator can spin up a
//! second pipeline on demand.

use std::time::Duration;

use crate::error::Result;
use crate::types::QueueItem;

/// Lifecycle state reported by a pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// No source loaded
    Idle,
    /// Opening/buffering a source
    Loading,
    /// Loaded and ready to start
    Ready,
    /// Decoding and producing audio
    Playing,
    /// Loaded, clock stopped
    Paused,
    /// Reached the end of the source
    Ended,
    /// Unrecoverable failure
    Failed,
}

/// Events a pipeline reports back to the player
///
/// Pipelines queue these internally; the player drains them on every
/// [`poll_events`](DecodePipeline::poll_events) call from its tick.
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Lifecycle state changed
    StateChanged { state: PipelineState },
    /// Periodic position report while playing
    SecondsElapsed { position: Duration },
    /// Source duration became known or was refined
    DurationUpdated { duration: Duration },
    /// A previously requested seek landed
    SeekCompleted { position: Duration },
    /// The source failed to open or decode
    PlaybackFailed { message: String },
    /// The source played through to its natural end
    PlayedToEnd,
    /// Decoding broke partway through the source
    FailedToEnd { message: String },
}

/// One decode-to-output pipeline
///
/// Commands are non-blocking; completion and failures come back through
/// [`poll_events`](Self::poll_events). Implementations must be `Send` so a
/// pipeline can be created on one thread and driven from another, but all
/// calls on a single pipeline happen from the control domain.
pub trait DecodePipeline: Send {
    /// Load a source, optionally starting playback as soon as it is ready
    ///
    /// Returns an error only for failures detectable up front; asynchronous
    /// failures surface as [`PipelineEvent::PlaybackFailed`].
    fn load(&mut self, item: &QueueItem, play_when_ready: bool) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self);

    /// Pause playback, keeping the source loaded
    fn pause(&mut self);

    /// Stop playback and release the source
    fn stop(&mut self);

    /// Request a seek; completion arrives as [`PipelineEvent::SeekCompleted`]
    fn seek(&mut self, position: Duration);

    /// Set the output volume in [0.0, 1.0]
    fn set_volume(&mut self, volume: f32);

    /// Set the playback rate (1.0 = normal speed)
    fn set_rate(&mut self, rate: f32);

    /// Current playback position
    fn position(&self) -> Duration;

    /// Total source duration, if known
    fn duration(&self) -> Option<Duration>;

    /// How far ahead of the playhead data is buffered
    fn buffered_position(&self) -> Duration;

    /// Whether the pipeline is audibly playing right now
    fn is_active(&self) -> bool;

    /// Current lifecycle state
    fn state(&self) -> PipelineState;

    /// Drain pending events in the order they occurred
    fn poll_events(&mut self) -> Vec<PipelineEvent>;
}

/// Creates pipelines on demand
///
/// The player uses this once at startup for the primary pipeline and again
/// whenever a crossfade needs a secondary one.
pub trait PipelineFactory: Send {
    fn create(&self) -> Box<dyn DecodePipeline>;
}
