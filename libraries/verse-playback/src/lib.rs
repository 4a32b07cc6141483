//! Platform-agnostic playback engine for Verse Player
//!
//! Coordinates an ordered queue, gapless crossfades between two decode
//! pipelines and a 10-band equalizer. The crate contains no codec or device
//! code; the platform implements [`DecodePipeline`] and [`PipelineFactory`]
//! over its decoder and drives the player from its run loop.
//!
//! # Architecture
//!
//! - [`Player`]: single entry point, owns everything below
//! - [`QueueManager`]: item list and current index bookkeeping
//! - [`CrossfadeOrchestrator`]: preloads the next item into a secondary
//!   pipeline and ramps volumes across the transition
//! - [`verse_dsp`]: equalizer controller and the real-time filter cascade
//!
//! All timed behavior runs through [`Player::tick`]; the engine never
//! spawns threads or sleeps on its own.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Instant;
//! use verse_playback::{Player, PlayerConfig, QueueItem};
//! # fn factory() -> Box<dyn verse_playback::PipelineFactory> { unimplemented!() }
//!
//! let mut player = Player::new(PlayerConfig::default(), factory());
//! player.add(vec![
//!     QueueItem::file("/music/one.flac"),
//!     QueueItem::file("/music/two.flac"),
//! ]);
//! player.play()?;
//!
//! // From the run loop:
//! player.tick(Instant::now());
//! for event in player.drain_events() {
//!     println!("{event:?}");
//! }
//! # Ok::<(), verse_playback::PlaybackError>(())
//! ```

mod crossfade;
mod error;
mod events;
mod pipeline;
mod player;
mod queue;
mod types;

pub use crossfade::{CrossfadeOrchestrator, CrossfadePhase, CrossfadeUpdate, HandoffState, RAMP_STEPS};
pub use error::{PlaybackError, Result};
pub use events::{EndReason, PlayerEvent};
pub use pipeline::{DecodePipeline, PipelineEvent, PipelineFactory, PipelineState};
pub use player::Player;
pub use queue::{CurrentItemChange, QueueChange, QueueManager};
pub use types::{ItemOptions, PlaybackState, PlayerConfig, QueueItem, RepeatMode, SourceKind};

// Re-exported so embedders only need one playback dependency
pub use verse_dsp;
