//! Crossfade orchestration
//!
//! Runs at most one crossfade session at a time. A session owns the
//! secondary pipeline; the primary stays owned by the player and is passed
//! in for volume ramping. The orchestrator is driven entirely by explicit
//! `tick(now)` calls, so tests can feed it synthetic clocks.
//!
//! Phases:
//! - Idle: nothing prepared; `maybe_begin_preload` watches the playhead
//! - Preloading: secondary pipeline is loading the next item at volume 0
//! - Blending: both pipelines audible, volumes stepped along a linear ramp
//!
//! When the ramp completes the session dissolves and the orchestrator hands
//! the player a [`HandoffState`] so it can commit the track change on the
//! primary pipeline.

use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::PlaybackError;
use crate::pipeline::{DecodePipeline, PipelineEvent, PipelineFactory, PipelineState};
use crate::types::QueueItem;

/// Number of discrete volume steps in the ramp
pub const RAMP_STEPS: u32 = 30;

/// How long preloading begins before the blend window opens
const PRELOAD_LEAD: Duration = Duration::from_secs(1);

/// How long to wait for the secondary's ready event before blending anyway
const READY_FALLBACK: Duration = Duration::from_secs(1);

/// Current phase of the orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadePhase {
    Idle,
    Preloading,
    Blending,
}

/// What the secondary pipeline was doing when the ramp completed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HandoffState {
    /// Playhead of the secondary at handoff
    pub position: Duration,
    /// Whether the secondary was audibly playing
    pub was_playing: bool,
}

/// Result of one orchestrator tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossfadeUpdate {
    None,
    /// The ramp completed; the player must commit the track change
    Finished(HandoffState),
}

struct Session {
    secondary: Box<dyn DecodePipeline>,
    blending: bool,
    step: u32,
    step_interval: Duration,
    next_step_at: Instant,
    ready_deadline: Instant,
}

/// Coordinates the overlap between the outgoing and incoming tracks
pub struct CrossfadeOrchestrator {
    duration: Duration,
    session: Option<Session>,

    /// Set once a preload has been attempted for the current track, so a
    /// failed or aborted session does not retrigger every position tick
    preload_done: bool,
}

impl CrossfadeOrchestrator {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            session: None,
            preload_done: false,
        }
    }

    /// Configured crossfade length
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Change the crossfade length; zero disables crossfading
    ///
    /// A session already in flight keeps its original timing.
    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    pub fn phase(&self) -> CrossfadePhase {
        match &self.session {
            None => CrossfadePhase::Idle,
            Some(session) if session.blending => CrossfadePhase::Blending,
            Some(_) => CrossfadePhase::Preloading,
        }
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Forget the per-track preload latch (the current item changed)
    pub fn track_changed(&mut self) {
        self.preload_done = false;
    }

    /// Start preloading the next item if the playhead is close enough to the
    /// end of the current one
    ///
    /// Eligibility misses (unknown duration, nothing playing, no next item)
    /// leave the latch unset so a later tick can retry; an actual load
    /// attempt sets it whether or not the load succeeds.
    pub fn maybe_begin_preload(
        &mut self,
        now: Instant,
        position: Duration,
        duration: Option<Duration>,
        playing: bool,
        next_item: Option<&QueueItem>,
        factory: &dyn PipelineFactory,
    ) -> bool {
        if self.duration.is_zero() || self.session.is_some() || self.preload_done {
            return false;
        }
        let Some(total) = duration else {
            return false;
        };
        if !playing {
            return false;
        }
        if total.saturating_sub(position) > self.duration + PRELOAD_LEAD {
            return false;
        }
        let Some(item) = next_item else {
            return false;
        };

        self.preload_done = true;

        let mut secondary = factory.create();
        secondary.set_volume(0.0);
        if let Err(error) = secondary.load(item, false) {
            let error = PlaybackError::CrossfadePreload(error.to_string());
            warn!(%error, "playing through without crossfade");
            return false;
        }

        debug!(location = %item.location, "crossfade preload started");
        self.session = Some(Session {
            secondary,
            blending: false,
            step: 0,
            step_interval: self.duration / RAMP_STEPS,
            next_step_at: now,
            ready_deadline: now + READY_FALLBACK,
        });
        true
    }

    /// Drive the active session forward
    pub fn tick(&mut self, now: Instant, primary: &mut dyn DecodePipeline) -> CrossfadeUpdate {
        let blending = match &self.session {
            Some(session) => session.blending,
            None => return CrossfadeUpdate::None,
        };
        if blending {
            self.tick_blending(now, primary)
        } else {
            self.tick_preloading(now);
            CrossfadeUpdate::None
        }
    }

    /// Tear down the session, if any, and restore the primary volume
    ///
    /// Idempotent; called on any manual track change, stop or clear.
    pub fn abort(&mut self, primary: &mut dyn DecodePipeline) {
        if let Some(mut session) = self.session.take() {
            debug!("aborting crossfade session");
            session.secondary.stop();
            primary.set_volume(1.0);
        }
    }

    fn tick_preloading(&mut self, now: Instant) {
        let mut ready = false;
        let mut failure = None;
        if let Some(session) = self.session.as_mut() {
            for event in session.secondary.poll_events() {
                match event {
                    PipelineEvent::StateChanged {
                        state: PipelineState::Ready,
                    } => ready = true,
                    PipelineEvent::PlaybackFailed { message } => failure = Some(message),
                    _ => {}
                }
            }
        }

        if let Some(message) = failure {
            warn!(%message, "secondary pipeline failed during preload, dropping session");
            if let Some(mut session) = self.session.take() {
                session.secondary.stop();
            }
            return;
        }

        let Some(session) = self.session.as_mut() else {
            return;
        };
        if !ready {
            if now < session.ready_deadline {
                return;
            }
            debug!("secondary never reported ready, starting blend at the deadline");
        }

        session.blending = true;
        session.secondary.set_volume(0.0);
        session.secondary.play();
        session.next_step_at = now + session.step_interval;
    }

    fn tick_blending(&mut self, now: Instant, primary: &mut dyn DecodePipeline) -> CrossfadeUpdate {
        let Some(session) = self.session.as_mut() else {
            return CrossfadeUpdate::None;
        };

        // Catch up on every step whose deadline has passed
        while session.step < RAMP_STEPS && now >= session.next_step_at {
            session.step += 1;
            let t = session.step as f32 / RAMP_STEPS as f32;
            primary.set_volume(1.0 - t);
            session.secondary.set_volume(t);
            session.next_step_at += session.step_interval;
        }

        if session.step < RAMP_STEPS {
            return CrossfadeUpdate::None;
        }

        let Some(mut session) = self.session.take() else {
            return CrossfadeUpdate::None;
        };
        let position = session.secondary.position();
        let was_playing = session.secondary.is_active();
        primary.pause();
        primary.set_volume(1.0);
        session.secondary.stop();

        debug!(?position, was_playing, "crossfade ramp complete, handing off");
        CrossfadeUpdate::Finished(HandoffState {
            position,
            was_playing,
        })
    }
}
