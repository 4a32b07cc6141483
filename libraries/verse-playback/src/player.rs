//! Playback coordination
//!
//! [`Player`] owns the queue, the crossfade orchestrator, the equalizer
//! controller and the primary decode pipeline. All methods take `&mut self`;
//! embedders that drive it from several threads wrap it in `Arc<Mutex<..>>`.
//!
//! Nothing here blocks or sleeps. Timed behavior (deferred replay, the
//! crossfade ramp) is driven by the embedder calling [`Player::tick`] with
//! the current instant, typically from its run loop.

use std::time::{Duration, Instant};

use tracing::{debug, warn};
use verse_dsp::{EqHandle, Equalizer};

use crate::crossfade::{CrossfadeOrchestrator, CrossfadePhase, CrossfadeUpdate, HandoffState};
use crate::error::{PlaybackError, Result};
use crate::events::{EndReason, PlayerEvent};
use crate::pipeline::{DecodePipeline, PipelineEvent, PipelineFactory, PipelineState};
use crate::queue::{CurrentItemChange, QueueChange, QueueManager};
use crate::types::{PlaybackState, PlayerConfig, QueueItem, RepeatMode};

/// Delay before replaying the current item in repeat-one mode, so the
/// pipeline has a moment to settle after reporting the end
const REPLAY_DELAY: Duration = Duration::from_millis(200);

/// Delay between loading the incoming item after a crossfade and seeking it
/// to the handoff position
const HANDOFF_DELAY: Duration = Duration::from_millis(50);

/// Handoff positions below this are treated as "start from the beginning"
const MIN_HANDOFF_SEEK: Duration = Duration::from_millis(500);

#[derive(Debug)]
enum DeferredAction {
    /// Seek to zero and play again (repeat-one, single-item wrap)
    ReplayCurrent,
    /// Finish committing a crossfade on the primary pipeline
    ResumeAfterCrossfade { position: Duration, play: bool },
}

#[derive(Debug)]
struct Deferred {
    due: Instant,
    action: DeferredAction,
}

/// The playback engine
pub struct Player {
    queue: QueueManager,
    crossfade: CrossfadeOrchestrator,
    equalizer: Equalizer,

    primary: Box<dyn DecodePipeline>,
    factory: Box<dyn PipelineFactory>,

    repeat: RepeatMode,
    state: PlaybackState,

    /// Playhead of the current item as last reported by the pipeline;
    /// attached to current-item-changed events as the resume point
    last_position: Duration,

    /// At most one timed action pending at a time; superseded by any
    /// explicit track change
    deferred: Option<Deferred>,

    pending_events: Vec<PlayerEvent>,
}

impl Player {
    /// Create a player; the factory immediately provides the primary pipeline
    pub fn new(config: PlayerConfig, factory: Box<dyn PipelineFactory>) -> Self {
        let primary = factory.create();
        Self {
            queue: QueueManager::new(),
            crossfade: CrossfadeOrchestrator::new(config.crossfade_duration),
            equalizer: Equalizer::new(config.sample_rate),
            primary,
            factory,
            repeat: config.repeat,
            state: PlaybackState::Stopped,
            last_position: Duration::ZERO,
            deferred: None,
            pending_events: Vec::new(),
        }
    }

    // ---- Transport -------------------------------------------------------

    /// Start or resume playback
    ///
    /// From `Stopped`/`Ended` this loads the current queue item; fails with
    /// [`PlaybackError::EmptyQueue`] when there is nothing to load.
    pub fn play(&mut self) -> Result<()> {
        match self.state {
            PlaybackState::Playing => Ok(()),
            PlaybackState::Paused | PlaybackState::Loading => {
                self.primary.play();
                if self.state == PlaybackState::Paused {
                    self.set_state(PlaybackState::Playing);
                }
                Ok(())
            }
            PlaybackState::Stopped | PlaybackState::Ended => {
                if self.queue.current_item().is_none() {
                    return Err(PlaybackError::EmptyQueue);
                }
                self.load_current(true);
                Ok(())
            }
        }
    }

    /// Pause playback, keeping the current item loaded
    pub fn pause(&mut self) {
        if matches!(self.state, PlaybackState::Playing | PlaybackState::Loading) {
            self.primary.pause();
            self.set_state(PlaybackState::Paused);
        }
    }

    /// Stop playback; the queue and current index are preserved
    pub fn stop(&mut self) {
        self.end_active_item(EndReason::Stopped);
        self.crossfade.abort(self.primary.as_mut());
        self.crossfade.track_changed();
        self.deferred = None;
        self.primary.stop();
        self.set_state(PlaybackState::Stopped);
    }

    /// Seek within the current item
    pub fn seek(&mut self, position: Duration) -> Result<()> {
        if self.queue.current_item().is_none() {
            return Err(PlaybackError::NoItemLoaded);
        }
        self.primary.seek(position);
        Ok(())
    }

    /// Set the output volume in [0.0, 1.0]
    pub fn set_volume(&mut self, volume: f32) {
        self.primary.set_volume(volume.clamp(0.0, 1.0));
    }

    /// Set the playback rate (1.0 = normal speed)
    pub fn set_rate(&mut self, rate: f32) {
        self.primary.set_rate(rate);
    }

    /// Current playhead position
    pub fn position(&self) -> Duration {
        self.primary.position()
    }

    /// Duration of the current item, if known
    pub fn duration(&self) -> Option<Duration> {
        self.primary.duration()
    }

    /// How far ahead of the playhead data is buffered
    pub fn buffered_position(&self) -> Duration {
        self.primary.buffered_position()
    }

    /// Player-level playback state
    pub fn state(&self) -> PlaybackState {
        self.state
    }

    // ---- Queue -----------------------------------------------------------

    /// Read-only view of the queue
    pub fn queue(&self) -> &QueueManager {
        &self.queue
    }

    /// Index of the current item
    pub fn current_index(&self) -> Option<usize> {
        self.queue.current_index()
    }

    /// The current item
    pub fn current_item(&self) -> Option<&QueueItem> {
        self.queue.current_item()
    }

    /// Replace the whole queue with one item and start playing it
    pub fn replace_current(&mut self, item: QueueItem) {
        self.end_active_item(EndReason::Cleared);
        let change = self.queue.replace_current(item);
        self.advance(QueueChange::CurrentChanged(change), true);
    }

    /// Append items to the queue
    ///
    /// When the queue was empty the first item is loaded (without playing)
    /// so an immediate `play()` starts instantly.
    pub fn add(&mut self, items: Vec<QueueItem>) {
        if let change @ QueueChange::FirstItem { .. } = self.queue.add(items) {
            self.advance(change, false);
        }
    }

    /// Insert items at the given queue index
    pub fn add_at(&mut self, items: Vec<QueueItem>, index: usize) -> Result<()> {
        if let change @ QueueChange::FirstItem { .. } = self.queue.add_at(items, index)? {
            self.advance(change, false);
        }
        Ok(())
    }

    /// Remove the item at the given index
    ///
    /// Removing the current item loads whatever the queue promotes in its
    /// place, resuming playback only if something was playing.
    pub fn remove(&mut self, index: usize) -> Result<()> {
        let was_playing = matches!(self.state, PlaybackState::Playing | PlaybackState::Loading);
        if let QueueChange::CurrentChanged(change) = self.queue.remove(index)? {
            self.last_position = self.primary.position();
            self.advance(QueueChange::CurrentChanged(change), was_playing);
        }
        Ok(())
    }

    /// Move an item to a different queue position
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.queue.move_item(from, to)
    }

    /// Skip to the next item; returns whether the queue moved
    ///
    /// With `wrap` the last item wraps to the first. Without movement this
    /// is a silent no-op so callers can surface their own end-of-queue cue.
    pub fn next(&mut self, wrap: bool) -> bool {
        match self.queue.next(wrap) {
            QueueChange::None => false,
            change => {
                self.end_active_item(EndReason::SkippedToNext);
                self.advance(change, true);
                true
            }
        }
    }

    /// Skip to the previous item; returns whether the queue moved
    pub fn previous(&mut self, wrap: bool) -> bool {
        match self.queue.previous(wrap) {
            QueueChange::None => false,
            change => {
                self.end_active_item(EndReason::SkippedToPrevious);
                self.advance(change, true);
                true
            }
        }
    }

    /// Jump to an arbitrary queue index
    ///
    /// Jumping to the current index replays it from the start.
    pub fn jump(&mut self, index: usize) -> Result<()> {
        match self.queue.jump(index)? {
            QueueChange::None => {}
            change => {
                self.end_active_item(EndReason::JumpedToIndex);
                self.advance(change, true);
            }
        }
        Ok(())
    }

    /// Drop every item after the current one
    pub fn remove_upcoming(&mut self) {
        self.queue.remove_upcoming();
    }

    /// Drop every item before the current one
    pub fn remove_previous(&mut self) {
        self.queue.remove_previous();
    }

    /// Remove all items and stop playback
    pub fn clear(&mut self) {
        self.end_active_item(EndReason::Cleared);
        self.crossfade.abort(self.primary.as_mut());
        self.crossfade.track_changed();
        self.deferred = None;

        let previous_item = self.queue.current_item().cloned();
        let previous_index = self.queue.current_index();
        let had_items = !self.queue.is_empty();
        self.queue.clear();
        self.primary.stop();

        if had_items {
            self.emit(PlayerEvent::CurrentItemChanged {
                item: None,
                index: None,
                previous_item,
                previous_index,
                last_position: self.last_position,
            });
        }
        self.set_state(PlaybackState::Stopped);
    }

    // ---- Repeat & crossfade ---------------------------------------------

    pub fn repeat(&self) -> RepeatMode {
        self.repeat
    }

    pub fn set_repeat(&mut self, repeat: RepeatMode) {
        self.repeat = repeat;
    }

    pub fn crossfade_duration(&self) -> Duration {
        self.crossfade.duration()
    }

    /// Change the crossfade length; zero disables crossfading
    pub fn set_crossfade_duration(&mut self, duration: Duration) {
        self.crossfade.set_duration(duration);
    }

    /// Current phase of the crossfade orchestrator
    pub fn crossfade_phase(&self) -> CrossfadePhase {
        self.crossfade.phase()
    }

    // ---- Equalizer -------------------------------------------------------

    /// Set equalizer band gains in dB, low band first (clamped to +/-24)
    pub fn set_eq_gains(&mut self, gains: &[f32]) {
        self.equalizer.set_gains(gains);
    }

    pub fn eq_gains(&self) -> [f32; verse_dsp::BAND_COUNT] {
        self.equalizer.gains()
    }

    /// Reset all equalizer bands to flat
    pub fn reset_eq(&mut self) {
        self.equalizer.reset_to_flat();
    }

    pub fn set_eq_enabled(&mut self, enabled: bool) {
        self.equalizer.set_enabled(enabled);
    }

    pub fn is_eq_enabled(&self) -> bool {
        self.equalizer.is_enabled()
    }

    /// Recompute equalizer coefficients for a new device sample rate
    pub fn set_eq_sample_rate(&mut self, sample_rate: u32) {
        self.equalizer.set_sample_rate(sample_rate);
    }

    /// The equalizer controller, for settings export
    pub fn equalizer(&self) -> &Equalizer {
        &self.equalizer
    }

    /// Handle for real-time consumers ([`verse_dsp::EqSession`])
    pub fn eq_handle(&self) -> EqHandle {
        self.equalizer.handle()
    }

    // ---- Events & ticking ------------------------------------------------

    /// Drain pending events in the order they were produced
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.pending_events)
    }

    pub fn has_pending_events(&self) -> bool {
        !self.pending_events.is_empty()
    }

    /// Drive time-based behavior
    ///
    /// Drains pipeline events, advances any crossfade session and runs due
    /// deferred actions. Call regularly from the embedder's run loop.
    pub fn tick(&mut self, now: Instant) {
        for event in self.primary.poll_events() {
            self.handle_pipeline_event(event, now);
        }

        if let CrossfadeUpdate::Finished(handoff) =
            self.crossfade.tick(now, self.primary.as_mut())
        {
            self.commit_crossfade(handoff, now);
        }

        if let Some(deferred) = self.deferred.take() {
            if now >= deferred.due {
                self.run_deferred(deferred.action);
            } else {
                self.deferred = Some(deferred);
            }
        }
    }

    // ---- Internals -------------------------------------------------------

    fn handle_pipeline_event(&mut self, event: PipelineEvent, now: Instant) {
        match event {
            PipelineEvent::StateChanged { state } => match state {
                PipelineState::Playing => self.set_state(PlaybackState::Playing),
                PipelineState::Paused => {
                    if self.state == PlaybackState::Playing {
                        self.set_state(PlaybackState::Paused);
                    }
                }
                PipelineState::Ready => {
                    if self.state == PlaybackState::Loading {
                        self.set_state(PlaybackState::Paused);
                    }
                }
                // End and failure arrive as their own events
                _ => {}
            },
            PipelineEvent::SecondsElapsed { position } => {
                self.last_position = position;
                self.emit(PlayerEvent::SecondsElapsed {
                    position,
                    duration: self.primary.duration(),
                });
                self.check_crossfade(now);
            }
            // Duration is read from the pipeline on demand
            PipelineEvent::DurationUpdated { .. } => {}
            PipelineEvent::SeekCompleted { position } => {
                self.last_position = position;
                self.emit(PlayerEvent::SeekCompleted { position });
            }
            PipelineEvent::PlaybackFailed { message }
            | PipelineEvent::FailedToEnd { message } => {
                warn!(%message, "pipeline failure");
                self.crossfade.abort(self.primary.as_mut());
                self.deferred = None;
                self.emit(PlayerEvent::Error { message });
                self.emit(PlayerEvent::PlaybackEnded {
                    reason: EndReason::Failed,
                });
                // Queue position is untouched so the caller can retry
                self.set_state(PlaybackState::Stopped);
            }
            PipelineEvent::PlayedToEnd => self.handle_played_to_end(now),
        }
    }

    fn handle_played_to_end(&mut self, now: Instant) {
        self.last_position = self.primary.position();
        self.emit(PlayerEvent::PlaybackEnded {
            reason: EndReason::PlayedUntilEnd,
        });

        match self.repeat {
            RepeatMode::One => {
                debug!("repeat-one: scheduling replay");
                self.deferred = Some(Deferred {
                    due: now + REPLAY_DELAY,
                    action: DeferredAction::ReplayCurrent,
                });
            }
            RepeatMode::All => match self.queue.next(true) {
                QueueChange::SkipToSame { .. } => {
                    // Single-item queue wrapping onto itself
                    self.deferred = Some(Deferred {
                        due: now + REPLAY_DELAY,
                        action: DeferredAction::ReplayCurrent,
                    });
                }
                change => self.advance(change, true),
            },
            RepeatMode::Off => match self.queue.next(false) {
                QueueChange::None => self.set_state(PlaybackState::Ended),
                change => self.advance(change, true),
            },
        }
    }

    /// Apply a queue transition to the pipeline and event stream
    fn advance(&mut self, change: QueueChange, play_when_ready: bool) {
        self.crossfade.abort(self.primary.as_mut());
        self.crossfade.track_changed();
        self.deferred = None;

        match change {
            QueueChange::FirstItem { index } => {
                self.emit(PlayerEvent::CurrentItemChanged {
                    item: self.queue.current_item().cloned(),
                    index: Some(index),
                    previous_item: None,
                    previous_index: None,
                    last_position: self.last_position,
                });
                self.load_current(play_when_ready);
            }
            QueueChange::CurrentChanged(change) => {
                self.emit_current_item_changed(change);
                self.load_current(play_when_ready);
            }
            QueueChange::SkipToSame { .. } => self.replay_current(),
            QueueChange::None => {}
        }
    }

    fn load_current(&mut self, play_when_ready: bool) {
        let Some(item) = self.queue.current_item().cloned() else {
            self.primary.stop();
            self.set_state(PlaybackState::Stopped);
            return;
        };

        self.set_state(PlaybackState::Loading);
        if let Err(error) = self.primary.load(&item, play_when_ready) {
            warn!(%error, location = %item.location, "failed to load item");
            self.emit(PlayerEvent::Error {
                message: error.to_string(),
            });
            self.emit(PlayerEvent::PlaybackEnded {
                reason: EndReason::Failed,
            });
            self.set_state(PlaybackState::Stopped);
            return;
        }
        if let Some(rate) = item.options.rate {
            self.primary.set_rate(rate);
        }
    }

    fn replay_current(&mut self) {
        self.primary.seek(Duration::ZERO);
        self.primary.play();
        self.set_state(PlaybackState::Playing);
    }

    /// Commit a finished crossfade: advance the queue and pick up on the
    /// primary pipeline where the secondary left off
    fn commit_crossfade(&mut self, handoff: HandoffState, now: Instant) {
        self.last_position = self.primary.position();
        self.emit(PlayerEvent::PlaybackEnded {
            reason: EndReason::PlayedUntilEnd,
        });

        let wrap = self.repeat == RepeatMode::All;
        let change = self.queue.next(wrap);
        self.crossfade.track_changed();

        match change {
            QueueChange::CurrentChanged(change) => {
                self.emit_current_item_changed(change);
                self.load_current(false);

                // Positions barely past the start are not worth a seek
                let position = if handoff.position >= MIN_HANDOFF_SEEK {
                    handoff.position
                } else {
                    Duration::ZERO
                };
                self.deferred = Some(Deferred {
                    due: now + HANDOFF_DELAY,
                    action: DeferredAction::ResumeAfterCrossfade {
                        position,
                        play: handoff.was_playing,
                    },
                });
            }
            _ => {
                // The next item disappeared mid-blend
                self.set_state(PlaybackState::Ended);
            }
        }
    }

    fn run_deferred(&mut self, action: DeferredAction) {
        match action {
            DeferredAction::ReplayCurrent => self.replay_current(),
            DeferredAction::ResumeAfterCrossfade { position, play } => {
                if !position.is_zero() {
                    self.primary.seek(position);
                }
                if play {
                    self.primary.play();
                    self.set_state(PlaybackState::Playing);
                } else {
                    self.set_state(PlaybackState::Paused);
                }
            }
        }
    }

    fn check_crossfade(&mut self, now: Instant) {
        let next_item = self
            .queue
            .peek_next_index(self.repeat)
            .and_then(|i| self.queue.get(i))
            .cloned();

        self.crossfade.maybe_begin_preload(
            now,
            self.primary.position(),
            self.primary.duration(),
            self.primary.is_active(),
            next_item.as_ref(),
            self.factory.as_ref(),
        );
    }

    /// Emit playback-ended for the active item, capturing its resume point
    fn end_active_item(&mut self, reason: EndReason) {
        if !matches!(self.state, PlaybackState::Stopped | PlaybackState::Ended) {
            self.last_position = self.primary.position();
            self.emit(PlayerEvent::PlaybackEnded { reason });
        }
    }

    fn emit_current_item_changed(&mut self, change: CurrentItemChange) {
        self.emit(PlayerEvent::CurrentItemChanged {
            item: change.item,
            index: change.index,
            previous_item: change.previous_item,
            previous_index: change.previous_index,
            last_position: self.last_position,
        });
    }

    fn set_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.emit(PlayerEvent::StateChanged { state });
        }
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.pending_events.push(event);
    }
}
