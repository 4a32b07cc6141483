//! Scriptable fake pipelines for player tests
//!
//! `FakeFactory` records every pipeline it creates and hands back cloneable
//! `FakeHandle`s, so tests can inspect pipelines the player owns and inject
//! events into them.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use verse_playback::{
    DecodePipeline, PipelineEvent, PipelineFactory, PipelineState, PlaybackError, QueueItem,
    Result,
};

#[derive(Debug)]
pub struct FakeState {
    pub state: PipelineState,
    pub position: Duration,
    pub duration: Option<Duration>,
    pub volume: f32,
    pub rate: f32,

    /// Every `load` call: the item and its `play_when_ready` flag
    pub loads: Vec<(QueueItem, bool)>,
    pub seeks: Vec<Duration>,
    pub volume_log: Vec<f32>,
    pub plays: u32,
    pub pauses: u32,
    pub stops: u32,

    /// Fail the next `load` call synchronously with this message
    pub fail_next_load: Option<String>,
    /// Do not emit the ready event on load (source that buffers forever)
    pub suppress_ready: bool,

    pub events: Vec<PipelineEvent>,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            state: PipelineState::Idle,
            position: Duration::ZERO,
            duration: None,
            volume: 1.0,
            rate: 1.0,
            loads: Vec::new(),
            seeks: Vec::new(),
            volume_log: Vec::new(),
            plays: 0,
            pauses: 0,
            stops: 0,
            fail_next_load: None,
            suppress_ready: false,
            events: Vec::new(),
        }
    }
}

/// Shared view into one fake pipeline
#[derive(Debug, Clone, Default)]
pub struct FakeHandle(Arc<Mutex<FakeState>>);

impl FakeHandle {
    pub fn with<R>(&self, f: impl FnOnce(&mut FakeState) -> R) -> R {
        f(&mut self.0.lock().unwrap())
    }

    /// Queue a pipeline event for the player's next tick
    pub fn push_event(&self, event: PipelineEvent) {
        self.with(|s| s.events.push(event));
    }

    /// Move the playhead and report it, as a playing pipeline would
    pub fn report_position(&self, position: Duration) {
        self.with(|s| {
            s.position = position;
            s.events.push(PipelineEvent::SecondsElapsed { position });
        });
    }

    pub fn set_duration(&self, duration: Duration) {
        self.with(|s| s.duration = Some(duration));
    }

    pub fn set_position(&self, position: Duration) {
        self.with(|s| s.position = position);
    }

    pub fn volume(&self) -> f32 {
        self.with(|s| s.volume)
    }

    pub fn state(&self) -> PipelineState {
        self.with(|s| s.state)
    }

    pub fn loads(&self) -> Vec<(QueueItem, bool)> {
        self.with(|s| s.loads.clone())
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.with(|s| s.seeks.clone())
    }

    pub fn plays(&self) -> u32 {
        self.with(|s| s.plays)
    }

    pub fn stops(&self) -> u32 {
        self.with(|s| s.stops)
    }
}

struct FakePipeline {
    shared: FakeHandle,
}

impl DecodePipeline for FakePipeline {
    fn load(&mut self, item: &QueueItem, play_when_ready: bool) -> Result<()> {
        self.shared.with(|s| {
            if let Some(message) = s.fail_next_load.take() {
                s.state = PipelineState::Failed;
                return Err(PlaybackError::PipelineLoad(message));
            }

            s.loads.push((item.clone(), play_when_ready));
            s.position = item.start_position.unwrap_or_default();
            s.state = PipelineState::Loading;

            if !s.suppress_ready {
                s.state = PipelineState::Ready;
                s.events.push(PipelineEvent::StateChanged {
                    state: PipelineState::Ready,
                });
                if play_when_ready {
                    s.state = PipelineState::Playing;
                    s.events.push(PipelineEvent::StateChanged {
                        state: PipelineState::Playing,
                    });
                }
            }
            Ok(())
        })
    }

    fn play(&mut self) {
        self.shared.with(|s| {
            s.plays += 1;
            s.state = PipelineState::Playing;
            s.events.push(PipelineEvent::StateChanged {
                state: PipelineState::Playing,
            });
        });
    }

    fn pause(&mut self) {
        self.shared.with(|s| {
            s.pauses += 1;
            s.state = PipelineState::Paused;
            s.events.push(PipelineEvent::StateChanged {
                state: PipelineState::Paused,
            });
        });
    }

    fn stop(&mut self) {
        self.shared.with(|s| {
            s.stops += 1;
            s.state = PipelineState::Idle;
        });
    }

    fn seek(&mut self, position: Duration) {
        self.shared.with(|s| {
            s.seeks.push(position);
            s.position = position;
            s.events.push(PipelineEvent::SeekCompleted { position });
        });
    }

    fn set_volume(&mut self, volume: f32) {
        self.shared.with(|s| {
            s.volume = volume;
            s.volume_log.push(volume);
        });
    }

    fn set_rate(&mut self, rate: f32) {
        self.shared.with(|s| s.rate = rate);
    }

    fn position(&self) -> Duration {
        self.shared.with(|s| s.position)
    }

    fn duration(&self) -> Option<Duration> {
        self.shared.with(|s| s.duration)
    }

    fn buffered_position(&self) -> Duration {
        self.shared.with(|s| s.position)
    }

    fn is_active(&self) -> bool {
        self.shared.with(|s| s.state == PipelineState::Playing)
    }

    fn state(&self) -> PipelineState {
        self.shared.with(|s| s.state)
    }

    fn poll_events(&mut self) -> Vec<PipelineEvent> {
        self.shared.with(|s| std::mem::take(&mut s.events))
    }
}

#[derive(Debug, Default)]
pub struct FactoryConfig {
    pub fail_next_load: Option<String>,
    pub suppress_ready: bool,
}

/// Factory that remembers every pipeline it creates
#[derive(Debug, Clone, Default)]
pub struct FakeFactory {
    handles: Arc<Mutex<Vec<FakeHandle>>>,
    config: Arc<Mutex<FactoryConfig>>,
}

impl FakeFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles for every pipeline created so far, in creation order
    ///
    /// Index 0 is always the player's primary pipeline.
    pub fn pipelines(&self) -> Vec<FakeHandle> {
        self.handles.lock().unwrap().clone()
    }

    pub fn pipeline(&self, index: usize) -> FakeHandle {
        self.handles.lock().unwrap()[index].clone()
    }

    pub fn created(&self) -> usize {
        self.handles.lock().unwrap().len()
    }

    /// Make the next created pipeline fail its first load
    pub fn fail_next_pipeline_load(&self, message: &str) {
        self.config.lock().unwrap().fail_next_load = Some(message.to_string());
    }

    /// Created pipelines never report ready on their own
    pub fn suppress_ready(&self) {
        self.config.lock().unwrap().suppress_ready = true;
    }
}

impl PipelineFactory for FakeFactory {
    fn create(&self) -> Box<dyn DecodePipeline> {
        let handle = FakeHandle::default();
        {
            let mut config = self.config.lock().unwrap();
            let fail = config.fail_next_load.take();
            let suppress = config.suppress_ready;
            handle.with(|s| {
                s.fail_next_load = fail;
                s.suppress_ready = suppress;
            });
        }
        self.handles.lock().unwrap().push(handle.clone());
        Box::new(FakePipeline { shared: handle })
    }
}
