//! Real-time equalizer session
//!
//! One session per audio stream. The session owns the only copy of the
//! filter memory, so primary and crossfade-secondary streams never share
//! state. All methods here run on the audio callback except construction.

use crate::biquad::{BiquadState, BAND_COUNT};
use crate::equalizer::EqHandle;

/// Per-stream filter cascade
///
/// # Real-time constraints
/// - `process()` does not allocate in the steady state; the per-channel
///   state vector is only resized when the stream format changes
/// - The coefficient snapshot is fetched once per buffer through a
///   bounded-lock handle
pub struct EqSession {
    handle: EqHandle,

    /// Format of the stream this state belongs to; a change means a new
    /// stream started and the memory must be cleared
    sample_rate: u32,
    channels: u16,

    /// Filter memory: one `[BiquadState; 10]` per output channel
    state: Vec<[BiquadState; BAND_COUNT]>,
}

impl EqSession {
    /// Create a session bound to an equalizer handle
    ///
    /// The format is learned from the first `process()` call.
    pub fn new(handle: EqHandle) -> Self {
        Self {
            handle,
            sample_rate: 0,
            channels: 0,
            state: Vec::new(),
        }
    }

    /// Current channel count (0 until the first buffer arrives)
    pub fn channels(&self) -> u16 {
        self.channels
    }

    /// Current sample rate (0 until the first buffer arrives)
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Clear all filter memory
    pub fn reset(&mut self) {
        for channel in &mut self.state {
            for band in channel.iter_mut() {
                band.reset();
            }
        }
    }

    /// Apply the equalizer cascade to an interleaved buffer in-place
    ///
    /// Bands whose coefficient set is exactly identity are skipped; the
    /// final sample is clamped to [-1.0, 1.0] so band boost cannot push the
    /// output past full scale.
    pub fn process(&mut self, buffer: &mut [f32], sample_rate: u32, channels: u16) {
        if channels == 0 || buffer.is_empty() {
            return;
        }

        // Format change = new stream: clear filter memory
        if self.sample_rate != sample_rate || self.channels != channels {
            self.sample_rate = sample_rate;
            self.channels = channels;
            self.state.clear();
            self.state
                .resize(channels as usize, [BiquadState::default(); BAND_COUNT]);
        }

        let snapshot = self.handle.snapshot();
        if !snapshot.enabled {
            return;
        }

        // Whole-cascade bypass when every band is flat
        if snapshot.coeffs.iter().all(|c| c.is_identity()) {
            return;
        }

        let channels = channels as usize;
        for frame in buffer.chunks_exact_mut(channels) {
            for (ch, sample) in frame.iter_mut().enumerate() {
                let mut x = *sample;
                let bands = &mut self.state[ch];

                for (band, coeffs) in bands.iter_mut().zip(snapshot.coeffs.iter()) {
                    if coeffs.is_identity() {
                        continue;
                    }
                    x = band.process(coeffs, x);
                }

                *sample = x.clamp(-1.0, 1.0);
            }
        }
    }
}
