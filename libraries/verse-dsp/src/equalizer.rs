//! Equalizer controller
//!
//! Owns the 10 band gains, compiles them into coefficient snapshots, and
//! publishes those snapshots to real-time consumers.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::biquad::{BiquadCoeffs, BAND_COUNT, BAND_FREQUENCIES};

/// Valid gain range per band in dB
pub const GAIN_RANGE_DB: (f32, f32) = (-24.0, 24.0);

/// Immutable compiled equalizer state
///
/// Built whole on the control thread, then swapped in behind the handle
/// lock. Real-time consumers either see the previous snapshot or this one,
/// never a mix.
#[derive(Debug, Clone, PartialEq)]
pub struct EqSnapshot {
    /// Whether the cascade should run at all
    pub enabled: bool,

    /// Sample rate the coefficients were computed for
    pub sample_rate: u32,

    /// One coefficient set per band, in fixed frequency order
    pub coeffs: [BiquadCoeffs; BAND_COUNT],
}

impl EqSnapshot {
    fn flat(sample_rate: u32) -> Self {
        Self {
            enabled: true,
            sample_rate,
            coeffs: [BiquadCoeffs::IDENTITY; BAND_COUNT],
        }
    }
}

/// Handle given to real-time consumers
///
/// `snapshot()` takes the lock only long enough to clone an `Arc`, which is
/// the bounded critical section the audio callback is allowed.
#[derive(Debug, Clone)]
pub struct EqHandle {
    shared: Arc<Mutex<Arc<EqSnapshot>>>,
}

impl EqHandle {
    /// Fetch the current snapshot
    ///
    /// Safe to call from the audio callback: no allocation, no unbounded
    /// blocking (writers only hold the lock for a pointer swap).
    pub fn snapshot(&self) -> Arc<EqSnapshot> {
        // Poisoning can only happen if a writer panicked mid-swap; the
        // stored Arc is still intact either way.
        match self.shared.lock() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }
}

/// Serializable gain settings (for config/IPC round-trips)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EqualizerSettings {
    /// Gains in dB, one per band
    pub gains: Vec<f32>,

    /// Whether the equalizer is enabled
    pub enabled: bool,
}

/// Equalizer controller (control domain only)
///
/// Mutations recompute all 10 coefficient sets and publish a fresh snapshot.
/// The real-time cascade lives in [`crate::EqSession`].
#[derive(Debug)]
pub struct Equalizer {
    gains: [f32; BAND_COUNT],
    enabled: bool,
    sample_rate: u32,
    shared: Arc<Mutex<Arc<EqSnapshot>>>,
}

impl Equalizer {
    /// Create a flat equalizer for the given sample rate
    pub fn new(sample_rate: u32) -> Self {
        Self {
            gains: [0.0; BAND_COUNT],
            enabled: true,
            sample_rate,
            shared: Arc::new(Mutex::new(Arc::new(EqSnapshot::flat(sample_rate)))),
        }
    }

    /// Get a handle for real-time consumers
    pub fn handle(&self) -> EqHandle {
        EqHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Set band gains in dB
    ///
    /// Values are clamped to [-24, +24]. Fewer than 10 values are padded
    /// with 0 dB (flat); extras are ignored.
    pub fn set_gains(&mut self, gains: &[f32]) {
        let (min, max) = GAIN_RANGE_DB;
        for (slot, value) in self.gains.iter_mut().zip(gains.iter().chain(std::iter::repeat(&0.0)))
        {
            *slot = value.clamp(min, max);
        }
        self.publish();
    }

    /// Get current band gains in dB
    pub fn gains(&self) -> [f32; BAND_COUNT] {
        self.gains
    }

    /// Reset all bands to 0 dB
    pub fn reset_to_flat(&mut self) {
        self.gains = [0.0; BAND_COUNT];
        self.publish();
    }

    /// Enable or disable the equalizer
    pub fn set_enabled(&mut self, enabled: bool) {
        if self.enabled != enabled {
            self.enabled = enabled;
            self.publish();
        }
    }

    /// Check if the equalizer is enabled
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Update the active sample rate (recomputes all coefficients)
    ///
    /// Called by the platform when the output device or stream format
    /// changes; a no-op if the rate is unchanged.
    pub fn set_sample_rate(&mut self, sample_rate: u32) {
        if self.sample_rate != sample_rate {
            self.sample_rate = sample_rate;
            self.publish();
        }
    }

    /// Current sample rate the coefficients target
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Export settings for persistence/IPC
    pub fn settings(&self) -> EqualizerSettings {
        EqualizerSettings {
            gains: self.gains.to_vec(),
            enabled: self.enabled,
        }
    }

    /// Apply previously exported settings
    pub fn apply_settings(&mut self, settings: &EqualizerSettings) {
        self.enabled = settings.enabled;
        self.set_gains(&settings.gains);
    }

    /// Compile the current gains and swap the published snapshot
    fn publish(&mut self) {
        let sr = self.sample_rate as f32;
        let mut coeffs = [BiquadCoeffs::IDENTITY; BAND_COUNT];
        for (i, c) in coeffs.iter_mut().enumerate() {
            *c = BiquadCoeffs::peaking(sr, BAND_FREQUENCIES[i], self.gains[i]);
        }

        let snapshot = Arc::new(EqSnapshot {
            enabled: self.enabled,
            sample_rate: self.sample_rate,
            coeffs,
        });

        // Bounded critical section: a single pointer store
        match self.shared.lock() {
            Ok(mut guard) => *guard = snapshot,
            Err(poisoned) => *poisoned.into_inner() = snapshot,
        }
    }
}

impl Default for Equalizer {
    fn default() -> Self {
        Self::new(44100)
    }
}
