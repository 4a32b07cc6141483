//! Biquad filter primitives
//!
//! Coefficient computation is stateless and runs on the control thread;
//! filter state lives in per-stream sessions and is only touched by the
//! audio callback.

/// Number of equalizer bands
pub const BAND_COUNT: usize = 10;

/// Fixed band center frequencies in Hz (ISO octave centers)
pub const BAND_FREQUENCIES: [f32; BAND_COUNT] = [
    31.0, 62.0, 125.0, 250.0, 500.0, 1000.0, 2000.0, 4000.0, 8000.0, 16000.0,
];

/// Quality factor shared by all peaking bands
pub const BAND_Q: f32 = 1.41;

/// Gains within this many dB of zero compile to the identity filter
const FLAT_GAIN_EPSILON: f32 = 0.01;

/// Normalized biquad coefficients (a0 = 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BiquadCoeffs {
    pub b0: f32,
    pub b1: f32,
    pub b2: f32,
    pub a1: f32,
    pub a2: f32,
}

impl BiquadCoeffs {
    /// Pass-through filter: output equals input
    pub const IDENTITY: Self = Self {
        b0: 1.0,
        b1: 0.0,
        b2: 0.0,
        a1: 0.0,
        a2: 0.0,
    };

    /// Check for the exact identity tuple (used to skip bands in the cascade)
    #[inline]
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// Compute peaking EQ coefficients for one band
    ///
    /// Gains within 0.01 dB of flat collapse to [`Self::IDENTITY`] so the
    /// cascade can bypass the band entirely. Frequencies are clamped to 45%
    /// of the sample rate to keep the filter stable near Nyquist.
    pub fn peaking(sample_rate: f32, frequency: f32, gain_db: f32) -> Self {
        if gain_db.abs() < FLAT_GAIN_EPSILON {
            return Self::IDENTITY;
        }
        if sample_rate < 1.0 {
            return Self::IDENTITY;
        }

        let a = 10.0_f32.powf(gain_db / 40.0);
        let clamped_freq = frequency.min(sample_rate * 0.45);
        let omega = 2.0 * std::f32::consts::PI * clamped_freq / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * BAND_Q);

        let b0 = 1.0 + alpha * a;
        let b1 = -2.0 * cos_omega;
        let b2 = 1.0 - alpha * a;
        let a0 = 1.0 + alpha / a;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha / a;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Per-channel, per-band filter memory: two past inputs, two past outputs
#[derive(Debug, Clone, Copy, Default)]
pub struct BiquadState {
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl BiquadState {
    /// Run one sample through the second-order IIR transfer function
    #[inline]
    pub fn process(&mut self, c: &BiquadCoeffs, x: f32) -> f32 {
        let mut y = c.b0 * x + c.b1 * self.x1 + c.b2 * self.x2 - c.a1 * self.y1 - c.a2 * self.y2;

        // Flush denormals to zero to avoid CPU penalties on long decays
        if y.abs() < 1e-15 {
            y = 0.0;
        }

        self.x2 = self.x1;
        self.x1 = x;
        self.y2 = self.y1;
        self.y1 = y;

        y
    }

    /// Clear filter memory (new stream or format change)
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
