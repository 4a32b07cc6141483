//! Verse Player - Equalizer DSP
//!
//! Real-time 10-band graphic equalizer built from peaking biquad filters.
//!
//! This crate provides:
//! - Stateless biquad coefficient computation (peaking EQ, fixed Q)
//! - An [`Equalizer`] controller owning the 10 band gains
//! - Per-stream [`EqSession`] objects that run the filter cascade on the
//!   audio callback
//!
//! # Architecture
//!
//! Control code mutates the [`Equalizer`]; the audio callback holds an
//! [`EqHandle`] and an [`EqSession`]. Gains are compiled into an immutable
//! coefficient snapshot that is swapped atomically behind a short-held lock,
//! so the real-time path never observes a half-updated band and never waits
//! on coefficient computation.
//!
//! # Example
//!
//! ```rust
//! use verse_dsp::{Equalizer, EqSession};
//!
//! let mut eq = Equalizer::new(44100);
//! eq.set_gains(&[6.0, 4.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 2.0, 4.0]);
//!
//! // Audio callback side: one session per stream
//! let mut session = EqSession::new(eq.handle());
//! let mut buffer = vec![0.0f32; 512];
//! session.process(&mut buffer, 44100, 2);
//! ```

mod biquad;
mod equalizer;
mod session;

pub use biquad::{BiquadCoeffs, BiquadState, BAND_COUNT, BAND_FREQUENCIES, BAND_Q};
pub use equalizer::{EqHandle, EqSnapshot, Equalizer, GAIN_RANGE_DB};
pub use session::EqSession;
