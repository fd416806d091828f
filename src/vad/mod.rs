//! Voice Activity Detection (VAD).
//!
//! A detector locates spans of speech within a buffered window; the gate
//! decides whether a window is worth transcribing at all.

pub mod detector;
pub mod energy;
pub mod gate;

pub use detector::{MockVad, SpeechSpan, VoiceActivityDetector};
pub use energy::{EnergyVad, EnergyVadConfig, calculate_rms};
pub use gate::VoiceActivityGate;
