//! Audio buffering and PCM sample handling.

pub mod buffer;
pub mod pcm;

pub use buffer::{AudioBuffer, AudioWindow};
