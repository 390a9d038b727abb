//! Audio loading and buffer management
//!
//! Everything downstream of this module works on one canonical format:
//! mono, 16 kHz, 32-bit float. The loader owns the normalization contract;
//! container and codec decoding are delegated to hound and symphonia, and
//! video audio extraction to ffmpeg.

pub mod buffer;
pub mod loader;

pub use buffer::{AudioBuffer, SAMPLE_RATE};
pub use loader::load;
