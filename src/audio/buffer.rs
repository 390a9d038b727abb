//! Audio buffer implementation
//!
//! AudioBuffer is the canonical sample container: mono, 16 kHz, f32.
//! Invariants: non-empty, all samples finite. Both are checked at
//! construction so downstream code never has to.

use crate::error::LoadError;

/// Sample rate every buffer is normalized to (Hz)
pub const SAMPLE_RATE: u32 = 16_000;

/// Mono audio samples at the fixed internal sample rate
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    samples: Vec<f32>,
}

impl AudioBuffer {
    /// Create a buffer from raw samples, validating the buffer invariants.
    ///
    /// # Errors
    /// * `LoadError::Empty` - if `samples` is empty
    /// * `LoadError::DecodeFailed` - if any sample is NaN or infinite
    pub fn from_samples(samples: Vec<f32>) -> Result<Self, LoadError> {
        if samples.is_empty() {
            return Err(LoadError::Empty);
        }
        if samples.iter().any(|s| !s.is_finite()) {
            return Err(LoadError::DecodeFailed {
                reason: "decoded stream contains non-finite samples".to_string(),
                source: None,
            });
        }
        Ok(Self { samples })
    }

    /// Create a sine wave test tone at the internal sample rate
    pub fn sine_wave(frequency: f32, duration_secs: f32) -> Self {
        let num_samples = (duration_secs * SAMPLE_RATE as f32) as usize;
        let mut samples = Vec::with_capacity(num_samples);

        for i in 0..num_samples {
            let t = i as f32 / SAMPLE_RATE as f32;
            samples.push((2.0 * std::f32::consts::PI * frequency * t).sin());
        }

        Self { samples }
    }

    /// Create an all-zero buffer (valid as a buffer, rejected by analysis)
    pub fn silence(duration_secs: f32) -> Self {
        let num_samples = (duration_secs * SAMPLE_RATE as f32) as usize;
        Self {
            samples: vec![0.0; num_samples.max(1)],
        }
    }

    /// Get a reference to the samples
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Number of samples in the buffer
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Always false for a constructed buffer; present for completeness
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Duration in seconds
    pub fn duration(&self) -> f32 {
        self.samples.len() as f32 / SAMPLE_RATE as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sine_wave_generation() {
        let buffer = AudioBuffer::sine_wave(440.0, 1.0);
        assert_eq!(buffer.len(), 16_000);
        assert!((buffer.duration() - 1.0).abs() < 0.001);
    }

    #[test]
    fn test_empty_buffer_rejected() {
        let result = AudioBuffer::from_samples(vec![]);
        assert!(matches!(result, Err(LoadError::Empty)));
    }

    #[test]
    fn test_non_finite_samples_rejected() {
        let result = AudioBuffer::from_samples(vec![0.1, f32::NAN, 0.3]);
        assert!(matches!(result, Err(LoadError::DecodeFailed { .. })));

        let result = AudioBuffer::from_samples(vec![0.1, f32::INFINITY]);
        assert!(matches!(result, Err(LoadError::DecodeFailed { .. })));
    }

    #[test]
    fn test_silence_is_a_valid_buffer() {
        let buffer = AudioBuffer::silence(0.5);
        assert_eq!(buffer.len(), 8_000);
        assert!(buffer.samples().iter().all(|&s| s == 0.0));
    }
}
