//! Frequency-spectrum analysis
//!
//! Pure functions over [`AudioBuffer`]: the one-sided power spectrum of the
//! whole signal (no framing or windowing), its power-weighted center of
//! mass, and the zoom window that frames two profiles for side-by-side
//! display. Everything here is deterministic and free of shared state, so
//! it is safe to call from any thread.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::{AudioBuffer, SAMPLE_RATE};
use crate::error::AnalysisError;

/// Margin added on both sides of the spectral centers when framing (Hz)
pub const ZOOM_MARGIN_HZ: f32 = 500.0;

/// One-sided normalized power spectrum of a single buffer.
///
/// `frequencies` and `power` are index-aligned and equal length;
/// frequencies are strictly increasing and power is normalized to [0, 1]
/// with the peak bin at exactly 1. Immutable once produced.
#[derive(Debug, Clone)]
pub struct FrequencyProfile {
    frequencies: Vec<f32>,
    power: Vec<f32>,
}

impl FrequencyProfile {
    /// Frequency of each bin in Hz
    pub fn frequencies(&self) -> &[f32] {
        &self.frequencies
    }

    /// Normalized power of each bin
    pub fn power(&self) -> &[f32] {
        &self.power
    }

    /// Number of bins (`N/2 + 1` for a buffer of `N` samples)
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    /// Power-weighted mean frequency in Hz.
    ///
    /// # Errors
    /// * `AnalysisError::SilentSignal` - if total power is zero, which would
    ///   make the weighted mean a division by zero
    pub fn center_of_mass(&self) -> Result<f32, AnalysisError> {
        let mut total_power = 0.0f64;
        let mut weighted = 0.0f64;
        for (&f, &p) in self.frequencies.iter().zip(&self.power) {
            total_power += p as f64;
            weighted += (f * p) as f64;
        }

        if total_power <= 0.0 {
            return Err(AnalysisError::SilentSignal);
        }
        Ok((weighted / total_power) as f32)
    }

    /// Frequency of the highest-power bin in Hz
    pub fn peak_frequency(&self) -> f32 {
        self.power
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| self.frequencies[i])
            .unwrap_or(0.0)
    }
}

/// Display frame shared by two profiles, derived from their spectral
/// centers plus [`ZOOM_MARGIN_HZ`] on each side. Never alters the profiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomWindow {
    pub min_hz: f32,
    pub max_hz: f32,
}

impl ZoomWindow {
    /// Frame two spectral centers with the default margin
    pub fn around(center_a: f32, center_b: f32) -> Self {
        Self::with_margin(center_a, center_b, ZOOM_MARGIN_HZ)
    }

    /// Frame two spectral centers with an explicit margin.
    ///
    /// The lower bound is clamped to 0 Hz: a center close to DC would
    /// otherwise push the window into negative frequencies, which have no
    /// meaning on a one-sided spectrum display.
    pub fn with_margin(center_a: f32, center_b: f32, margin: f32) -> Self {
        Self {
            min_hz: (center_a.min(center_b) - margin).max(0.0),
            max_hz: center_a.max(center_b) + margin,
        }
    }

    pub fn contains(&self, hz: f32) -> bool {
        hz >= self.min_hz && hz <= self.max_hz
    }

    pub fn span(&self) -> f32 {
        self.max_hz - self.min_hz
    }
}

/// Compute the normalized one-sided power spectrum of a buffer.
///
/// The whole signal is transformed as one block; bin `i` sits at
/// `i * 16000 / N` Hz for `i` in `0..=N/2`, and `power[i] = |F[i]|^2`
/// divided by the peak bin.
///
/// # Errors
/// * `AnalysisError::SilentSignal` - if the peak bin is zero (all-zero
///   buffer), since dividing by it is undefined
pub fn analyze(buffer: &AudioBuffer) -> Result<FrequencyProfile, AnalysisError> {
    let n = buffer.len();

    let mut spectrum: Vec<Complex<f32>> = buffer
        .samples()
        .iter()
        .map(|&s| Complex::new(s, 0.0))
        .collect();

    let mut planner = FftPlanner::new();
    planner.plan_fft_forward(n).process(&mut spectrum);

    // One-sided spectrum: bins 0..=N/2
    let bins = n / 2 + 1;
    let mut power: Vec<f32> = spectrum[..bins].iter().map(|c| c.norm_sqr()).collect();

    let max = power.iter().copied().fold(0.0f32, f32::max);
    if max <= 0.0 {
        return Err(AnalysisError::SilentSignal);
    }
    for p in &mut power {
        *p /= max;
    }

    let bin_width = SAMPLE_RATE as f32 / n as f32;
    let frequencies = (0..bins).map(|i| i as f32 * bin_width).collect();

    Ok(FrequencyProfile {
        frequencies,
        power,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_profile_length_is_half_plus_one() {
        // 5 seconds at 16 kHz: 80_000 samples -> 40_001 bins
        let buffer = AudioBuffer::sine_wave(440.0, 5.0);
        assert_eq!(buffer.len(), 80_000);

        let profile = analyze(&buffer).unwrap();
        assert_eq!(profile.len(), 40_001);
        assert_eq!(profile.frequencies().len(), profile.power().len());
    }

    #[test]
    fn test_power_normalized_with_peak_at_one() {
        let buffer = AudioBuffer::sine_wave(1000.0, 1.0);
        let profile = analyze(&buffer).unwrap();

        assert!(profile.power().iter().all(|&p| (0.0..=1.0).contains(&p)));
        let max = profile.power().iter().copied().fold(0.0f32, f32::max);
        assert_eq!(max, 1.0);
    }

    #[test]
    fn test_frequencies_strictly_increasing() {
        let buffer = AudioBuffer::sine_wave(440.0, 0.25);
        let profile = analyze(&buffer).unwrap();

        assert_eq!(profile.frequencies()[0], 0.0);
        assert!(profile
            .frequencies()
            .windows(2)
            .all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_sine_peak_lands_on_tone_frequency() {
        let buffer = AudioBuffer::sine_wave(440.0, 1.0);
        let profile = analyze(&buffer).unwrap();

        // Bin width is 1 Hz for a one-second buffer
        assert_relative_eq!(profile.peak_frequency(), 440.0, max_relative = 0.01);
    }

    #[test]
    fn test_silent_buffer_is_rejected() {
        let buffer = AudioBuffer::silence(1.0);
        assert!(matches!(
            analyze(&buffer),
            Err(AnalysisError::SilentSignal)
        ));
    }

    #[test]
    fn test_center_of_mass_near_tone() {
        let buffer = AudioBuffer::sine_wave(2000.0, 1.0);
        let profile = analyze(&buffer).unwrap();
        let center = profile.center_of_mass().unwrap();

        // Spectral leakage spreads some mass to neighboring bins, so the
        // center sits near the tone rather than exactly on it.
        assert!(
            (center - 2000.0).abs() < 100.0,
            "center of mass was {center} Hz"
        );
    }

    #[test]
    fn test_center_of_mass_scale_invariant() {
        let buffer = AudioBuffer::sine_wave(700.0, 0.5);
        let profile = analyze(&buffer).unwrap();
        let center = profile.center_of_mass().unwrap();

        let scaled = FrequencyProfile {
            frequencies: profile.frequencies().to_vec(),
            power: profile.power().iter().map(|p| p * 3.5).collect(),
        };
        assert_relative_eq!(scaled.center_of_mass().unwrap(), center, epsilon = 0.5);
    }

    #[test]
    fn test_center_of_mass_zero_power_rejected() {
        let profile = FrequencyProfile {
            frequencies: vec![0.0, 1.0, 2.0],
            power: vec![0.0, 0.0, 0.0],
        };
        assert!(matches!(
            profile.center_of_mass(),
            Err(AnalysisError::SilentSignal)
        ));
    }

    #[test]
    fn test_zoom_window_symmetric() {
        let a = ZoomWindow::around(1200.0, 2600.0);
        let b = ZoomWindow::around(2600.0, 1200.0);
        assert_eq!(a, b);
        assert_eq!(a.min_hz, 700.0);
        assert_eq!(a.max_hz, 3100.0);
    }

    #[test]
    fn test_zoom_window_clamps_at_zero() {
        let window = ZoomWindow::around(100.0, 300.0);
        assert_eq!(window.min_hz, 0.0);
        assert_eq!(window.max_hz, 800.0);
    }

    #[test]
    fn test_zoom_window_contains() {
        let window = ZoomWindow::around(1000.0, 1000.0);
        assert!(window.contains(1000.0));
        assert!(window.contains(500.0));
        assert!(window.contains(1500.0));
        assert!(!window.contains(1501.0));
    }
}
