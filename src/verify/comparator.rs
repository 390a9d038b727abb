//! Speaker comparator capability
//!
//! A comparator maps two mono 16 kHz sample sequences to a similarity
//! measure. The trait is the seam where a pretrained speaker-embedding
//! model plugs in; [`SpectralComparator`] is the built-in stand-in, a
//! coarse band-energy embedding compared by cosine similarity.

use rustfft::{num_complex::Complex, FftPlanner};

use crate::audio::SAMPLE_RATE;
use crate::error::ComparatorError;

/// Minimum input length a comparator call accepts (~400 ms at 16 kHz)
pub const MIN_COMPARE_SAMPLES: usize = 6_400;

/// Similarity reported by a comparator backend.
///
/// Backends differ in shape: some return a bare scalar, others pair the
/// score with their own match decision. The scheduler only ever consumes
/// the scalar and applies its own threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Similarity {
    /// A plain similarity score
    Score(f32),
    /// A score paired with the backend's own decision (the decision is
    /// informational; the scheduler re-thresholds the score)
    Decided { score: f32, matched: bool },
}

impl Similarity {
    /// Extract the scalar score regardless of shape
    pub fn score(&self) -> f32 {
        match *self {
            Similarity::Score(score) => score,
            Similarity::Decided { score, .. } => score,
        }
    }
}

/// Opaque speaker-similarity capability.
///
/// Inputs are mono 16 kHz float sample sequences. Implementations are
/// invoked serially (the scheduler allows one request in flight) but from a
/// background thread, so they must be `Send + Sync`. Repeated identical
/// inputs must produce a stable score.
pub trait SpeakerComparator: Send + Sync {
    fn compare(&self, reference: &[f32], test: &[f32]) -> Result<Similarity, ComparatorError>;
}

/// Built-in comparator: band-energy embedding plus cosine similarity.
///
/// Splits the one-sided power spectrum of each signal into
/// [`SpectralComparator::NUM_BANDS`] equal bands, l2-normalizes the band
/// energies and takes the dot product. Identical signals score 1.0;
/// signals with disjoint spectral content score near 0. This is a coarse
/// spectral-shape measure standing in for a pretrained embedding model
/// behind the same trait.
#[derive(Debug, Default)]
pub struct SpectralComparator;

impl SpectralComparator {
    pub const NUM_BANDS: usize = 32;

    pub fn new() -> Self {
        Self
    }

    fn embed(&self, samples: &[f32]) -> Result<Vec<f32>, ComparatorError> {
        if samples.len() < MIN_COMPARE_SAMPLES {
            return Err(ComparatorError::InputTooShort {
                min_samples: MIN_COMPARE_SAMPLES,
                got_samples: samples.len(),
            });
        }

        let n = samples.len();
        let mut spectrum: Vec<Complex<f32>> =
            samples.iter().map(|&s| Complex::new(s, 0.0)).collect();
        let mut planner = FftPlanner::new();
        planner.plan_fft_forward(n).process(&mut spectrum);

        // Mean power per band over the one-sided spectrum (0..Nyquist)
        let bins = n / 2 + 1;
        let nyquist = SAMPLE_RATE as f32 / 2.0;
        let band_width = nyquist / Self::NUM_BANDS as f32;
        let bin_width = SAMPLE_RATE as f32 / n as f32;

        let mut bands = vec![0.0f32; Self::NUM_BANDS];
        let mut counts = vec![0u32; Self::NUM_BANDS];
        for (i, c) in spectrum[..bins].iter().enumerate() {
            let band = ((i as f32 * bin_width / band_width) as usize).min(Self::NUM_BANDS - 1);
            bands[band] += c.norm_sqr();
            counts[band] += 1;
        }
        for (band, count) in bands.iter_mut().zip(&counts) {
            if *count > 0 {
                *band /= *count as f32;
            }
        }

        l2_normalize(&mut bands).ok_or_else(|| {
            ComparatorError::Backend("signal has no spectral energy".to_string())
        })?;
        Ok(bands)
    }
}

impl SpeakerComparator for SpectralComparator {
    fn compare(&self, reference: &[f32], test: &[f32]) -> Result<Similarity, ComparatorError> {
        let ref_embedding = self.embed(reference)?;
        let test_embedding = self.embed(test)?;

        let cosine: f32 = ref_embedding
            .iter()
            .zip(&test_embedding)
            .map(|(a, b)| a * b)
            .sum();

        // Band energies are non-negative, so the cosine already lives in
        // [0, 1] up to rounding.
        Ok(Similarity::Score(cosine.clamp(0.0, 1.0)))
    }
}

/// Scale a vector to unit l2 norm in place; `None` if the norm is zero
fn l2_normalize(values: &mut [f32]) -> Option<()> {
    let norm = values.iter().map(|v| (*v as f64) * (*v as f64)).sum::<f64>().sqrt();
    if norm <= 0.0 {
        return None;
    }
    let scale = (1.0 / norm) as f32;
    for v in values.iter_mut() {
        *v *= scale;
    }
    Some(())
}
