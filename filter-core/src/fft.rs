//! # Spectral Analysis Module
//!
//! Magnitude spectra of real sample buffers on top of RustFFT.
//! The transform itself is RustFFT's; this module owns everything around it:
//! dithering, magnitude extraction, the frequency axis, normalisation and
//! window-loss correction.
//!
//! ## Features
//! - Injectable dither so a silent buffer never reaches the transform as-is
//! - Bin-to-frequency mapping that skips the DC bin
//! - Normalisation that never divides by a zero maximum
//! - Windowed spectra corrected for the window's mean gain

use crate::ResponseCurve;
use crate::error::{Result, ensure_len};
use crate::window::{WindowFunction, WindowType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustfft::{FftPlanner, num_complex::Complex};

/// Peak-to-peak amplitude of the dither added to every sample.
pub const DITHER_AMPLITUDE: f64 = 1e-12;

/// Source of the tiny perturbation added to samples before transforming.
pub trait DitherSource {
    /// Next offset to add to a sample.
    fn next_offset(&mut self) -> f64;
}

/// Uniform dither in `±DITHER_AMPLITUDE / 2`.
#[derive(Debug, Clone)]
pub struct RandomDither {
    rng: StdRng,
}

impl RandomDither {
    /// Seeds from the operating system.
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Reproducible dither for tests and offline runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomDither {
    fn default() -> Self {
        Self::new()
    }
}

impl DitherSource for RandomDither {
    fn next_offset(&mut self) -> f64 {
        (self.rng.random::<f64>() - 0.5) * DITHER_AMPLITUDE
    }
}

/// Adds nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDither;

impl DitherSource for NoDither {
    fn next_offset(&mut self) -> f64 {
        0.0
    }
}

/// Forward FFT of a real buffer, returning `|X[k]|` for all `N` bins.
///
/// Every sample is perturbed by `dither` first. A buffer that is still all
/// zeros afterwards is not transformed; its spectrum is all zeros.
pub fn transform(samples: &[f64], dither: &mut dyn DitherSource) -> Vec<f64> {
    let len = samples.len();
    if len == 0 {
        return Vec::new();
    }

    let mut buffer: Vec<Complex<f64>> = samples
        .iter()
        .map(|&sample| Complex {
            re: sample + dither.next_offset(),
            im: 0.0,
        })
        .collect();

    if buffer.iter().all(|c| c.re == 0.0) {
        return vec![0.0; len];
    }

    let mut planner = FftPlanner::new();
    let fft = planner.plan_fft_forward(len);
    fft.process(&mut buffer);

    buffer.iter().map(|c| c.norm()).collect()
}

/// Frequency of each bin returned by [`amplitudes`]: `(i + 1) / len * sample_rate`.
pub fn frequencies(len: usize, sample_rate: f64) -> Vec<f64> {
    (0..len / 2)
        .map(|i| (i + 1) as f64 / len as f64 * sample_rate)
        .collect()
}

/// Un-normalised magnitudes of bins `1..=len/2`.
///
/// # Errors
/// * [`crate::FilterError::InputTooShort`] for fewer than 2 samples
pub fn amplitudes(samples: &[f64], dither: &mut dyn DitherSource) -> Result<Vec<f64>> {
    ensure_len(samples.len(), 2)?;
    let magnitudes = transform(samples, dither);
    Ok(magnitudes[1..=samples.len() / 2].to_vec())
}

/// Spectrum normalised so its largest magnitude is 1.
///
/// # Errors
/// * [`crate::FilterError::InputTooShort`] for fewer than 4 samples
pub fn spectrum(
    samples: &[f64],
    sample_rate: f64,
    dither: &mut dyn DitherSource,
) -> Result<ResponseCurve> {
    spectrum_with_max(samples, sample_rate, dither).map(|(curve, _)| curve)
}

/// Spectrum normalised by its own maximum, together with that maximum.
///
/// The returned divisor can be passed as `reference` to
/// [`spectrum_with_reference`] so later buffers share one scale. It is 1 for
/// a spectrum with no energy.
///
/// # Arguments
/// * `samples` - Time-domain buffer, at least 4 samples
/// * `sample_rate` - Sample rate in Hz, used for the frequency axis
/// * `dither` - Perturbation added to every sample before the transform
///
/// # Returns
/// * `(ResponseCurve, f64)` - Bins `1..len/2` and the divisor applied to them
///
/// # Errors
/// * [`crate::FilterError::InputTooShort`] for fewer than 4 samples
pub fn spectrum_with_max(
    samples: &[f64],
    sample_rate: f64,
    dither: &mut dyn DitherSource,
) -> Result<(ResponseCurve, f64)> {
    let mut curve = raw_spectrum(samples, sample_rate, dither)?;
    let max = curve.max_magnitude();
    let divisor = normalize(&mut curve.magnitudes, max);
    Ok((curve, divisor))
}

/// Spectrum divided by `reference`; a `reference` of 0 means "use the
/// measured maximum".
///
/// Covers bins `1..len/2`, skipping DC and the Nyquist bin.
///
/// # Errors
/// * [`crate::FilterError::InputTooShort`] for fewer than 4 samples
pub fn spectrum_with_reference(
    samples: &[f64],
    sample_rate: f64,
    reference: f64,
    dither: &mut dyn DitherSource,
) -> Result<ResponseCurve> {
    if reference == 0.0 {
        return spectrum(samples, sample_rate, dither);
    }
    let mut curve = raw_spectrum(samples, sample_rate, dither)?;
    normalize(&mut curve.magnitudes, reference);
    Ok(curve)
}

/// Un-normalised magnitudes of bins `1..len/2` on their frequency axis.
fn raw_spectrum(
    samples: &[f64],
    sample_rate: f64,
    dither: &mut dyn DitherSource,
) -> Result<ResponseCurve> {
    ensure_len(samples.len(), 4)?;
    let len = samples.len();
    let magnitudes = transform(samples, dither);

    let mut curve = ResponseCurve::with_capacity(len / 2 - 1);
    for i in 0..len / 2 - 1 {
        curve.push((i + 1) as f64 / len as f64 * sample_rate, magnitudes[i + 1]);
    }
    Ok(curve)
}

/// Spectrum of `samples` after applying `window`, corrected for the
/// window's mean gain so a full-scale sine reads close to its amplitude.
///
/// # Errors
/// * [`crate::FilterError::InputTooShort`] for fewer than 4 samples
pub fn windowed_spectrum(
    samples: &[f64],
    sample_rate: f64,
    window: WindowType,
    dither: &mut dyn DitherSource,
) -> Result<ResponseCurve> {
    ensure_len(samples.len(), 4)?;
    let len = samples.len();
    let window = WindowFunction::new(window);

    let gain = mean(&window.coefficients(len)) / 2.0 * len as f64;
    let windowed = window.apply(samples, len)?;

    let mut curve = spectrum_with_reference(&windowed, sample_rate, 1.0, dither)?;
    normalize(&mut curve.magnitudes, gain);
    Ok(curve)
}

/// Divides every value by `divisor`, treating a zero or non-finite divisor
/// as 1. Returns the divisor actually applied.
pub fn normalize(values: &mut [f64], divisor: f64) -> f64 {
    let divisor = if divisor == 0.0 || !divisor.is_finite() {
        log::debug!("normalisation divisor {divisor} replaced by 1");
        1.0
    } else {
        divisor
    };
    for value in values {
        *value /= divisor;
    }
    divisor
}

/// Arithmetic mean, or 1 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 1.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
